//! Caddy release verifier library.
//!
//! This crate verifies the supply-chain attestations published with Caddy
//! release binaries. It resolves a release to its artifact name and download
//! URLs, stages the binary alongside its SLSA provenance and SBOM bundles,
//! verifies both attestations with cosign, and decodes the build metadata
//! recorded in the provenance. It is used by the `caddy-verify` CLI binary.
//!
//! # Modules
//!
//! - [`attest`] - Attestation verification through cosign
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - TOML configuration and lookup
//! - [`deps`] - External tool checks and command execution
//! - [`digest`] - SHA-256 of the staged binary
//! - [`error`] - Error taxonomy and exit codes
//! - [`fetch`] - Release resource downloads
//! - [`identity`] - Release identity, artifact naming, and resource URLs
//! - [`output`] - Operator-facing formatting
//! - [`pipeline`] - Verification pipeline orchestration
//! - [`predicate`] - Provenance envelope decoding
//! - [`session`] - Staged-file ownership and cleanup

pub mod attest;
pub mod cli;
pub mod config;
pub mod deps;
pub mod digest;
pub mod error;
pub mod fetch;
pub mod identity;
pub mod output;
pub mod pipeline;
pub mod predicate;
pub mod session;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
