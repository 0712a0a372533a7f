//! Error types for the release verifier.
//!
//! Every failure is terminal for the current run. Variants group into the
//! categories reported to the operator by [`VerifyError::category`]; all of
//! them map to exit code 1.

use crate::attest::AttestationKind;
use crate::config::ConfigError;
use crate::fetch::FetchError;
use crate::identity::IdentityError;
use crate::predicate::DecodeError;
use std::fmt;
use thiserror::Error;

/// Broad classification of a [`VerifyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing tool, bad configuration, or invalid input. Nothing was staged.
    Precondition,
    /// A release resource could not be downloaded.
    Fetch,
    /// An attestation failed verification.
    Verification,
    /// The verified provenance payload could not be decoded.
    Decode,
    /// Results could not be written or a local I/O operation failed.
    Output,
}

impl ErrorCategory {
    /// Process exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        1
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Precondition => "precondition",
            Self::Fetch => "fetch",
            Self::Verification => "verification",
            Self::Decode => "decode",
            Self::Output => "output",
        })
    }
}

/// Errors that can occur while verifying a release.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// A required external tool is not available.
    #[error("required tool {tool} is not available; {hint}")]
    MissingTool {
        /// The binary that failed to respond.
        tool: String,
        /// How to obtain it.
        hint: &'static str,
    },

    /// The release identity supplied by the operator is invalid.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A release resource could not be downloaded.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// One or more attestations failed verification.
    #[error("attestation verification failed for: {}", join_kinds(.failed))]
    Verification {
        /// The attestation kinds that did not verify.
        failed: Vec<AttestationKind>,
    },

    /// The provenance payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write output.
    #[error("failed to write output: {source}")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl VerifyError {
    /// Classify this error for reporting.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingTool { .. } | Self::Identity(_) | Self::Config(_) => {
                ErrorCategory::Precondition
            }
            Self::Fetch(_) => ErrorCategory::Fetch,
            Self::Verification { .. } => ErrorCategory::Verification,
            Self::Decode(_) => ErrorCategory::Decode,
            Self::Io(_) | Self::WriteFailed { .. } => ErrorCategory::Output,
            #[cfg(any(test, feature = "test-support"))]
            Self::StubMismatch { .. } => ErrorCategory::Output,
        }
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }
}

fn join_kinds(kinds: &[AttestationKind]) -> String {
    kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using [`VerifyError`].
pub type Result<T> = std::result::Result<T, VerifyError>;
