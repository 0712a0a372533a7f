//! Verification pipeline orchestration.
//!
//! Drives one release through environment validation, input validation,
//! resolution, fetching, both attestation checks, decoding, and display.
//! Every collaborator with side effects is injected through
//! [`Collaborators`]. Once anything may have been staged, cleanup runs on
//! every exit path before the result is returned.

use crate::attest::{AttestationKind, AttestationVerifier, verify_attestations};
use crate::cli::Cli;
use crate::config::Config;
use crate::deps::{CommandExecutor, check_required_tools};
use crate::digest::compute_sha256;
use crate::error::{Result, VerifyError};
use crate::fetch::{ResourceFetcher, fetch_resources};
use crate::identity::{ReleaseIdentity, ResolvedRelease, resolve};
use crate::output::{DryRunPlan, MetadataReport, summary_line, write_stderr_line};
use crate::predicate::decode_outcome;
use crate::session::Session;
use camino::Utf8PathBuf;
use log::{debug, info, warn};
use std::fmt;
use std::io::Write;

/// Pipeline states, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Probe for the verification tool.
    ValidateEnvironment,
    /// Validate the version, platform, and architecture.
    ValidateInput,
    /// Compute the artifact name and resource URLs.
    Resolve,
    /// Download the binary and both bundles.
    Fetch,
    /// Verify the SLSA provenance attestation.
    VerifyProvenance,
    /// Verify the SBOM attestation.
    VerifySbom,
    /// Decode the provenance predicate.
    Decode,
    /// Write the build metadata.
    Display,
    /// Remove every staged file.
    Cleanup,
}

impl Stage {
    /// The verification stage for an attestation kind.
    #[must_use]
    pub const fn verifying(kind: AttestationKind) -> Self {
        match kind {
            AttestationKind::Provenance => Self::VerifyProvenance,
            AttestationKind::Sbom => Self::VerifySbom,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ValidateEnvironment => "validate-environment",
            Self::ValidateInput => "validate-input",
            Self::Resolve => "resolve",
            Self::Fetch => "fetch",
            Self::VerifyProvenance => "verify-provenance",
            Self::VerifySbom => "verify-sbom",
            Self::Decode => "decode",
            Self::Display => "display",
            Self::Cleanup => "cleanup",
        })
    }
}

fn enter(stage: Stage) {
    debug!("entering stage {stage}");
}

/// External collaborators used by a run.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Runs the environment probe.
    pub executor: &'a dyn CommandExecutor,
    /// Downloads release resources.
    pub fetcher: &'a dyn ResourceFetcher,
    /// Checks attestation bundles.
    pub verifier: &'a dyn AttestationVerifier,
}

/// Output handles for a run.
pub struct Streams<'a> {
    /// Receives results.
    pub stdout: &'a mut dyn Write,
    /// Receives progress and diagnostics.
    pub stderr: &'a mut dyn Write,
}

struct RunContext<'a> {
    cli: &'a Cli,
    config: &'a Config,
    collaborators: Collaborators<'a>,
}

impl RunContext<'_> {
    fn progress(&self, stderr: &mut dyn Write, message: impl fmt::Display) {
        if !self.cli.quiet {
            write_stderr_line(stderr, message);
        }
    }
}

/// Directory downloads are staged in.
#[must_use]
pub fn work_dir(cli: &Cli) -> Utf8PathBuf {
    cli.work_dir.clone().unwrap_or_else(|| Utf8PathBuf::from("."))
}

/// Verify the release selected by `cli`.
///
/// With `--dry-run` only input validation and resolution happen and the plan
/// is written to stdout.
///
/// # Errors
///
/// Returns the first error from any stage. Staged files are removed before
/// the error is returned.
pub fn run(
    cli: &Cli,
    config: &Config,
    collaborators: Collaborators<'_>,
    streams: Streams<'_>,
) -> Result<()> {
    let Streams { stdout, stderr } = streams;
    let context = RunContext {
        cli,
        config,
        collaborators,
    };

    if cli.dry_run {
        return run_dry(&context, stdout);
    }

    enter(Stage::ValidateEnvironment);
    check_required_tools(collaborators.executor, &config.cosign).require_all()?;

    let resolved = validate_and_resolve(&context)?;
    let dir = work_dir(cli);
    context.progress(
        stderr,
        format!("Verifying {} ({})", resolved.name, resolved.identity),
    );

    let mut session = Session::new(&dir, resolved.name.clone());
    let result = verify_in_session(&context, &resolved, &mut session, stdout, stderr);

    enter(Stage::Cleanup);
    let report = session.cleanup();
    for (path, reason) in &report.failed {
        write_stderr_line(stderr, format!("warning: could not remove {path}: {reason}"));
    }
    debug!("cleanup removed {} file(s)", report.removed.len());

    result
}

fn run_dry(context: &RunContext<'_>, stdout: &mut dyn Write) -> Result<()> {
    let resolved = validate_and_resolve(context)?;
    let dir = work_dir(context.cli);
    DryRunPlan::new(&resolved, &dir)
        .write(stdout, context.cli.json)
        .map_err(|source| VerifyError::WriteFailed { source })
}

fn validate_and_resolve(context: &RunContext<'_>) -> Result<ResolvedRelease> {
    enter(Stage::ValidateInput);
    let cli = context.cli;
    let identity = ReleaseIdentity::parse(&cli.version, &cli.platform, &cli.arch)?;

    enter(Stage::Resolve);
    let resolved = resolve(
        &context.config.release_host(),
        &context.config.artifact_prefix,
        &identity,
    );
    debug!("resolved {identity} to {}", resolved.name);
    Ok(resolved)
}

fn verify_in_session(
    context: &RunContext<'_>,
    resolved: &ResolvedRelease,
    session: &mut Session,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    enter(Stage::Fetch);
    let staged = fetch_resources(&resolved.resources, context.collaborators.fetcher, session)?;

    let report = verify_attestations(context.collaborators.verifier, &staged, |kind| {
        enter(Stage::verifying(kind));
    });
    let failed = report.failed_kinds();
    for kind in AttestationKind::ORDERED {
        let line = summary_line(kind, report.outcome(kind));
        if failed.is_empty() {
            context.progress(stderr, line);
        } else {
            write_stderr_line(stderr, line);
        }
    }
    if !failed.is_empty() {
        return Err(VerifyError::Verification { failed });
    }

    enter(Stage::Decode);
    let predicate = decode_outcome(&report.provenance)?;
    let digest = match compute_sha256(&staged.binary) {
        Ok(digest) => {
            info!("{} sha256 {digest}", resolved.name);
            Some(digest)
        }
        Err(e) => {
            warn!("could not digest {}: {e}", staged.binary);
            None
        }
    };

    enter(Stage::Display);
    let metadata = MetadataReport {
        predicate: &predicate,
        artifact: resolved.name.as_str(),
        artifact_sha256: digest.as_ref(),
    };
    let written = if context.cli.json {
        metadata.write_json(stdout)
    } else {
        metadata.write_text(stdout)
    };
    written.map_err(|source| VerifyError::WriteFailed { source })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
