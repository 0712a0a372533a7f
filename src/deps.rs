//! External tool checks.
//!
//! Attestation verification is delegated to `cosign`. This module provides
//! the command-execution seam shared with [`crate::attest`] and the
//! environment check that runs before any pipeline stage.

use crate::error::{Result, VerifyError};
use log::debug;
use std::process::{Command, Output};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use caddy_verify::deps::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("cosign", &["version"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), caddy_verify::error::VerifyError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        debug!("running {cmd} {}", args.join(" "));
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(VerifyError::from)
    }
}

/// Availability of the external tools the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    /// The verification binary that was probed.
    pub cosign_binary: String,
    /// Whether it responded to `version`.
    pub cosign: bool,
}

impl ToolStatus {
    /// Returns `true` if every required tool is present.
    ///
    /// # Examples
    ///
    /// ```
    /// use caddy_verify::deps::ToolStatus;
    ///
    /// let status = ToolStatus { cosign_binary: "cosign".to_owned(), cosign: true };
    /// assert!(status.all_installed());
    /// ```
    #[must_use]
    pub const fn all_installed(&self) -> bool {
        self.cosign
    }

    /// Convert a missing tool into a precondition error.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::MissingTool`] naming the first missing tool.
    pub fn require_all(&self) -> Result<()> {
        if self.cosign {
            Ok(())
        } else {
            Err(VerifyError::MissingTool {
                tool: self.cosign_binary.clone(),
                hint: "install cosign from https://docs.sigstore.dev/cosign/system_config/installation/",
            })
        }
    }
}

/// Probe the host for the verification tool.
///
/// HTTP retrieval, JSON decoding, and base64 decoding are built into this
/// binary and need no probe.
pub fn check_required_tools(executor: &dyn CommandExecutor, cosign: &str) -> ToolStatus {
    ToolStatus {
        cosign_binary: cosign.to_owned(),
        cosign: command_succeeds(executor, cosign, &["version"]),
    }
}

/// Returns true if the given command executes successfully.
fn command_succeeds(executor: &dyn CommandExecutor, cmd: &str, args: &[&str]) -> bool {
    executor.run(cmd, args).is_ok_and(|o| o.status.success())
}
