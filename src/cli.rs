//! CLI argument definitions for the release verifier.
//!
//! Platform and architecture are accepted as free text here and validated by
//! the pipeline, so that an unsupported value is reported with the list of
//! accepted values rather than as a usage error.

use crate::identity::{Architecture, Platform};
use camino::Utf8PathBuf;
use clap::Parser;
use log::LevelFilter;

/// Verify the supply-chain attestations of a Caddy release binary.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "caddy-verify")]
#[command(version, about)]
#[command(long_about = concat!(
    "Verify the supply-chain attestations of a Caddy release binary.\n\n",
    "Downloads the release binary together with its SLSA provenance and SBOM ",
    "attestation bundles, verifies both with `cosign verify-blob-attestation`, ",
    "and prints the build metadata recorded in the provenance. Downloaded files ",
    "are removed before the command exits, whatever the outcome.",
))]
#[command(after_help = concat!(
    "PLATFORMS: linux, darwin, windows\n",
    "ARCHITECTURES: amd64, arm64, arm\n\n",
    "EXAMPLES:\n",
    "  Verify the Linux amd64 build of v2.7.6:\n",
    "    $ caddy-verify 2.7.6\n\n",
    "  Verify the macOS arm64 build:\n",
    "    $ caddy-verify 2.7.6 darwin arm64\n\n",
    "  Show the URLs that would be fetched:\n",
    "    $ caddy-verify --dry-run 2.7.6 windows amd64\n\n",
    "  Emit the build metadata as JSON:\n",
    "    $ caddy-verify --json 2.7.6",
))]
pub struct Cli {
    /// Release version, with or without a leading `v`.
    #[arg(id = "release_version", value_name = "VERSION")]
    pub version: String,

    /// Target platform.
    #[arg(value_name = "PLATFORM", default_value = Platform::default().as_str())]
    pub platform: String,

    /// Target architecture.
    #[arg(value_name = "ARCH", default_value = Architecture::default().as_str())]
    pub arch: String,

    /// Configuration file [default: platform config dir].
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Directory to stage downloads in [default: current directory].
    #[arg(short, long, value_name = "DIR")]
    pub work_dir: Option<Utf8PathBuf>,

    /// Resolve and print the release URLs without downloading anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the build metadata as a JSON object.
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Log level selected by `-v`; `RUST_LOG` overrides it.
    ///
    /// # Examples
    ///
    /// ```
    /// use caddy_verify::cli::Cli;
    /// use clap::Parser;
    /// use log::LevelFilter;
    ///
    /// let cli = Cli::parse_from(["caddy-verify", "-vv", "2.7.6"]);
    /// assert_eq!(cli.log_level(), LevelFilter::Debug);
    /// ```
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
