//! Tests for CLI parsing and default behaviours.

use super::*;
use clap::CommandFactory;
use clap::error::ErrorKind;
use rstest::rstest;

#[test]
fn cli_parses_defaults() {
    let cli = Cli::parse_from(["caddy-verify", "2.7.6"]);
    assert_eq!(cli.version, "2.7.6");
    assert_eq!(cli.platform, "linux");
    assert_eq!(cli.arch, "amd64");
    assert!(cli.config.is_none());
    assert!(cli.work_dir.is_none());
    assert!(!cli.dry_run);
    assert!(!cli.json);
    assert_eq!(cli.verbosity, 0);
    assert!(!cli.quiet);
}

#[test]
fn cli_parses_platform_and_arch() {
    let cli = Cli::parse_from(["caddy-verify", "v2.7.6", "darwin", "arm64"]);
    assert_eq!(cli.version, "v2.7.6");
    assert_eq!(cli.platform, "darwin");
    assert_eq!(cli.arch, "arm64");
}

#[test]
fn command_definition_passes_clap_assertions() {
    Cli::command().debug_assert();
}

#[test]
fn positional_version_coexists_with_version_flag() {
    let cli = Cli::try_parse_from(["caddy-verify", "2.7.6", "darwin", "arm64"])
        .expect("positional arguments parse");
    assert_eq!(cli.version, "2.7.6");

    let err = Cli::try_parse_from(["caddy-verify", "--version"]).expect_err("version exits early");
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
}

#[test]
fn cli_accepts_unknown_platform_for_later_validation() {
    let cli = Cli::parse_from(["caddy-verify", "2.7.6", "solaris"]);
    assert_eq!(cli.platform, "solaris");
}

#[test]
fn cli_parses_paths() {
    let cli = Cli::parse_from([
        "caddy-verify",
        "--config",
        "/etc/caddy-verify.toml",
        "-w",
        "/tmp/verify",
        "2.7.6",
    ]);
    assert_eq!(cli.config, Some(Utf8PathBuf::from("/etc/caddy-verify.toml")));
    assert_eq!(cli.work_dir, Some(Utf8PathBuf::from("/tmp/verify")));
}

#[test]
fn missing_version_is_a_usage_error() {
    let err = Cli::try_parse_from(["caddy-verify"]).expect_err("version is required");
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    assert!(err.use_stderr());
}

#[test]
fn help_is_not_an_error_stream() {
    let err = Cli::try_parse_from(["caddy-verify", "--help"]).expect_err("help exits early");
    assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    assert!(!err.use_stderr());
}

#[test]
fn verbose_conflicts_with_quiet() {
    let result = Cli::try_parse_from(["caddy-verify", "-v", "-q", "2.7.6"]);
    assert!(result.is_err());
}

#[rstest]
#[case::quiet_default(&["caddy-verify", "2.7.6"], LevelFilter::Warn)]
#[case::info(&["caddy-verify", "-v", "2.7.6"], LevelFilter::Info)]
#[case::debug(&["caddy-verify", "-vv", "2.7.6"], LevelFilter::Debug)]
#[case::trace(&["caddy-verify", "-vvvv", "2.7.6"], LevelFilter::Trace)]
fn verbosity_maps_to_log_level(#[case] args: &[&str], #[case] expected: LevelFilter) {
    let cli = Cli::parse_from(args.iter().copied());
    assert_eq!(cli.log_level(), expected);
}
