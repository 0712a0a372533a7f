//! Caddy release verifier CLI entrypoint.
//!
//! Verifies the SLSA provenance and SBOM attestations of one Caddy release
//! binary and prints the build metadata recorded in its provenance.

use caddy_verify::attest::CosignVerifier;
use caddy_verify::cli::Cli;
use caddy_verify::config::{Config, SystemBaseDirs};
use caddy_verify::deps::SystemCommandExecutor;
use caddy_verify::error::Result;
use caddy_verify::fetch::HttpFetcher;
use caddy_verify::output::write_stderr_line;
use caddy_verify::pipeline::{self, Collaborators, Streams};
use clap::Parser;
use log::{LevelFilter, debug};
use std::io::Write;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => std::process::exit(exit_code_for_parse_error(&err)),
    };
    init_logging(cli.log_level());

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let config = Config::load(cli.config.as_deref(), &SystemBaseDirs)?;
    debug!("using release host {}/{}", config.host, config.project);

    let executor = SystemCommandExecutor;
    let fetcher = HttpFetcher::new(config.timeout(), config.max_redirects);
    let verifier = CosignVerifier::new(&executor, config.cosign_settings());

    pipeline::run(
        cli,
        &config,
        Collaborators {
            executor: &executor,
            fetcher: &fetcher,
            verifier: &verifier,
        },
        Streams { stdout, stderr },
    )
}

/// Print a clap error or help text; help and version requests succeed.
fn exit_code_for_parse_error(err: &clap::Error) -> i32 {
    if err.print().is_err() {
        // Best-effort; the exit code still reports the outcome.
    }
    i32::from(err.use_stderr())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            err.exit_code()
        }
    }
}
