//! Shared test utilities for the verifier crate.
//!
//! Exported under the `test-support` feature so behaviour tests can drive the
//! pipeline without cosign or network access.

use crate::attest::{AttestationKind, AttestationVerifier, VerificationOutcome};
use crate::deps::CommandExecutor;
use crate::error::{Result, VerifyError};
use crate::fetch::{FetchError, ResourceFetcher};
use crate::identity::{ResourceKind, ResourceSet};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.unsigned_abs())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    output_with_stdout(b"", "")
}

/// Creates a successful command `Output` with the given streams.
#[must_use]
pub fn output_with_stdout(stdout: &[u8], stderr: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "cosign").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<&'static str>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Replays predefined results for an ordered list of expected invocations.
/// An unexpected or mismatched invocation yields
/// [`VerifyError::StubMismatch`].
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let call = self
            .expected
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| VerifyError::StubMismatch {
                message: format!("unexpected invocation: {cmd} {}", args.join(" ")),
            })?;

        if call.cmd != cmd || call.args.as_slice() != args {
            return Err(VerifyError::StubMismatch {
                message: format!(
                    "expected `{} {}`, got `{cmd} {}`",
                    call.cmd,
                    call.args.join(" "),
                    args.join(" ")
                ),
            });
        }

        call.result
    }
}

/// A fetcher serving canned bodies keyed by URL.
///
/// Any URL without a body answers [`FetchError::NotFound`]. Every request is
/// recorded, including failed ones.
#[derive(Debug, Default)]
pub struct StubFetcher {
    bodies: HashMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl StubFetcher {
    /// Creates a fetcher that serves nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `url`.
    #[must_use]
    pub fn serving(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.into(), body.into());
        self
    }

    /// Serve a plausible binary and bundles for every resource of a release.
    #[must_use]
    pub fn serving_release(resources: &ResourceSet) -> Self {
        let envelope = envelope_json(&sample_predicate());
        Self::new()
            .serving(resources.url(ResourceKind::Binary), SAMPLE_BINARY)
            .serving(resources.url(ResourceKind::Provenance), envelope.clone())
            .serving(resources.url(ResourceKind::Sbom), envelope)
    }

    /// Stop serving `url`.
    #[must_use]
    pub fn without(mut self, url: &str) -> Self {
        self.bodies.remove(url);
        self
    }

    /// Return every URL requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ResourceFetcher for StubFetcher {
    fn fetch(&self, url: &str, dest: &Utf8Path) -> std::result::Result<(), FetchError> {
        self.requests.borrow_mut().push(url.to_owned());
        let body = self.bodies.get(url).ok_or_else(|| FetchError::NotFound {
            url: url.to_owned(),
        })?;
        std::fs::write(dest, body)?;
        Ok(())
    }
}

/// One recorded verifier invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyCall {
    /// The attestation kind requested.
    pub kind: AttestationKind,
    /// The artifact path passed in.
    pub artifact: Utf8PathBuf,
    /// The bundle path passed in.
    pub bundle: Utf8PathBuf,
    /// Whether both files existed when verification was requested.
    pub files_present: bool,
}

/// A verifier returning fixed outcomes per attestation kind.
///
/// A verified provenance outcome without a payload is answered with the
/// bundle contents, mirroring how cosign's bundle fallback behaves.
#[derive(Debug)]
pub struct StubVerifier {
    outcomes: HashMap<AttestationKind, VerificationOutcome>,
    calls: RefCell<Vec<VerifyCall>>,
}

impl StubVerifier {
    /// A verifier that accepts both attestations.
    #[must_use]
    pub fn accepting() -> Self {
        Self::new(
            VerificationOutcome::verified("Verified OK", None),
            VerificationOutcome::verified("Verified OK", None),
        )
    }

    /// A verifier returning the given outcomes.
    #[must_use]
    pub fn new(provenance: VerificationOutcome, sbom: VerificationOutcome) -> Self {
        Self {
            outcomes: HashMap::from([
                (AttestationKind::Provenance, provenance),
                (AttestationKind::Sbom, sbom),
            ]),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Return every invocation so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<VerifyCall> {
        self.calls.borrow().clone()
    }
}

impl AttestationVerifier for StubVerifier {
    fn verify(
        &self,
        kind: AttestationKind,
        artifact: &Utf8Path,
        bundle: &Utf8Path,
    ) -> VerificationOutcome {
        self.calls.borrow_mut().push(VerifyCall {
            kind,
            artifact: artifact.to_owned(),
            bundle: bundle.to_owned(),
            files_present: artifact.is_file() && bundle.is_file(),
        });

        let mut outcome = self
            .outcomes
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| VerificationOutcome::failed("no stubbed outcome"));
        if outcome.is_verified() && kind.wants_payload() && outcome.decoded_payload.is_none() {
            outcome.decoded_payload = std::fs::read(bundle).ok();
        }
        outcome
    }
}

/// Bytes served as the release binary by [`StubFetcher::serving_release`].
pub const SAMPLE_BINARY: &[u8] = b"\x7fELF caddy release binary";

/// A complete SLSA v0.2 provenance predicate for a Caddy release.
#[must_use]
pub fn sample_predicate() -> Value {
    json!({
        "builder": {
            "id": "https://github.com/slsa-framework/slsa-github-generator/.github/workflows/generator_generic_slsa3.yml@refs/tags/v1.9.0"
        },
        "buildType": "https://github.com/slsa-framework/slsa-github-generator/generic@v1",
        "invocation": {
            "configSource": {
                "uri": "git+https://github.com/caddyserver/caddy@refs/tags/v2.7.6",
                "digest": { "sha1": "6d9a83376b5e19b3c0368541ee46044ab284038b" },
                "entryPoint": ".github/workflows/release.yml"
            }
        },
        "metadata": {
            "buildInvocationId": "https://github.com/caddyserver/caddy/actions/runs/7052431337/attempts/1",
            "buildStartedOn": "2023-12-01T12:00:00Z",
            "completeness": { "parameters": true, "environment": false, "materials": false },
            "reproducible": false
        }
    })
}

/// Wrap `predicate` in an in-toto statement inside a DSSE envelope.
#[must_use]
pub fn envelope_json(predicate: &Value) -> String {
    let statement = json!({
        "_type": "https://in-toto.io/Statement/v0.1",
        "predicateType": "https://slsa.dev/provenance/v0.2",
        "subject": [{
            "name": "caddy_2.7.6_linux_amd64",
            "digest": { "sha256": "0000000000000000000000000000000000000000000000000000000000000000" }
        }],
        "predicate": predicate
    });
    json!({
        "payloadType": "application/vnd.in-toto+json",
        "payload": STANDARD.encode(statement.to_string()),
        "signatures": [{ "keyid": "", "sig": "MEUCIQC" }]
    })
    .to_string()
}

/// Returns `true` if `dir` holds no entries (or cannot be read).
#[must_use]
pub fn dir_is_empty(dir: &Utf8Path) -> bool {
    dir.read_dir_utf8()
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}
