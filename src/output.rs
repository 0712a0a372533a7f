//! Output formatting for the verifier CLI.
//!
//! Results go to stdout: the build metadata block (or one JSON object with
//! `--json`) and the dry-run plan. Progress lines, verification summaries,
//! and errors go to stderr.

use crate::attest::{AttestationKind, VerificationOutcome};
use crate::digest::Sha256Digest;
use crate::identity::{ResolvedRelease, ResourceKind, ResourceSet};
use crate::predicate::BuildPredicate;
use camino::Utf8Path;
use serde::Serialize;
use std::io::{self, Write};

/// Write a line to stderr, ignoring failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format the one-line outcome of an attestation check.
///
/// # Examples
///
/// ```
/// use caddy_verify::attest::{AttestationKind, VerificationOutcome};
/// use caddy_verify::output::summary_line;
///
/// let ok = VerificationOutcome::verified("Verified OK", None);
/// assert_eq!(summary_line(AttestationKind::Sbom, &ok), "sbom: verified");
///
/// let bad = VerificationOutcome::failed("signature mismatch");
/// assert_eq!(
///     summary_line(AttestationKind::Provenance, &bad),
///     "provenance: FAILED (signature mismatch)"
/// );
/// ```
#[must_use]
pub fn summary_line(kind: AttestationKind, outcome: &VerificationOutcome) -> String {
    let label = match kind {
        AttestationKind::Provenance => "provenance",
        AttestationKind::Sbom => "sbom",
    };
    if outcome.is_verified() {
        return format!("{label}: verified");
    }
    match outcome.detail.lines().rev().find(|line| !line.trim().is_empty()) {
        Some(reason) => format!("{label}: FAILED ({})", reason.trim()),
        None => format!("{label}: FAILED"),
    }
}

/// The verified build metadata of one artifact.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataReport<'a> {
    /// The decoded predicate fields.
    #[serde(flatten)]
    pub predicate: &'a BuildPredicate,
    /// The verified artifact name.
    pub artifact: &'a str,
    /// SHA-256 of the staged binary, when it could be computed.
    pub artifact_sha256: Option<&'a Sha256Digest>,
}

impl MetadataReport<'_> {
    /// Write the labelled metadata block, build type first.
    ///
    /// # Errors
    ///
    /// Returns any error raised by `out`.
    pub fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        for (label, value) in self.predicate.labelled() {
            writeln!(out, "{label}: {value}")?;
        }
        writeln!(out, "Artifact: {}", self.artifact)?;
        if let Some(digest) = self.artifact_sha256 {
            writeln!(out, "SHA-256: {digest}")?;
        }
        Ok(())
    }

    /// Write the metadata as one JSON object followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns any serialisation or write error.
    pub fn write_json(&self, out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *out, self)?;
        writeln!(out)
    }
}

/// What a verification run would fetch, without fetching it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunPlan<'a> {
    /// The resolved artifact name.
    pub artifact: &'a str,
    /// The release version.
    pub version: &'a str,
    /// The three resource URLs.
    pub resources: &'a ResourceSet,
    /// Where files would be staged.
    pub work_dir: &'a Utf8Path,
}

impl<'a> DryRunPlan<'a> {
    /// Describe the run for `resolved`, staging under `work_dir`.
    #[must_use]
    pub fn new(resolved: &'a ResolvedRelease, work_dir: &'a Utf8Path) -> Self {
        Self {
            artifact: resolved.name.as_str(),
            version: resolved.identity.version(),
            resources: &resolved.resources,
            work_dir,
        }
    }

    /// Format the plan for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - nothing will be downloaded or verified".to_owned(),
            String::new(),
            format!("Artifact: {}", self.artifact),
            format!("Version: {}", self.version),
            format!("Work directory: {}", self.work_dir),
            String::new(),
        ];
        for kind in ResourceKind::ORDERED {
            lines.push(format!("  {kind}: {}", self.resources.url(kind)));
        }
        lines.join("\n")
    }

    /// Write the plan as text or JSON.
    ///
    /// # Errors
    ///
    /// Returns any serialisation or write error.
    pub fn write(&self, out: &mut dyn Write, json: bool) -> io::Result<()> {
        if json {
            serde_json::to_writer(&mut *out, self)?;
            writeln!(out)
        } else {
            writeln!(out, "{}", self.display_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{ReleaseHost, ReleaseIdentity, resolve};
    use crate::predicate::MISSING_FIELD;
    use rstest::{fixture, rstest};
    use serde_json::Value;

    #[fixture]
    fn predicate() -> BuildPredicate {
        BuildPredicate {
            build_type: Some("https://github.com/slsa-framework/slsa-github-generator/generic@v1".to_owned()),
            builder_id: Some("https://github.com/slsa-framework/slsa-github-generator".to_owned()),
            build_invocation_id: Some("7052431337".to_owned()),
            build_started_on: None,
            config_source_uri: Some("git+https://github.com/caddyserver/caddy@refs/tags/v2.7.6".to_owned()),
            config_source_sha1: Some("6d9a83376b5e19b3c0368541ee46044ab284038b".to_owned()),
        }
    }

    #[rstest]
    fn text_block_starts_with_build_type(predicate: BuildPredicate) {
        let digest = Sha256Digest::of_bytes(b"caddy");
        let report = MetadataReport {
            predicate: &predicate,
            artifact: "caddy_2.7.6_linux_amd64",
            artifact_sha256: Some(&digest),
        };
        let mut out = Vec::new();
        report.write_text(&mut out).expect("write");
        let text = String::from_utf8(out).expect("UTF-8");

        let first = text.lines().next().expect("at least one line");
        assert!(first.starts_with("Build Type: https://github.com/slsa-framework"));
        assert!(text.contains(&format!("Build Time: {MISSING_FIELD}")));
        assert!(text.contains("Commit: 6d9a83376b5e19b3c0368541ee46044ab284038b"));
        assert!(text.contains(&format!("SHA-256: {digest}")));
    }

    #[rstest]
    fn json_report_uses_nulls_for_missing_fields(predicate: BuildPredicate) {
        let report = MetadataReport {
            predicate: &predicate,
            artifact: "caddy_2.7.6_linux_amd64",
            artifact_sha256: None,
        };
        let mut out = Vec::new();
        report.write_json(&mut out).expect("write");

        let value: Value = serde_json::from_slice(&out).expect("valid JSON");
        assert_eq!(value["buildStartedOn"], Value::Null);
        assert_eq!(value["configSourceSha1"], "6d9a83376b5e19b3c0368541ee46044ab284038b");
        assert_eq!(value["artifact"], "caddy_2.7.6_linux_amd64");
        assert_eq!(value["artifactSha256"], Value::Null);
        assert!(out.ends_with(b"\n"));
    }

    #[rstest]
    #[case::verified(VerificationOutcome::verified("Verified OK", None), "sbom: verified")]
    #[case::failed_with_detail(
        VerificationOutcome::failed("Error: verifying blob\nmain.go:74: error during command execution: none of the attestations matched"),
        "sbom: FAILED (main.go:74: error during command execution: none of the attestations matched)"
    )]
    #[case::failed_without_detail(VerificationOutcome::failed(""), "sbom: FAILED")]
    fn summary_lines(#[case] outcome: VerificationOutcome, #[case] expected: &str) {
        assert_eq!(summary_line(AttestationKind::Sbom, &outcome), expected);
    }

    #[test]
    fn dry_run_plan_lists_every_url() {
        let identity = ReleaseIdentity::parse("2.7.6", "darwin", "arm64").expect("valid");
        let resolved = resolve(&ReleaseHost::default(), "caddy", &identity);
        let plan = DryRunPlan::new(&resolved, Utf8Path::new("/tmp/work"));

        let text = plan.display_text();

        assert!(text.contains("Artifact: caddy_2.7.6_mac_arm64"));
        assert!(text.contains(&resolved.resources.binary_url));
        assert!(text.contains(&resolved.resources.provenance_url));
        assert!(text.contains(&resolved.resources.sbom_url));
    }

    #[test]
    fn dry_run_plan_serialises_to_json() {
        let identity = ReleaseIdentity::parse("2.7.6", "linux", "arm").expect("valid");
        let resolved = resolve(&ReleaseHost::default(), "caddy", &identity);
        let plan = DryRunPlan::new(&resolved, Utf8Path::new("."));
        let mut out = Vec::new();
        plan.write(&mut out, true).expect("write");

        let value: Value = serde_json::from_slice(&out).expect("valid JSON");
        assert_eq!(value["artifact"], "caddy_2.7.6_linux_arm");
        assert_eq!(value["resources"]["sbom_url"], resolved.resources.sbom_url.as_str());
    }

    #[test]
    fn write_stderr_line_appends_newline() {
        let mut stderr = Vec::new();
        write_stderr_line(&mut stderr, "error: boom");
        assert_eq!(stderr, b"error: boom\n");
    }
}
