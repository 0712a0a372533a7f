//! Attestation verification.
//!
//! Each release carries two attestations over the same binary: SLSA build
//! provenance and a CycloneDX SBOM. Verification is delegated to `cosign
//! verify-blob-attestation` through the [`AttestationVerifier`] seam. Both
//! attestations are always checked, one after the other, and the run passes
//! only when both verify.

use crate::deps::CommandExecutor;
use crate::fetch::StagedResources;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use std::fmt;

/// Default `--type` for the provenance attestation.
pub const DEFAULT_PROVENANCE_TYPE: &str = "slsaprovenance";

/// Default `--type` for the SBOM attestation.
pub const DEFAULT_SBOM_TYPE: &str = "cyclonedx";

/// OIDC issuer for GitHub Actions keyless signing.
pub const DEFAULT_OIDC_ISSUER: &str = "https://token.actions.githubusercontent.com";

/// The attestations checked for every release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttestationKind {
    /// SLSA build provenance.
    Provenance,
    /// CycloneDX software bill of materials.
    Sbom,
}

impl AttestationKind {
    /// Verification order.
    pub const ORDERED: [Self; 2] = [Self::Provenance, Self::Sbom];

    /// Whether the verifier must also return the attested payload.
    #[must_use]
    pub const fn wants_payload(self) -> bool {
        matches!(self, Self::Provenance)
    }
}

impl fmt::Display for AttestationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Provenance => "SLSA provenance",
            Self::Sbom => "SBOM",
        })
    }
}

/// Whether an attestation verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// Signature, certificate identity, subject digest, and type all matched.
    Verified,
    /// Any check failed.
    Failed,
}

/// The result of verifying one attestation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    /// Verified or failed.
    pub kind: OutcomeKind,
    /// Diagnostic text from the verifier (typically its stderr).
    pub detail: String,
    /// The attested envelope, when requested and available.
    pub decoded_payload: Option<Vec<u8>>,
}

impl VerificationOutcome {
    /// A successful outcome.
    #[must_use]
    pub fn verified(detail: impl Into<String>, decoded_payload: Option<Vec<u8>>) -> Self {
        Self {
            kind: OutcomeKind::Verified,
            detail: detail.into(),
            decoded_payload,
        }
    }

    /// A failed outcome.
    #[must_use]
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Failed,
            detail: detail.into(),
            decoded_payload: None,
        }
    }

    /// Returns `true` if the attestation verified.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.kind == OutcomeKind::Verified
    }
}

/// Trait for verifying one attestation bundle against a staged artifact.
///
/// Implementations must report [`OutcomeKind::Failed`] rather than erroring;
/// a verifier that cannot run has not verified anything.
#[cfg_attr(test, mockall::automock)]
pub trait AttestationVerifier {
    /// Verify `bundle` as an attestation of `kind` over `artifact`.
    fn verify(
        &self,
        kind: AttestationKind,
        artifact: &Utf8Path,
        bundle: &Utf8Path,
    ) -> VerificationOutcome;
}

/// Parameters passed to `cosign verify-blob-attestation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosignSettings {
    /// The cosign binary to invoke.
    pub binary: String,
    /// Regular expression the signing certificate identity must match.
    pub certificate_identity_regexp: String,
    /// Expected OIDC issuer of the signing certificate.
    pub certificate_oidc_issuer: String,
    /// `--type` value for the provenance attestation.
    pub provenance_type: String,
    /// `--type` value for the SBOM attestation.
    pub sbom_type: String,
}

impl CosignSettings {
    /// Return the `--type` value for `kind`.
    #[must_use]
    pub fn type_for(&self, kind: AttestationKind) -> &str {
        match kind {
            AttestationKind::Provenance => &self.provenance_type,
            AttestationKind::Sbom => &self.sbom_type,
        }
    }

    /// Build the argument list for verifying `bundle` over `artifact`.
    ///
    /// # Examples
    ///
    /// ```
    /// use caddy_verify::attest::{AttestationKind, CosignSettings};
    /// use camino::Utf8Path;
    ///
    /// let settings = CosignSettings {
    ///     binary: "cosign".to_owned(),
    ///     certificate_identity_regexp: "^https://github\\.com/caddyserver/caddy/".to_owned(),
    ///     certificate_oidc_issuer: "https://token.actions.githubusercontent.com".to_owned(),
    ///     provenance_type: "slsaprovenance".to_owned(),
    ///     sbom_type: "cyclonedx".to_owned(),
    /// };
    /// let args = settings.arguments(
    ///     AttestationKind::Provenance,
    ///     Utf8Path::new("caddy_2.7.6_linux_amd64"),
    ///     Utf8Path::new("caddy_2.7.6_linux_amd64.intoto.bundle"),
    /// );
    /// assert_eq!(args.first().map(String::as_str), Some("verify-blob-attestation"));
    /// assert_eq!(args.last().map(String::as_str), Some("caddy_2.7.6_linux_amd64"));
    /// ```
    #[must_use]
    pub fn arguments(
        &self,
        kind: AttestationKind,
        artifact: &Utf8Path,
        bundle: &Utf8Path,
    ) -> Vec<String> {
        vec![
            "verify-blob-attestation".to_owned(),
            "--bundle".to_owned(),
            bundle.to_string(),
            "--type".to_owned(),
            self.type_for(kind).to_owned(),
            "--certificate-identity-regexp".to_owned(),
            self.certificate_identity_regexp.clone(),
            "--certificate-oidc-issuer".to_owned(),
            self.certificate_oidc_issuer.clone(),
            artifact.to_string(),
        ]
    }
}

/// Verifier backed by the `cosign` CLI.
pub struct CosignVerifier<'a> {
    executor: &'a dyn CommandExecutor,
    settings: CosignSettings,
}

impl<'a> CosignVerifier<'a> {
    /// Create a verifier running cosign through `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, settings: CosignSettings) -> Self {
        Self { executor, settings }
    }
}

impl AttestationVerifier for CosignVerifier<'_> {
    fn verify(
        &self,
        kind: AttestationKind,
        artifact: &Utf8Path,
        bundle: &Utf8Path,
    ) -> VerificationOutcome {
        let args = self.settings.arguments(kind, artifact, bundle);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = match self.executor.run(&self.settings.binary, &arg_refs) {
            Ok(output) => output,
            Err(e) => return VerificationOutcome::failed(format!("could not run cosign: {e}")),
        };

        let detail = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        if !output.status.success() {
            return VerificationOutcome::failed(detail);
        }

        let payload = if kind.wants_payload() {
            attested_payload(&output.stdout, bundle)
        } else {
            None
        };
        VerificationOutcome::verified(detail, payload)
    }
}

/// Select the attested envelope for decoding.
///
/// cosign's stdout is preferred when it carries anything; otherwise the
/// envelope embedded in the (now verified) bundle is used.
fn attested_payload(stdout: &[u8], bundle: &Utf8Path) -> Option<Vec<u8>> {
    if !stdout.trim_ascii().is_empty() {
        return Some(stdout.to_vec());
    }
    match std::fs::read(bundle) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!("could not read verified bundle {bundle}: {e}");
            None
        }
    }
}

/// Outcomes of both attestation checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// Provenance outcome.
    pub provenance: VerificationOutcome,
    /// SBOM outcome.
    pub sbom: VerificationOutcome,
}

impl VerificationReport {
    /// Return the outcome for `kind`.
    #[must_use]
    pub const fn outcome(&self, kind: AttestationKind) -> &VerificationOutcome {
        match kind {
            AttestationKind::Provenance => &self.provenance,
            AttestationKind::Sbom => &self.sbom,
        }
    }

    /// Returns `true` when both attestations verified.
    #[must_use]
    pub fn all_verified(&self) -> bool {
        self.provenance.is_verified() && self.sbom.is_verified()
    }

    /// Return every kind that failed, in verification order.
    #[must_use]
    pub fn failed_kinds(&self) -> Vec<AttestationKind> {
        AttestationKind::ORDERED
            .into_iter()
            .filter(|kind| !self.outcome(*kind).is_verified())
            .collect()
    }
}

/// Paths handed to the verifier for one attestation kind.
fn bundle_for(staged: &StagedResources, kind: AttestationKind) -> &Utf8PathBuf {
    match kind {
        AttestationKind::Provenance => &staged.provenance,
        AttestationKind::Sbom => &staged.sbom,
    }
}

/// Verify both attestations of a staged release.
///
/// The SBOM check runs even when provenance fails so that both outcomes are
/// available for diagnostics. `on_start` is called before each check.
pub fn verify_attestations(
    verifier: &dyn AttestationVerifier,
    staged: &StagedResources,
    mut on_start: impl FnMut(AttestationKind),
) -> VerificationReport {
    let [provenance, sbom] = AttestationKind::ORDERED.map(|kind| {
        on_start(kind);
        debug!("verifying {kind} attestation");
        let outcome = verifier.verify(kind, &staged.binary, bundle_for(staged, kind));
        if outcome.is_verified() {
            info!("{kind} attestation verified");
        } else {
            warn!("{kind} attestation failed: {}", outcome.detail);
        }
        outcome
    });
    VerificationReport { provenance, sbom }
}
