//! Remote resource locators for a release artifact.
//!
//! Every release publishes three files side by side: the binary itself, its
//! SLSA provenance bundle, and its SBOM attestation bundle. The locators are
//! plain string templating over [`ReleaseHost`].

use super::naming::{ArtifactName, ReleaseIdentity};
use serde::Serialize;
use std::fmt;

/// Default release host.
pub const DEFAULT_HOST: &str = "github.com";

/// Default `owner/repository` path on the release host.
pub const DEFAULT_PROJECT: &str = "caddyserver/caddy";

/// The three resource types published for every artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// The release binary.
    Binary,
    /// The SLSA provenance bundle.
    Provenance,
    /// The SBOM attestation bundle.
    Sbom,
}

impl ResourceKind {
    /// Fetch order: binary, then provenance, then SBOM.
    pub const ORDERED: [Self; 3] = [Self::Binary, Self::Provenance, Self::Sbom];

    /// Return the file-name suffix appended to the artifact name.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Binary => "",
            Self::Provenance => ".intoto.bundle",
            Self::Sbom => ".sbom.bundle",
        }
    }

    /// Return a short human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Provenance => "provenance bundle",
            Self::Sbom => "SBOM bundle",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The release download location template.
///
/// URLs take the form
/// `https://<host>/<project>/releases/download/v<version>/<artifact><suffix>`.
///
/// # Examples
///
/// ```
/// use caddy_verify::identity::ReleaseHost;
///
/// let host = ReleaseHost::default();
/// assert_eq!(
///     host.download_base("2.7.6"),
///     "https://github.com/caddyserver/caddy/releases/download/v2.7.6"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHost {
    host: String,
    project: String,
}

impl ReleaseHost {
    /// Create a template for the given host and `owner/repository` path.
    ///
    /// Surrounding slashes are trimmed from both parts.
    #[must_use]
    pub fn new(host: &str, project: &str) -> Self {
        Self {
            host: host.trim_matches('/').to_owned(),
            project: project.trim_matches('/').to_owned(),
        }
    }

    /// Return the host name.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Return the `owner/repository` path.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Return the directory URL holding every asset of `version`.
    #[must_use]
    pub fn download_base(&self, version: &str) -> String {
        format!(
            "https://{}/{}/releases/download/v{version}",
            self.host, self.project
        )
    }

    /// Return the URL of a single asset.
    #[must_use]
    pub fn asset_url(&self, version: &str, filename: &str) -> String {
        format!("{}/{filename}", self.download_base(version))
    }
}

impl Default for ReleaseHost {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PROJECT)
    }
}

/// The three locators for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSet {
    /// URL of the release binary.
    pub binary_url: String,
    /// URL of the SLSA provenance bundle.
    pub provenance_url: String,
    /// URL of the SBOM attestation bundle.
    pub sbom_url: String,
}

impl ResourceSet {
    /// Build the locators for `name` at the identity's version.
    #[must_use]
    pub fn new(host: &ReleaseHost, identity: &ReleaseIdentity, name: &ArtifactName) -> Self {
        let url = |kind: ResourceKind| {
            host.asset_url(identity.version(), &name.with_suffix(kind.suffix()))
        };
        Self {
            binary_url: url(ResourceKind::Binary),
            provenance_url: url(ResourceKind::Provenance),
            sbom_url: url(ResourceKind::Sbom),
        }
    }

    /// Return the locator for `kind`.
    #[must_use]
    pub fn url(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Binary => &self.binary_url,
            ResourceKind::Provenance => &self.provenance_url,
            ResourceKind::Sbom => &self.sbom_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample_set(host: &ReleaseHost) -> ResourceSet {
        let identity = ReleaseIdentity::parse("2.7.6", "darwin", "arm64").expect("valid");
        let name = ArtifactName::new("caddy", &identity);
        ResourceSet::new(host, &identity, &name)
    }

    #[test]
    fn default_host_produces_github_urls() {
        let set = sample_set(&ReleaseHost::default());
        let base = "https://github.com/caddyserver/caddy/releases/download/v2.7.6";
        assert_eq!(set.binary_url, format!("{base}/caddy_2.7.6_mac_arm64"));
        assert_eq!(
            set.provenance_url,
            format!("{base}/caddy_2.7.6_mac_arm64.intoto.bundle")
        );
        assert_eq!(
            set.sbom_url,
            format!("{base}/caddy_2.7.6_mac_arm64.sbom.bundle")
        );
    }

    #[test]
    fn version_path_segment_is_not_aliased() {
        let set = sample_set(&ReleaseHost::default());
        assert!(set.binary_url.contains("/download/v2.7.6/"));
        assert!(!set.binary_url.contains("darwin"));
    }

    #[test]
    fn custom_host_is_trimmed() {
        let set = sample_set(&ReleaseHost::new("mirror.example.test/", "/acme/caddy/"));
        assert!(
            set.binary_url
                .starts_with("https://mirror.example.test/acme/caddy/releases/download/")
        );
    }

    #[rstest]
    #[case::binary(ResourceKind::Binary, "")]
    #[case::provenance(ResourceKind::Provenance, ".intoto.bundle")]
    #[case::sbom(ResourceKind::Sbom, ".sbom.bundle")]
    fn url_lookup_matches_suffix(#[case] kind: ResourceKind, #[case] suffix: &str) {
        let set = sample_set(&ReleaseHost::default());
        let expected = format!("caddy_2.7.6_mac_arm64{suffix}");
        assert!(set.url(kind).ends_with(&expected));
    }
}
