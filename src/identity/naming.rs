//! Release identity and artifact naming policy.
//!
//! Artifact names follow `<prefix>_<version>_<platform>_<arch>`, with the
//! platform segment taken from [`Platform::artifact_segment`] so that Darwin
//! binaries resolve to the published `mac` name.

use super::error::{IdentityError, Result};
use super::platform::{Architecture, Platform};
use serde::Serialize;
use std::fmt;

/// The artifact prefix used by upstream Caddy releases.
pub const DEFAULT_ARTIFACT_PREFIX: &str = "caddy";

/// The validated (version, platform, architecture) triple being verified.
///
/// Construct with [`ReleaseIdentity::parse`] from raw operator input, or with
/// [`ReleaseIdentity::new`] from already-validated parts.
///
/// # Examples
///
/// ```
/// use caddy_verify::identity::{Architecture, Platform, ReleaseIdentity};
///
/// let identity = ReleaseIdentity::parse("2.7.6", "darwin", "arm64")
///     .expect("valid identity");
/// assert_eq!(identity.platform(), Platform::Darwin);
/// assert_eq!(identity.architecture(), Architecture::Arm64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ReleaseIdentity {
    version: String,
    platform: Platform,
    architecture: Architecture,
}

impl ReleaseIdentity {
    /// Create an identity from validated components.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::EmptyVersion`] when `version` is blank.
    pub fn new(version: &str, platform: Platform, architecture: Architecture) -> Result<Self> {
        let trimmed = version.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::EmptyVersion);
        }
        Ok(Self {
            version: trimmed.to_owned(),
            platform,
            architecture,
        })
    }

    /// Validate raw operator input and build an identity.
    ///
    /// A leading `v` on the version is accepted and stripped, since release
    /// tags carry it but artifact names do not.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] naming the first invalid component.
    pub fn parse(version: &str, platform: &str, architecture: &str) -> Result<Self> {
        let platform = Platform::try_from(platform)?;
        let architecture = Architecture::try_from(architecture)?;
        let version = version.trim();
        let version = version.strip_prefix('v').unwrap_or(version);
        Self::new(version, platform, architecture)
    }

    /// Return the release version without the tag's `v` prefix.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Return the platform component.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Return the architecture component.
    #[must_use]
    pub const fn architecture(&self) -> Architecture {
        self.architecture
    }
}

impl fmt::Display for ReleaseIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{} {}/{}", self.version, self.platform, self.architecture)
    }
}

/// The published file name of a release binary.
///
/// # Examples
///
/// ```
/// use caddy_verify::identity::{ArtifactName, ReleaseIdentity};
///
/// let identity = ReleaseIdentity::parse("2.7.6", "darwin", "arm64")
///     .expect("valid identity");
/// let name = ArtifactName::new("caddy", &identity);
/// assert_eq!(name.as_str(), "caddy_2.7.6_mac_arm64");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ArtifactName(String);

impl ArtifactName {
    /// Derive the artifact name for `identity` under the given prefix.
    #[must_use]
    pub fn new(prefix: &str, identity: &ReleaseIdentity) -> Self {
        Self(format!(
            "{prefix}_{}_{}_{}",
            identity.version(),
            identity.platform().artifact_segment(),
            identity.architecture().as_str()
        ))
    }

    /// Return the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the file name for this artifact with `suffix` appended.
    #[must_use]
    pub fn with_suffix(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.0)
    }
}

impl AsRef<str> for ArtifactName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
