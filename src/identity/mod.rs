//! Release identity resolution.
//!
//! Maps operator input to the artifact name and the three remote resources
//! that make up a verifiable release.
//!
//! # Sub-modules
//!
//! - [`error`] - Validation errors for identity components.
//! - [`naming`] - `ReleaseIdentity` and the `ArtifactName` policy.
//! - [`platform`] - `Platform` and `Architecture` enumerations.
//! - [`resources`] - `ReleaseHost`, `ResourceKind`, and `ResourceSet`.

pub mod error;
pub mod naming;
pub mod platform;
pub mod resources;

pub use error::IdentityError;
pub use naming::{ArtifactName, DEFAULT_ARTIFACT_PREFIX, ReleaseIdentity};
pub use platform::{Architecture, Platform};
pub use resources::{ReleaseHost, ResourceKind, ResourceSet};

/// An identity resolved to its artifact name and remote locators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    /// The identity that was resolved.
    pub identity: ReleaseIdentity,
    /// The published artifact name.
    pub name: ArtifactName,
    /// The binary, provenance, and SBOM locators.
    pub resources: ResourceSet,
}

/// Resolve an identity to its artifact name and resource locators.
///
/// This is a pure function of its inputs.
///
/// # Examples
///
/// ```
/// use caddy_verify::identity::{ReleaseHost, ReleaseIdentity, resolve};
///
/// let identity = ReleaseIdentity::parse("2.7.6", "darwin", "arm64")
///     .expect("valid identity");
/// let resolved = resolve(&ReleaseHost::default(), "caddy", &identity);
/// assert_eq!(resolved.name.as_str(), "caddy_2.7.6_mac_arm64");
/// assert!(resolved.resources.sbom_url.ends_with(".sbom.bundle"));
/// ```
#[must_use]
pub fn resolve(host: &ReleaseHost, prefix: &str, identity: &ReleaseIdentity) -> ResolvedRelease {
    let name = ArtifactName::new(prefix, identity);
    let resources = ResourceSet::new(host, identity, &name);
    ResolvedRelease {
        identity: identity.clone(),
        name,
        resources,
    }
}
