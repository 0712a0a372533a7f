//! Release resource retrieval.
//!
//! Provides a trait-based abstraction over HTTP downloads so the pipeline
//! can be driven by test doubles, plus [`fetch_resources`], which stages the
//! binary, provenance bundle, and SBOM bundle in that order and stops at the
//! first failure.

use crate::identity::{ResourceKind, ResourceSet};
use crate::session::Session;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::time::Duration;

/// Default network timeout for a single download.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default redirect limit; exceeding it is treated as a redirect loop.
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// Trait for downloading a release resource to a local file.
///
/// Abstractions allow tests to observe fetch order and inject failures
/// without network access.
#[cfg_attr(test, mockall::automock)]
pub trait ResourceFetcher {
    /// Download `url` into `dest`, overwriting any existing file.
    ///
    /// `dest` is only opened once the server has answered successfully.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NotFound`] or [`FetchError::HttpError`] when the
    /// request fails before anything is written, and [`FetchError::Io`] when
    /// writing or streaming the body fails after `dest` was opened.
    fn fetch(&self, url: &str, dest: &Utf8Path) -> Result<(), FetchError>;
}

/// Errors arising from resource downloads.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("release asset not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Whether the destination may hold a partial download.
    #[must_use]
    pub const fn wrote_destination(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// HTTP-based fetcher using `ureq`.
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher with the given timeout and redirect limit.
    #[must_use]
    pub fn new(timeout: Duration, max_redirects: u32) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .max_redirects(max_redirects)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_MAX_REDIRECTS)
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Utf8Path) -> Result<(), FetchError> {
        debug!("GET {url}");
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file).map_err(FetchError::Io)?;
        Ok(())
    }
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        ureq::Error::TooManyRedirects => FetchError::HttpError {
            url: url.to_owned(),
            reason: "too many redirects (possible redirect loop)".to_owned(),
        },
        other => FetchError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

/// Local paths of the three staged resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedResources {
    /// The downloaded release binary.
    pub binary: Utf8PathBuf,
    /// The downloaded provenance bundle.
    pub provenance: Utf8PathBuf,
    /// The downloaded SBOM bundle.
    pub sbom: Utf8PathBuf,
}

/// Download every resource of `resources` into the session.
///
/// Resources are fetched in [`ResourceKind::ORDERED`] order. A path is
/// registered with the session once its download has written to it, so a
/// partial download is removed at cleanup while a pre-existing file is left
/// alone when the request itself fails. No resource after the first failure
/// is requested.
///
/// # Errors
///
/// Returns the first [`FetchError`] encountered.
pub fn fetch_resources(
    resources: &ResourceSet,
    fetcher: &dyn ResourceFetcher,
    session: &mut Session,
) -> Result<StagedResources, FetchError> {
    let [binary, provenance, sbom] = ResourceKind::ORDERED.map(|kind| session.path_for(kind));

    for kind in ResourceKind::ORDERED {
        let dest = session.path_for(kind);
        let url = resources.url(kind);
        if let Err(e) = fetcher.fetch(url, &dest) {
            if e.wrote_destination() {
                session.stage(kind);
            }
            return Err(e);
        }
        session.stage(kind);
        info!("fetched {kind} to {dest}");
    }

    Ok(StagedResources {
        binary,
        provenance,
        sbom,
    })
}
