//! Verification session and staged-file cleanup.
//!
//! A [`Session`] owns every local file created while verifying one artifact.
//! A path is registered once a download has written to it, including a
//! download that failed part way; a file that only shares the name is left
//! alone. [`Session::cleanup`] runs exactly once: the orchestrator calls it
//! on every exit path, and `Drop` covers anything that unwinds past the
//! orchestrator.

use crate::identity::{ArtifactName, ResourceKind};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::io::ErrorKind;

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Paths that existed and were removed.
    pub removed: Vec<Utf8PathBuf>,
    /// Paths that could not be removed, with the reason.
    pub failed: Vec<(Utf8PathBuf, String)>,
}

impl CleanupReport {
    /// Returns `true` when every registered path is gone.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The files staged for one verification run.
///
/// # Examples
///
/// ```
/// use caddy_verify::identity::{ArtifactName, ReleaseIdentity, ResourceKind};
/// use caddy_verify::session::Session;
///
/// let dir = tempfile::tempdir().expect("temp dir");
/// let work_dir = camino::Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("UTF-8");
/// let identity = ReleaseIdentity::parse("2.7.6", "linux", "amd64").expect("valid");
/// let mut session = Session::new(&work_dir, ArtifactName::new("caddy", &identity));
///
/// let path = session.stage(ResourceKind::Sbom);
/// std::fs::write(&path, b"bundle").expect("write");
///
/// let report = session.cleanup();
/// assert_eq!(report.removed, vec![path.clone()]);
/// assert!(!path.exists());
/// ```
#[derive(Debug)]
pub struct Session {
    work_dir: Utf8PathBuf,
    artifact: ArtifactName,
    staged: Vec<Utf8PathBuf>,
    cleaned: bool,
}

impl Session {
    /// Open a session staging files for `artifact` under `work_dir`.
    #[must_use]
    pub fn new(work_dir: &Utf8Path, artifact: ArtifactName) -> Self {
        Self {
            work_dir: work_dir.to_owned(),
            artifact,
            staged: Vec::new(),
            cleaned: false,
        }
    }

    /// Return the local path for a resource without registering it.
    #[must_use]
    pub fn path_for(&self, kind: ResourceKind) -> Utf8PathBuf {
        self.work_dir.join(self.artifact.with_suffix(kind.suffix()))
    }

    /// Register the local path for a resource that has been written, and
    /// return it.
    ///
    /// Registering the same resource twice yields the same path once.
    pub fn stage(&mut self, kind: ResourceKind) -> Utf8PathBuf {
        let path = self.path_for(kind);
        if !self.staged.contains(&path) {
            debug!("tracking staged file {path}");
            self.staged.push(path.clone());
        }
        path
    }

    /// Return every registered path, in registration order.
    #[must_use]
    pub fn staged(&self) -> &[Utf8PathBuf] {
        &self.staged
    }

    /// Remove every registered file.
    ///
    /// Files that are already absent are skipped silently. Calling this a
    /// second time does nothing and returns an empty report.
    pub fn cleanup(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        if self.cleaned {
            return report;
        }
        self.cleaned = true;

        for path in self.staged.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!("removed {path}");
                    report.removed.push(path);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("failed to remove staged file {path}: {e}");
                    report.failed.push((path, e.to_string()));
                }
            }
        }
        report
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.cleaned {
            let report = self.cleanup();
            if !report.removed.is_empty() {
                debug!(
                    "removed {} staged file(s) while dropping session",
                    report.removed.len()
                );
            }
        }
    }
}
