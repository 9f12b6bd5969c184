// crates/testgen-cli/src/pipeline/store.rs
// ============================================================================
// Module: Artifact Store
// Description: The narrow store contract artifacts cross stage boundaries
//              through, plus a local-filesystem implementation (spec.md §6).
// Purpose: Let the driver persist each stage's output without committing to
//          any one backing technology; a networked store could implement
//          the same trait untouched.
// Dependencies: std::fs, std::path, thiserror
// ============================================================================

//! ## Overview
//! [`ArtifactStore`] is a narrow three-method contract with no assumptions
//! about what backs it. [`FileSystemArtifactStore`] is the one conforming implementation
//! this crate ships (spec.md §9: "the persistent *service* that fronts it
//! in production is out of scope; the trait and one conforming
//! implementation are in scope"), laying artifacts out under
//! `<root>/<job_id>/<artifact_name>` so `tests/<operation-id>.py` lands in
//! a `tests/` subdirectory per job, matching spec.md §6's artifact layout.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing artifacts.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying filesystem (or other backing store) failed.
    #[error("artifact store io error: {0}")]
    Io(String),
    /// The requested artifact does not exist.
    #[error("artifact not found: {0}")]
    NotFound(String),
}

/// The contract artifacts cross stage boundaries through (spec.md §6).
pub trait ArtifactStore: Send + Sync {
    /// Writes `bytes` under `job_id`/`artifact_name`, creating any missing
    /// parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn put(&self, job_id: &str, artifact_name: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Reads back a previously stored artifact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such artifact was written, or
    /// [`StoreError::Io`] on a read failure.
    fn get(&self, job_id: &str, artifact_name: &str) -> Result<Vec<u8>, StoreError>;

    /// Lists every artifact name written for `job_id`, in no particular
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the job's artifact directory cannot be
    /// enumerated.
    fn list_job_artifacts(&self, job_id: &str) -> Result<Vec<String>, StoreError>;
}

/// An [`ArtifactStore`] backed by the local filesystem, rooted at one
/// directory shared by every job.
pub struct FileSystemArtifactStore {
    /// Directory every job's artifacts are written under, one
    /// subdirectory per `job_id`.
    root: PathBuf,
}

impl FileSystemArtifactStore {
    /// Builds a store rooted at `root`. The directory is created lazily on
    /// first write, not here.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves `job_id`/`artifact_name` to an absolute path under `root`.
    fn resolve(&self, job_id: &str, artifact_name: &str) -> PathBuf {
        self.root.join(job_id).join(artifact_name)
    }
}

impl ArtifactStore for FileSystemArtifactStore {
    fn put(&self, job_id: &str, artifact_name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.resolve(job_id, artifact_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| StoreError::Io(err.to_string()))?;
        }
        fs::write(&path, bytes).map_err(|err| StoreError::Io(err.to_string()))
    }

    fn get(&self, job_id: &str, artifact_name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(job_id, artifact_name);
        if !path.exists() {
            return Err(StoreError::NotFound(artifact_name.to_string()));
        }
        fs::read(&path).map_err(|err| StoreError::Io(err.to_string()))
    }

    fn list_job_artifacts(&self, job_id: &str) -> Result<Vec<String>, StoreError> {
        let job_dir = self.root.join(job_id);
        if !job_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        collect_relative_paths(&job_dir, &job_dir, &mut names).map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(names)
    }
}

/// Recursively collects every regular file under `dir`, relative to `base`,
/// using `/`-separated components regardless of host path separator so
/// artifact names are stable across platforms.
fn collect_relative_paths(base: &Path, dir: &Path, out: &mut Vec<String>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_relative_paths(base, &path, out)?;
        } else if let Ok(relative) = path.strip_prefix(base) {
            let components: Vec<String> = relative.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
            out.push(components.join("/"));
        }
    }
    Ok(())
}
