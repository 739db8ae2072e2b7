use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// A temporary directory owned by a single import run.
///
/// The directory is removed when the guard is dropped, on success and failure
/// alike, unless [`StagingArea::keep`] was requested.
#[derive(Debug)]
pub struct StagingArea {
    path: PathBuf,
    keep: bool,
}

impl StagingArea {
    /// Create a fresh, uniquely named directory under `base`, or under the
    /// system temp directory when `base` is `None`.
    pub fn create(base: Option<&Path>, prefix: &str) -> Result<Self> {
        let base = base.map_or_else(std::env::temp_dir, Path::to_path_buf);
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(&base)
            .map_err(|e| Error::Staging {
                base: base.clone(),
                source: e,
            })?;

        Ok(Self {
            path: dir.keep(),
            keep: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Leave the directory on disk when the guard drops.
    pub fn keep(&mut self, keep: bool) {
        self.keep = keep;
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.keep {
            tracing::info!(path = %self.path.display(), "keeping temporary directory");
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to clean up");
            }
        }
    }
}
