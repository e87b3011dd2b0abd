//! Call-scoped temporary storage for restores

use pgpipe_core::config::RestoreConfig;
use pgpipe_core::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Uniquely named directory owned by one restore call.
///
/// The directory and everything in it is removed when the workspace is
/// dropped or closed, on success and failure paths alike.
#[derive(Debug)]
pub struct TransientWorkspace {
    dir: TempDir,
}

impl TransientWorkspace {
    /// Creates a fresh directory under the configured root (system temp dir by default).
    pub fn create(config: &RestoreConfig) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&config.workspace_prefix);

        let dir = match &config.workspace_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| Error::io("error creating temp dir", e))?;

        debug!("Created restore workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file directly inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Removes the workspace, reporting failures instead of ignoring them.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().display().to_string();
        self.dir
            .close()
            .map_err(|e| Error::io(format!("error removing {}", path), e))?;
        debug!("Removed restore workspace {}", path);
        Ok(())
    }
}
