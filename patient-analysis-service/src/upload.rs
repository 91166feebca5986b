//! Scratch storage for uploaded documents.
//!
//! An upload lives only long enough to be extracted: each one gets its own
//! temporary directory under the configured upload root, and the directory
//! is removed when the guard drops, whether or not analysis succeeded.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::TempDir;

/// A saved upload. Dropping the guard deletes the scratch directory.
pub struct ScratchUpload {
    _dir: TempDir,
    path: PathBuf,
}

impl ScratchUpload {
    /// Write `bytes` under `upload_root` using the client-supplied filename,
    /// reduced to a safe final component.
    pub async fn save(upload_root: &Path, filename: &str, bytes: &[u8]) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(upload_root)
            .await
            .with_context(|| {
                format!("failed to create upload directory {}", upload_root.display())
            })?;
        let dir = TempDir::new_in(upload_root).context("failed to allocate scratch directory")?;
        let path = dir.path().join(sanitize_filename(filename));
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write upload to {}", path.display()))?;
        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reduce a client-supplied filename to its final path component so uploads
/// cannot escape the scratch directory.
fn sanitize_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    name.replace(['\\', ':'], "_")
}
