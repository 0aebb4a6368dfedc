use std::path::Path;

use tempfile::TempPath;

/// A fully downloaded source payload held in a local temp file.
///
/// The backing file is removed when the value is dropped, so every exit
/// path of a transfer (success, error, timeout, cancellation) releases the
/// staging space without explicit bookkeeping.
pub struct StagedFile {
    path: TempPath,
    name: String,
    size: u64,
}

impl StagedFile {
    /// Wraps a temp file holding `size` bytes of content named `name` at
    /// the source.
    pub fn new(path: TempPath, name: impl Into<String>, size: u64) -> Self {
        Self {
            path,
            name: name.into(),
            size,
        }
    }

    /// Location of the staged bytes on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name inferred from the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total staged size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Deletes the staged file now instead of waiting for drop.
    pub fn discard(self) {
        if let Err(err) = self.path.close() {
            tracing::warn!(%err, "failed to remove staged file");
        }
    }
}

impl std::fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedFile")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("size", &self.size)
            .finish()
    }
}
