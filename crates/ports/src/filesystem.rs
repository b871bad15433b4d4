//! Filesystem port (spec §6 "Filesystem port").

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::PortsError;

/// Port for the filesystem operations resource handlers need: existence
/// checks, reads/writes of per-request artifacts, directory creation, and
/// enumeration (used by the data handler to walk the data directory).
#[async_trait]
pub trait FilesystemPort: Send + Sync {
    /// Returns `true` if a path exists.
    async fn exists(&self, path: &Path) -> Result<bool, PortsError>;

    /// Read a file's full contents.
    async fn read(&self, path: &Path) -> Result<Vec<u8>, PortsError>;

    /// Write `contents` to `path`, creating or truncating it.
    async fn write(&self, path: &Path, contents: &[u8]) -> Result<(), PortsError>;

    /// Create a directory and all missing parent directories.
    async fn mkdir_all(&self, path: &Path) -> Result<(), PortsError>;

    /// Recursively list regular files under `path`.
    async fn walk(&self, path: &Path) -> Result<Vec<PathBuf>, PortsError>;
}
