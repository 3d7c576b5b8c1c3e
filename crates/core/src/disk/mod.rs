//! Free-space queries against the local filesystem.

use std::path::Path;

use thiserror::Error;

/// Errors from disk usage queries.
#[derive(Debug, Error)]
pub enum DiskUsageError {
    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("failed to query free space for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Source of free-space readings.
pub trait DiskUsage: Send + Sync {
    /// Bytes available to the current user on the filesystem holding `path`.
    fn free_bytes(&self, path: &Path) -> Result<u64, DiskUsageError>;
}

/// Reads free space from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fs2DiskUsage;

impl DiskUsage for Fs2DiskUsage {
    fn free_bytes(&self, path: &Path) -> Result<u64, DiskUsageError> {
        if !path.exists() {
            return Err(DiskUsageError::PathNotFound(path.display().to_string()));
        }
        fs2::available_space(path).map_err(|source| DiskUsageError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_free_bytes_for_existing_dir() {
        let dir = TempDir::new().unwrap();
        let free = Fs2DiskUsage.free_bytes(dir.path());
        assert!(free.is_ok());
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let result = Fs2DiskUsage.free_bytes(Path::new("/definitely/not/here/anywhere"));
        assert!(matches!(result, Err(DiskUsageError::PathNotFound(_))));
    }
}
