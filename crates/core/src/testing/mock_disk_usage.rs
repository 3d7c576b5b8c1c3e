//! Mock disk usage source for testing.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::disk::{DiskUsage, DiskUsageError};

/// Mock implementation of the DiskUsage trait.
///
/// Returns scripted readings in order; once only one reading is left it is
/// returned for every further query.
///
/// # Example
///
/// ```rust,ignore
/// // 40 GiB free before cleanup, 100 GiB after
/// let disk = MockDiskUsage::with_readings([40 * GIB, 100 * GIB]);
/// ```
#[derive(Debug)]
pub struct MockDiskUsage {
    readings: Mutex<VecDeque<u64>>,
    missing_path: bool,
    /// Queries after this many successful readings fail with an I/O error.
    fail_after: Option<usize>,
    queries: AtomicUsize,
}

impl MockDiskUsage {
    /// A disk whose free space never changes.
    pub fn new(free_bytes: u64) -> Self {
        Self::with_readings([free_bytes])
    }

    /// A disk reporting each reading in turn.
    pub fn with_readings(readings: impl IntoIterator<Item = u64>) -> Self {
        Self {
            readings: Mutex::new(readings.into_iter().collect()),
            missing_path: false,
            fail_after: None,
            queries: AtomicUsize::new(0),
        }
    }

    /// A disk on which every path is reported missing.
    pub fn missing_path() -> Self {
        Self {
            missing_path: true,
            ..Self::with_readings([])
        }
    }

    /// Fail every query after the first `successes` readings.
    pub fn failing_after(mut self, successes: usize) -> Self {
        self.fail_after = Some(successes);
        self
    }

    /// Number of free-space queries made so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl DiskUsage for MockDiskUsage {
    fn free_bytes(&self, path: &Path) -> Result<u64, DiskUsageError> {
        let previous = self.queries.fetch_add(1, Ordering::SeqCst);
        if self.missing_path {
            return Err(DiskUsageError::PathNotFound(path.display().to_string()));
        }
        if self.fail_after.is_some_and(|n| previous >= n) {
            return Err(DiskUsageError::Io {
                path: path.display().to_string(),
                source: std::io::Error::other("mock disk failure"),
            });
        }

        let mut readings = self.readings.lock().unwrap_or_else(|e| e.into_inner());
        let reading = if readings.len() > 1 {
            readings.pop_front()
        } else {
            readings.front().copied()
        };
        Ok(reading.unwrap_or(0))
    }
}
