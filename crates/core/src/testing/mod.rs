//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external collaborators
//! (torrent client, disk usage source), so a full reconciliation pass can be
//! exercised without a running qBittorrent or a filling disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use spacewarden_core::testing::{fixtures, MockDiskUsage, MockTorrentClient};
//!
//! let client = MockTorrentClient::with_torrents(vec![fixtures::torrent("a", 20)]);
//! let disk = MockDiskUsage::with_readings([40 * GIB, 100 * GIB]);
//! ```

mod mock_disk_usage;
mod mock_torrent_client;

pub use mock_disk_usage::MockDiskUsage;
pub use mock_torrent_client::{MockTorrentClient, RecordedDelete};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::selection::{GIB, SECS_PER_DAY};
    use crate::torrent_client::{TorrentRecord, TorrentState};

    /// A finished torrent of `size_gib` GiB that has seeded for 10 days and
    /// carries no tags.
    pub fn torrent(hash: &str, size_gib: u64) -> TorrentRecord {
        TorrentRecord::new(
            hash,
            format!("Torrent {}", hash),
            size_gib * GIB,
            TorrentState::StalledUp,
        )
        .with_ratio(1.0)
        .with_seeding_time(10 * SECS_PER_DAY)
    }

    /// Like [`torrent`], with an explicit state.
    pub fn torrent_in_state(hash: &str, size_gib: u64, state: TorrentState) -> TorrentRecord {
        let mut record = torrent(hash, size_gib);
        record.state = state;
        record
    }
}
