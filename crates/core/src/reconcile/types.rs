//! Types for the reconciliation driver.

use thiserror::Error;

use crate::disk::DiskUsageError;
use crate::torrent_client::{TorrentClientError, TorrentRecord};

/// Steps of a reconciliation pass, in order. No step is revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReconcilePhase {
    /// Initial free-space check.
    Initial,
    /// Deficit known; connecting to the torrent client.
    DeficitComputed,
    /// Torrent list fetched.
    CandidatesFetched,
    /// Filter pipeline applied.
    Filtered,
    /// Torrents chosen for removal.
    Selected,
    /// Delete request sent.
    Deleting,
    /// Final free-space check after the wait.
    Recheck,
}

impl ReconcilePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcilePhase::Initial => "initial",
            ReconcilePhase::DeficitComputed => "deficit_computed",
            ReconcilePhase::CandidatesFetched => "candidates_fetched",
            ReconcilePhase::Filtered => "filtered",
            ReconcilePhase::Selected => "selected",
            ReconcilePhase::Deleting => "deleting",
            ReconcilePhase::Recheck => "recheck",
        }
    }
}

impl std::fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that end a reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Free space could not be read at the initial check.
    #[error("disk usage error: {0}")]
    DiskUsage(#[from] DiskUsageError),

    /// Free space could not be read after the delete request.
    #[error("disk usage error on recheck: {0}")]
    RecheckDiskUsage(#[source] DiskUsageError),

    /// The torrent client could not be reached or rejected our credentials.
    #[error("failed to connect to torrent client: {0}")]
    Connect(#[source] TorrentClientError),

    /// Listing torrents failed.
    #[error("failed to list torrents: {0}")]
    ListTorrents(#[source] TorrentClientError),

    /// The client has no torrents at all.
    #[error("no torrents found on the client")]
    NoTorrents,

    /// No torrent passed the filter criteria.
    #[error("none of the {total} torrents matched the removal criteria")]
    NoEligibleTorrents { total: usize },

    /// Removing every eligible torrent would still not free enough space.
    #[error("eligible torrents hold {available_bytes} bytes but {deficit_bytes} bytes must be freed")]
    InsufficientSelectableSpace {
        available_bytes: u64,
        deficit_bytes: u64,
    },

    /// Torrents were removed but free space is still below the requirement.
    #[error("free space is {free_bytes} bytes after cleanup, {required_bytes} bytes required")]
    StillInsufficient { free_bytes: u64, required_bytes: u64 },
}

impl ReconcileError {
    /// Environment failures (bad path, unreachable client) as opposed to
    /// expected outcomes where there was simply nothing suitable to remove.
    pub fn is_environment(&self) -> bool {
        matches!(
            self,
            ReconcileError::DiskUsage(_)
                | ReconcileError::RecheckDiskUsage(_)
                | ReconcileError::Connect(_)
                | ReconcileError::ListTorrents(_)
        )
    }

    /// The phase in which the pass stopped.
    pub fn phase(&self) -> ReconcilePhase {
        match self {
            ReconcileError::DiskUsage(_) => ReconcilePhase::Initial,
            ReconcileError::Connect(_) => ReconcilePhase::DeficitComputed,
            ReconcileError::ListTorrents(_) | ReconcileError::NoTorrents => {
                ReconcilePhase::CandidatesFetched
            }
            ReconcileError::NoEligibleTorrents { .. } => ReconcilePhase::Filtered,
            ReconcileError::InsufficientSelectableSpace { .. } => ReconcilePhase::Selected,
            ReconcileError::RecheckDiskUsage(_) | ReconcileError::StillInsufficient { .. } => {
                ReconcilePhase::Recheck
            }
        }
    }
}

/// Successful end of a reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Enough space was free to begin with; nothing was touched.
    AlreadySufficient { free_bytes: u64 },
    /// Torrents were removed and the requirement is now met.
    Freed {
        /// Removed torrents, in removal-priority order.
        removed: Vec<TorrentRecord>,
        /// Sum of the removed torrents' sizes.
        freed_estimate_bytes: u64,
        /// Free space measured after the wait.
        free_bytes: u64,
    },
}

impl ReconcileOutcome {
    pub fn free_bytes(&self) -> u64 {
        match self {
            ReconcileOutcome::AlreadySufficient { free_bytes } => *free_bytes,
            ReconcileOutcome::Freed { free_bytes, .. } => *free_bytes,
        }
    }
}
