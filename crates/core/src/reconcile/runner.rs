//! Space reconciliation driver.
//!
//! Runs strictly sequentially: every client call and disk query is awaited
//! before the next one starts, and nothing is spawned.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::CleanupConfig;
use crate::disk::{DiskUsage, DiskUsageError};
use crate::selection::{
    bytes_to_gib, select_for_cleanup, total_size, RankingStrategy, TorrentFilterBuilder,
};
use crate::torrent_client::{TorrentClient, TorrentRecord};

use super::types::{ReconcileError, ReconcileOutcome, ReconcilePhase};

/// Frees space at a path by removing torrents from a client.
pub struct SpaceReconciler {
    config: CleanupConfig,
    torrent_client: Arc<dyn TorrentClient>,
    disk_usage: Arc<dyn DiskUsage>,
    /// Overrides the strategy named in `config`.
    custom_strategy: Option<Box<dyn RankingStrategy>>,
}

impl SpaceReconciler {
    /// Create a new reconciler.
    pub fn new(
        config: CleanupConfig,
        torrent_client: Arc<dyn TorrentClient>,
        disk_usage: Arc<dyn DiskUsage>,
    ) -> Self {
        Self {
            config,
            torrent_client,
            disk_usage,
            custom_strategy: None,
        }
    }

    /// Use a strategy other than the built-in ones.
    pub fn with_strategy(mut self, strategy: Box<dyn RankingStrategy>) -> Self {
        self.custom_strategy = Some(strategy);
        self
    }

    pub fn config(&self) -> &CleanupConfig {
        &self.config
    }

    fn strategy(&self) -> &dyn RankingStrategy {
        match &self.custom_strategy {
            Some(strategy) => strategy.as_ref(),
            None => self.config.strategy.strategy(),
        }
    }

    /// Build the configured filter pipeline over a torrent list.
    pub fn filter<'a>(&self, torrents: &'a [TorrentRecord]) -> TorrentFilterBuilder<'a> {
        let mut builder = TorrentFilterBuilder::new(torrents)
            .with_states(self.config.states.iter().copied())
            .seeding_time_greater_than(self.config.min_seeding_time_secs)
            .without_tags(self.config.exclude_tags.iter().cloned());

        if !self.config.exclude_trackers.is_empty() {
            builder = builder.without_trackers(self.config.exclude_trackers.iter().cloned());
        }
        for needle in &self.config.exclude_trackers_containing {
            builder = builder.without_tracker_containing(needle.clone());
        }
        builder
    }

    /// Make sure `required_bytes` are free at `path`, removing torrents if needed.
    pub async fn run(
        &self,
        path: &Path,
        required_bytes: u64,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        debug!(phase = %ReconcilePhase::Initial, "Checking free space");
        let free_bytes = check_free_space(self.disk_usage.as_ref(), path, required_bytes)?;
        self.free_space(path, required_bytes, free_bytes).await
    }

    /// Continue a pass from an initial reading of `free_bytes` taken by the
    /// caller. Nothing is contacted when that reading already meets
    /// `required_bytes`.
    pub async fn free_space(
        &self,
        path: &Path,
        required_bytes: u64,
        free_bytes: u64,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if free_bytes >= required_bytes {
            info!("Sufficient disk space is already available");
            return Ok(ReconcileOutcome::AlreadySufficient { free_bytes });
        }

        let deficit = required_bytes - free_bytes;
        debug!(phase = %ReconcilePhase::DeficitComputed, deficit_bytes = deficit);
        info!("Need to free {:.2} GiB to meet requirement", bytes_to_gib(deficit));

        self.torrent_client
            .connect()
            .await
            .map_err(ReconcileError::Connect)?;

        let torrents = self
            .torrent_client
            .list_torrents()
            .await
            .map_err(ReconcileError::ListTorrents)?;
        debug!(phase = %ReconcilePhase::CandidatesFetched, count = torrents.len());
        if torrents.is_empty() {
            return Err(ReconcileError::NoTorrents);
        }

        let candidates = self.filter(&torrents).build();
        debug!(phase = %ReconcilePhase::Filtered, count = candidates.len());
        if candidates.is_empty() {
            return Err(ReconcileError::NoEligibleTorrents {
                total: torrents.len(),
            });
        }
        info!(
            "{} of {} torrents are eligible for removal ({:.2} GiB)",
            candidates.len(),
            torrents.len(),
            bytes_to_gib(total_size(&candidates))
        );

        let strategy = self.strategy();
        let selection = select_for_cleanup(&candidates, deficit, strategy);
        debug!(
            phase = %ReconcilePhase::Selected,
            strategy = strategy.name(),
            count = selection.len()
        );
        if selection.is_empty() {
            return Err(ReconcileError::InsufficientSelectableSpace {
                available_bytes: total_size(&candidates),
                deficit_bytes: deficit,
            });
        }

        info!(
            "Removing {} torrent(s) to free up {:.2} GiB",
            selection.len(),
            bytes_to_gib(selection.total_bytes)
        );
        for torrent in &selection.torrents {
            info!(" - Deleting: {} ({:.2} GiB)", torrent.name, bytes_to_gib(torrent.size_bytes));
        }

        debug!(phase = %ReconcilePhase::Deleting);
        match self
            .torrent_client
            .delete_torrents(&selection.hashes(), self.config.delete_files)
            .await
        {
            Ok(()) => info!("Torrent removal command sent to {}", self.torrent_client.name()),
            Err(e) => warn!("Delete request to {} failed: {}", self.torrent_client.name(), e),
        }

        let wait = Duration::from_secs(self.config.post_delete_wait_secs);
        info!("Waiting {}s before re-checking free space", wait.as_secs());
        tokio::time::sleep(wait).await;

        debug!(phase = %ReconcilePhase::Recheck);
        let free_after = check_free_space(self.disk_usage.as_ref(), path, required_bytes)
            .map_err(ReconcileError::RecheckDiskUsage)?;
        if free_after >= required_bytes {
            info!("Sufficient disk space has been freed");
            Ok(ReconcileOutcome::Freed {
                removed: selection.torrents,
                freed_estimate_bytes: selection.total_bytes,
                free_bytes: free_after,
            })
        } else {
            Err(ReconcileError::StillInsufficient {
                free_bytes: free_after,
                required_bytes,
            })
        }
    }
}

/// Read free space at `path` and log it against `required_bytes`.
pub fn check_free_space(
    disk_usage: &dyn DiskUsage,
    path: &Path,
    required_bytes: u64,
) -> Result<u64, DiskUsageError> {
    let free = disk_usage.free_bytes(path)?;
    info!(
        "Path: '{}' | Required: {:.2} GiB | Available: {:.2} GiB",
        path.display(),
        bytes_to_gib(required_bytes),
        bytes_to_gib(free)
    );
    Ok(free)
}
