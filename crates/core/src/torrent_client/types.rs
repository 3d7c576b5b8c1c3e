//! Types for torrent client operations.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Lifecycle state of a torrent, as reported by qBittorrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TorrentState {
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "missingFiles")]
    MissingFiles,
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "pausedUP")]
    PausedUp,
    #[serde(rename = "stoppedUP")]
    StoppedUp,
    #[serde(rename = "queuedUP")]
    QueuedUp,
    #[serde(rename = "stalledUP")]
    StalledUp,
    #[serde(rename = "checkingUP")]
    CheckingUp,
    #[serde(rename = "forcedUP")]
    ForcedUp,
    #[serde(rename = "allocating")]
    Allocating,
    #[serde(rename = "downloading")]
    Downloading,
    #[serde(rename = "metaDL")]
    MetaDl,
    #[serde(rename = "forcedMetaDL")]
    ForcedMetaDl,
    #[serde(rename = "pausedDL")]
    PausedDl,
    #[serde(rename = "stoppedDL")]
    StoppedDl,
    #[serde(rename = "queuedDL")]
    QueuedDl,
    #[serde(rename = "stalledDL")]
    StalledDl,
    #[serde(rename = "checkingDL")]
    CheckingDl,
    #[serde(rename = "forcedDL")]
    ForcedDl,
    #[serde(rename = "checkingResumeData")]
    CheckingResumeData,
    #[serde(rename = "moving")]
    Moving,
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl TorrentState {
    /// Every state that means downloading is complete and the torrent is
    /// only seeding or idle.
    pub const FINISHED: [TorrentState; 7] = [
        TorrentState::Uploading,
        TorrentState::StalledUp,
        TorrentState::PausedUp,
        TorrentState::StoppedUp,
        TorrentState::QueuedUp,
        TorrentState::CheckingUp,
        TorrentState::ForcedUp,
    ];

    /// Parse the state string used by the qBittorrent Web API.
    ///
    /// Unrecognised strings map to [`TorrentState::Unknown`].
    pub fn from_api(state: &str) -> Self {
        match state {
            "error" => TorrentState::Error,
            "missingFiles" => TorrentState::MissingFiles,
            "uploading" => TorrentState::Uploading,
            "pausedUP" => TorrentState::PausedUp,
            "stoppedUP" => TorrentState::StoppedUp,
            "queuedUP" => TorrentState::QueuedUp,
            "stalledUP" => TorrentState::StalledUp,
            "checkingUP" => TorrentState::CheckingUp,
            "forcedUP" => TorrentState::ForcedUp,
            "allocating" => TorrentState::Allocating,
            "downloading" => TorrentState::Downloading,
            "metaDL" => TorrentState::MetaDl,
            "forcedMetaDL" => TorrentState::ForcedMetaDl,
            "pausedDL" => TorrentState::PausedDl,
            "stoppedDL" => TorrentState::StoppedDl,
            "queuedDL" => TorrentState::QueuedDl,
            "stalledDL" => TorrentState::StalledDl,
            "checkingDL" => TorrentState::CheckingDl,
            "forcedDL" => TorrentState::ForcedDl,
            "checkingResumeData" => TorrentState::CheckingResumeData,
            "moving" => TorrentState::Moving,
            _ => TorrentState::Unknown,
        }
    }

    /// Returns the qBittorrent API string for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentState::Error => "error",
            TorrentState::MissingFiles => "missingFiles",
            TorrentState::Uploading => "uploading",
            TorrentState::PausedUp => "pausedUP",
            TorrentState::StoppedUp => "stoppedUP",
            TorrentState::QueuedUp => "queuedUP",
            TorrentState::StalledUp => "stalledUP",
            TorrentState::CheckingUp => "checkingUP",
            TorrentState::ForcedUp => "forcedUP",
            TorrentState::Allocating => "allocating",
            TorrentState::Downloading => "downloading",
            TorrentState::MetaDl => "metaDL",
            TorrentState::ForcedMetaDl => "forcedMetaDL",
            TorrentState::PausedDl => "pausedDL",
            TorrentState::StoppedDl => "stoppedDL",
            TorrentState::QueuedDl => "queuedDL",
            TorrentState::StalledDl => "stalledDL",
            TorrentState::CheckingDl => "checkingDL",
            TorrentState::ForcedDl => "forcedDL",
            TorrentState::CheckingResumeData => "checkingResumeData",
            TorrentState::Moving => "moving",
            TorrentState::Unknown => "unknown",
        }
    }

    /// True for the finished (seeding or idle-after-completion) states.
    pub fn is_finished(&self) -> bool {
        Self::FINISHED.contains(self)
    }
}

impl std::fmt::Display for TorrentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot of one torrent, as listed by the client.
///
/// Records are read-only inputs to the selection engine. Fields the client
/// did not report are defaulted (empty tags, no trackers, zero size) instead
/// of failing the whole listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentRecord {
    /// Info hash, opaque to the selection engine.
    pub hash: String,
    /// Torrent name.
    pub name: String,
    /// Total size in bytes.
    pub size_bytes: u64,
    /// Current lifecycle state.
    pub state: TorrentState,
    /// Tags, trimmed and deduplicated. Case-sensitive.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Tracker announce URLs.
    #[serde(default)]
    pub trackers: Vec<String>,
    /// Share ratio (uploaded/downloaded).
    #[serde(default)]
    pub ratio: f64,
    /// Total time spent seeding, in seconds.
    #[serde(default)]
    pub seeding_time_secs: u64,
    /// When the torrent finished downloading, if it ever did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TorrentRecord {
    /// Create a record with the given identity and size and empty metadata.
    pub fn new(
        hash: impl Into<String>,
        name: impl Into<String>,
        size_bytes: u64,
        state: TorrentState,
    ) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
            size_bytes,
            state,
            tags: BTreeSet::new(),
            trackers: Vec::new(),
            ratio: 0.0,
            seeding_time_secs: 0,
            completed_at: None,
        }
    }

    /// Set tags from a comma-joined string.
    pub fn with_tags(mut self, raw: &str) -> Self {
        self.tags = parse_tags(raw);
        self
    }

    /// Add a tracker URL.
    pub fn with_tracker(mut self, url: impl Into<String>) -> Self {
        self.trackers.push(url.into());
        self
    }

    /// Set the share ratio.
    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    /// Set the seeding time in seconds.
    pub fn with_seeding_time(mut self, secs: u64) -> Self {
        self.seeding_time_secs = secs;
        self
    }

    /// Set the completion time.
    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }
}

/// Split a comma-joined tag string into a set of trimmed tags.
///
/// Empty segments are dropped, so `""` and `" , "` both yield an empty set.
pub fn parse_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trait for torrent client backends.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Establish and verify the session. Called once before any other operation.
    async fn connect(&self) -> Result<(), TorrentClientError>;

    /// List every torrent known to the client.
    async fn list_torrents(&self) -> Result<Vec<TorrentRecord>, TorrentClientError>;

    /// Remove a batch of torrents.
    /// If `delete_files` is true, also delete downloaded files.
    async fn delete_torrents(
        &self,
        hashes: &BTreeSet<String>,
        delete_files: bool,
    ) -> Result<(), TorrentClientError>;
}
