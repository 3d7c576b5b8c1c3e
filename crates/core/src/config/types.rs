use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::selection::StrategyKind;
use crate::torrent_client::TorrentState;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub qbittorrent: QBittorrentConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

/// qBittorrent Web API connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Host name or base URL (e.g., "localhost" or "https://seedbox.example").
    /// A port given here wins over `port`.
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Web UI user. When unset no login is attempted.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub pass: Option<String>,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Fetch the full tracker list of every torrent instead of only the
    /// currently active tracker.
    #[serde(default = "default_true")]
    pub fetch_trackers: bool,
}

impl QBittorrentConfig {
    /// Base URL of the Web API, without trailing slash.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        let (scheme, rest) = host.split_once("://").unwrap_or(("http", host));
        let (authority, path) = rest.split_at(rest.find('/').unwrap_or(rest.len()));
        if authority_has_port(authority) {
            format!("{}://{}{}", scheme, authority, path)
        } else {
            format!("{}://{}:{}{}", scheme, authority, self.port, path)
        }
    }
}

/// `nas:8080` and `[::1]:8080` carry a port; `nas` and `[::1]` do not.
fn authority_has_port(authority: &str) -> bool {
    match authority.rsplit_once(':') {
        Some((host, port)) => {
            !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && (!host.contains(':') || host.ends_with(']'))
        }
        None => false,
    }
}

impl Default for QBittorrentConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: None,
            pass: None,
            timeout_secs: default_timeout(),
            fetch_trackers: true,
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

/// Which torrents may be removed, and how
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    /// States considered finished and therefore eligible
    #[serde(default = "default_states")]
    pub states: BTreeSet<TorrentState>,
    /// Minimum seeding time before a torrent is eligible (default: 3 days)
    #[serde(default = "default_min_seeding_time")]
    pub min_seeding_time_secs: u64,
    /// Torrents carrying any of these tags are never removed
    #[serde(default = "default_exclude_tags")]
    pub exclude_tags: Vec<String>,
    /// Torrents announcing to any of these exact tracker URLs are never removed
    #[serde(default)]
    pub exclude_trackers: Vec<String>,
    /// Torrents with a tracker URL containing any of these substrings are never removed
    #[serde(default)]
    pub exclude_trackers_containing: Vec<String>,
    /// Removal priority
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Pause between the delete request and the final free-space check
    #[serde(default = "default_post_delete_wait")]
    pub post_delete_wait_secs: u64,
    /// Delete downloaded data together with the torrent
    #[serde(default = "default_true")]
    pub delete_files: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            states: default_states(),
            min_seeding_time_secs: default_min_seeding_time(),
            exclude_tags: default_exclude_tags(),
            exclude_trackers: Vec::new(),
            exclude_trackers_containing: Vec::new(),
            strategy: StrategyKind::default(),
            post_delete_wait_secs: default_post_delete_wait(),
            delete_files: true,
        }
    }
}

fn default_states() -> BTreeSet<TorrentState> {
    TorrentState::FINISHED.into_iter().collect()
}

fn default_min_seeding_time() -> u64 {
    3 * 24 * 60 * 60
}

fn default_exclude_tags() -> Vec<String> {
    vec!["permaseed".to_string(), "keep".to_string()]
}

fn default_post_delete_wait() -> u64 {
    10
}
