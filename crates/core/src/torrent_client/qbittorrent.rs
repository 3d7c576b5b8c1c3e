//! qBittorrent torrent client implementation.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::QBittorrentConfig;

use super::{parse_tags, TorrentClient, TorrentClientError, TorrentRecord, TorrentState};

/// qBittorrent Web API client.
///
/// The session cookie from login is kept in the HTTP client's cookie jar.
/// An expired or rejected session is reported as an error, not retried.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    base_url: String,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client. No request is made until [`connect`](TorrentClient::connect).
    pub fn new(config: QBittorrentConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| TorrentClientError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            config,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Login and store the session cookie.
    async fn login(&self, username: &str) -> Result<(), TorrentClientError> {
        let params = [
            ("username", username),
            ("password", self.config.pass.as_deref().unwrap_or_default()),
        ];

        let response = self
            .client
            .post(self.url("/api/v2/auth/login"))
            .form(&params)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            Ok(())
        } else if body.contains("Fails.") || status.as_u16() == 403 {
            Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(TorrentClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    /// Make a GET request within the current session.
    async fn get(&self, endpoint: &str) -> Result<String, TorrentClientError> {
        let response = self
            .client
            .get(self.url(endpoint))
            .send()
            .await
            .map_err(map_send_error)?;
        read_body(response).await
    }

    /// Make a POST request with form data within the current session.
    async fn post_form(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<String, TorrentClientError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .form(params)
            .send()
            .await
            .map_err(map_send_error)?;
        read_body(response).await
    }

    /// Fetch every tracker URL of one torrent, without DHT/PeX/LSD pseudo-entries.
    async fn fetch_trackers(&self, hash: &str) -> Result<Vec<String>, TorrentClientError> {
        let endpoint = format!(
            "/api/v2/torrents/trackers?hash={}",
            urlencoding::encode(hash)
        );
        let response = self.get(&endpoint).await?;
        let trackers: Vec<QBTracker> = serde_json::from_str(&response)
            .map_err(|e| TorrentClientError::ApiError(format!("Failed to parse trackers: {}", e)))?;
        Ok(real_tracker_urls(trackers))
    }
}

fn map_send_error(e: reqwest::Error) -> TorrentClientError {
    if e.is_timeout() {
        TorrentClientError::Timeout
    } else if e.is_connect() {
        TorrentClientError::ConnectionFailed(e.to_string())
    } else {
        TorrentClientError::ApiError(e.to_string())
    }
}

async fn read_body(response: Response) -> Result<String, TorrentClientError> {
    let status = response.status();
    if status.as_u16() == 403 {
        return Err(TorrentClientError::AuthenticationFailed(
            "session rejected (HTTP 403)".to_string(),
        ));
    }
    if !status.is_success() {
        return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
    }
    response
        .text()
        .await
        .map_err(|e| TorrentClientError::ApiError(e.to_string()))
}

/// qBittorrent torrent info response. Every field but the hash is optional
/// so that one incomplete record cannot fail the whole listing.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    tags: Option<String>,
    #[serde(default)]
    tracker: Option<String>,
    #[serde(default)]
    ratio: f64,
    #[serde(default)]
    seeding_time: i64,
    #[serde(default)]
    completion_on: i64,
}

impl QBTorrentInfo {
    /// The currently active tracker, if any.
    fn current_tracker(&self) -> Vec<String> {
        self.tracker
            .iter()
            .filter(|url| !url.is_empty())
            .cloned()
            .collect()
    }

    fn into_record(self, trackers: Vec<String>) -> TorrentRecord {
        TorrentRecord {
            hash: self.hash,
            name: self.name,
            size_bytes: self.size.max(0) as u64,
            state: TorrentState::from_api(&self.state),
            tags: parse_tags(self.tags.as_deref().unwrap_or_default()),
            trackers,
            ratio: self.ratio.max(0.0),
            seeding_time_secs: self.seeding_time.max(0) as u64,
            completed_at: timestamp_to_datetime(self.completion_on),
        }
    }
}

/// qBittorrent tracker list entry.
#[derive(Debug, Deserialize)]
struct QBTracker {
    url: String,
}

fn real_tracker_urls(trackers: Vec<QBTracker>) -> Vec<String> {
    trackers
        .into_iter()
        .map(|t| t.url)
        .filter(|url| !url.is_empty() && !url.starts_with("** "))
        .collect()
}

/// Convert Unix timestamp to DateTime<Utc>.
fn timestamp_to_datetime(ts: i64) -> Option<DateTime<Utc>> {
    if ts > 0 {
        Utc.timestamp_opt(ts, 0).single()
    } else {
        None
    }
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn connect(&self) -> Result<(), TorrentClientError> {
        match self.config.user.as_deref() {
            Some(user) => self.login(user).await?,
            None => debug!("No qBittorrent user configured, skipping login"),
        }

        let version = self.get("/api/v2/app/version").await?;
        info!("Connected to qBittorrent {} at {}", version.trim(), self.base_url);
        Ok(())
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentRecord>, TorrentClientError> {
        let response = self.get("/api/v2/torrents/info").await?;
        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&response)
            .map_err(|e| TorrentClientError::ApiError(format!("Failed to parse response: {}", e)))?;

        let mut records = Vec::with_capacity(torrents.len());
        for torrent in torrents {
            let trackers = if self.config.fetch_trackers {
                match self.fetch_trackers(&torrent.hash).await {
                    Ok(urls) => urls,
                    Err(e) => {
                        warn!(
                            "Failed to fetch trackers for {}, using current tracker only: {}",
                            torrent.hash, e
                        );
                        torrent.current_tracker()
                    }
                }
            } else {
                torrent.current_tracker()
            };
            records.push(torrent.into_record(trackers));
        }

        debug!("Listed {} torrents", records.len());
        Ok(records)
    }

    async fn delete_torrents(
        &self,
        hashes: &BTreeSet<String>,
        delete_files: bool,
    ) -> Result<(), TorrentClientError> {
        if hashes.is_empty() {
            return Ok(());
        }

        let joined = hashes.iter().map(String::as_str).collect::<Vec<_>>().join("|");
        let delete_str = if delete_files { "true" } else { "false" };

        self.post_form(
            "/api/v2/torrents/delete",
            &[("hashes", &joined), ("deleteFiles", delete_str)],
        )
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_timestamp_to_datetime() {
        let dt = timestamp_to_datetime(1703980800);
        assert!(dt.is_some());
        assert_eq!(dt.unwrap().year(), 2023);

        assert!(timestamp_to_datetime(-1).is_none());
        assert!(timestamp_to_datetime(0).is_none());
    }

    #[test]
    fn test_qb_torrent_info_conversion() {
        let json = r#"{
            "hash": "abc123",
            "name": "Test Torrent",
            "state": "stalledUP",
            "size": 1000000,
            "tags": "permaseed, music",
            "tracker": "https://tracker.example/announce",
            "ratio": 1.25,
            "seeding_time": 86400,
            "completion_on": 1703980800,
            "dlspeed": 0
        }"#;
        let info: QBTorrentInfo = serde_json::from_str(json).unwrap();
        let trackers = info.current_tracker();
        let record = info.into_record(trackers);

        assert_eq!(record.hash, "abc123");
        assert_eq!(record.name, "Test Torrent");
        assert_eq!(record.state, TorrentState::StalledUp);
        assert_eq!(record.size_bytes, 1000000);
        assert!(record.tags.contains("permaseed"));
        assert!(record.tags.contains("music"));
        assert_eq!(record.trackers, vec!["https://tracker.example/announce"]);
        assert_eq!(record.seeding_time_secs, 86400);
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn test_qb_torrent_info_missing_fields_are_defaulted() {
        let info: QBTorrentInfo = serde_json::from_str(r#"{"hash": "def"}"#).unwrap();
        let trackers = info.current_tracker();
        let record = info.into_record(trackers);

        assert_eq!(record.size_bytes, 0);
        assert_eq!(record.state, TorrentState::Unknown);
        assert!(record.tags.is_empty());
        assert!(record.trackers.is_empty());
        assert!(record.completed_at.is_none());
    }

    #[test]
    fn test_null_tags_and_negative_values() {
        let json = r#"{"hash": "x", "tags": null, "tracker": "", "size": -5, "seeding_time": -1}"#;
        let info: QBTorrentInfo = serde_json::from_str(json).unwrap();
        assert!(info.current_tracker().is_empty());
        let record = info.into_record(Vec::new());
        assert!(record.tags.is_empty());
        assert_eq!(record.size_bytes, 0);
        assert_eq!(record.seeding_time_secs, 0);
    }

    #[test]
    fn test_real_tracker_urls_drops_pseudo_entries() {
        let json = r#"[
            {"url": "** [DHT] **", "status": 2},
            {"url": "** [PeX] **", "status": 2},
            {"url": "** [LSD] **", "status": 2},
            {"url": "https://private.example/announce/key", "status": 2},
            {"url": "udp://open.example:1337", "status": 4}
        ]"#;
        let trackers: Vec<QBTracker> = serde_json::from_str(json).unwrap();
        assert_eq!(
            real_tracker_urls(trackers),
            vec!["https://private.example/announce/key", "udp://open.example:1337"]
        );
    }

    #[test]
    fn test_client_uses_configured_base_url() {
        let config = QBittorrentConfig {
            host: "nas.local".to_string(),
            port: 9091,
            ..Default::default()
        };
        let client = QBittorrentClient::new(config).unwrap();
        assert_eq!(client.name(), "qbittorrent");
        assert_eq!(
            client.url("/api/v2/app/version"),
            "http://nas.local:9091/api/v2/app/version"
        );
    }
}
