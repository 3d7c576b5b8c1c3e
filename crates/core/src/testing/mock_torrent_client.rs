//! Mock torrent client for testing.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::torrent_client::{TorrentClient, TorrentClientError, TorrentRecord};

/// A recorded delete request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedDelete {
    /// Hashes in the batch.
    pub hashes: BTreeSet<String>,
    /// Whether data deletion was requested.
    pub delete_files: bool,
    /// When the request was made.
    pub timestamp: chrono::DateTime<Utc>,
}

/// Mock implementation of the TorrentClient trait.
///
/// Provides controllable behavior for testing:
/// - Pre-populate the torrent list
/// - Track delete requests for assertions
/// - Simulate connection and delete failures
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTorrentClient::with_torrents(vec![fixtures::torrent("a", 10)]);
/// client.set_connect_error(TorrentClientError::ConnectionFailed("refused".into())).await;
///
/// // ... run the reconciler ...
///
/// assert!(client.deletes().await.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MockTorrentClient {
    torrents: Arc<RwLock<Vec<TorrentRecord>>>,
    deletes: Arc<RwLock<Vec<RecordedDelete>>>,
    /// If set, `connect` fails with this error.
    connect_error: Arc<RwLock<Option<TorrentClientError>>>,
    /// If set, the next `list_torrents` fails with this error.
    list_error: Arc<RwLock<Option<TorrentClientError>>>,
    /// If set, the next `delete_torrents` fails with this error.
    delete_error: Arc<RwLock<Option<TorrentClientError>>>,
    connects: AtomicUsize,
}

impl MockTorrentClient {
    /// Create a mock client with no torrents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock client holding the given torrents.
    pub fn with_torrents(torrents: Vec<TorrentRecord>) -> Self {
        Self {
            torrents: Arc::new(RwLock::new(torrents)),
            ..Self::default()
        }
    }

    /// Add a torrent to the list.
    pub async fn add_mock_torrent(&self, torrent: TorrentRecord) {
        self.torrents.write().await.push(torrent);
    }

    /// Current torrent list.
    pub async fn torrents(&self) -> Vec<TorrentRecord> {
        self.torrents.read().await.clone()
    }

    /// Get all recorded delete requests.
    pub async fn deletes(&self) -> Vec<RecordedDelete> {
        self.deletes.read().await.clone()
    }

    /// Configure `connect` to fail.
    pub async fn set_connect_error(&self, error: TorrentClientError) {
        *self.connect_error.write().await = Some(error);
    }

    /// Configure the next `list_torrents` to fail.
    pub async fn set_list_error(&self, error: TorrentClientError) {
        *self.list_error.write().await = Some(error);
    }

    /// Configure the next `delete_torrents` to fail.
    pub async fn set_delete_error(&self, error: TorrentClientError) {
        *self.delete_error.write().await = Some(error);
    }

    /// Number of `connect` calls made so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(&self) -> Result<(), TorrentClientError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.connect_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentRecord>, TorrentClientError> {
        if let Some(err) = self.list_error.write().await.take() {
            return Err(err);
        }
        Ok(self.torrents.read().await.clone())
    }

    async fn delete_torrents(
        &self,
        hashes: &BTreeSet<String>,
        delete_files: bool,
    ) -> Result<(), TorrentClientError> {
        self.deletes.write().await.push(RecordedDelete {
            hashes: hashes.clone(),
            delete_files,
            timestamp: Utc::now(),
        });

        if let Some(err) = self.delete_error.write().await.take() {
            return Err(err);
        }

        self.torrents
            .write()
            .await
            .retain(|t| !hashes.contains(&t.hash));
        Ok(())
    }
}
