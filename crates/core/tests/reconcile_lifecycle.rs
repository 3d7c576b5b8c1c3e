//! Reconciliation lifecycle integration tests.
//!
//! These tests drive a full pass through the reconciler with mock
//! collaborators:
//! initial check -> connect -> list -> filter -> select -> delete -> recheck

use std::path::Path;
use std::sync::Arc;

use spacewarden_core::{
    testing::{fixtures, MockDiskUsage, MockTorrentClient},
    CleanupConfig, ReconcileError, ReconcileOutcome, ReconcilePhase, SpaceReconciler,
    StrategyKind, TorrentClientError, TorrentState, GIB,
};

/// Test helper holding the mocks so assertions can inspect them after a run.
struct TestHarness {
    torrent_client: Arc<MockTorrentClient>,
    disk: Arc<MockDiskUsage>,
    config: CleanupConfig,
}

impl TestHarness {
    fn new(torrents: Vec<spacewarden_core::TorrentRecord>, readings: &[u64]) -> Self {
        Self {
            torrent_client: Arc::new(MockTorrentClient::with_torrents(torrents)),
            disk: Arc::new(MockDiskUsage::with_readings(readings.iter().copied())),
            config: CleanupConfig {
                post_delete_wait_secs: 0,
                ..Default::default()
            },
        }
    }

    fn reconciler(&self) -> SpaceReconciler {
        SpaceReconciler::new(
            self.config.clone(),
            self.torrent_client.clone(),
            self.disk.clone(),
        )
    }

    async fn run(&self, required_gib: u64) -> Result<ReconcileOutcome, ReconcileError> {
        self.reconciler()
            .run(Path::new("/downloads"), required_gib * GIB)
            .await
    }
}

#[tokio::test]
async fn test_sufficient_space_touches_nothing() {
    let harness = TestHarness::new(vec![fixtures::torrent("a", 10)], &[150 * GIB]);

    let outcome = harness.run(100).await.unwrap();

    assert_eq!(
        outcome,
        ReconcileOutcome::AlreadySufficient {
            free_bytes: 150 * GIB
        }
    );
    assert_eq!(harness.torrent_client.connect_count(), 0);
    assert!(harness.torrent_client.deletes().await.is_empty());
    assert_eq!(harness.disk.query_count(), 1);
}

#[tokio::test]
async fn test_exact_deficit_removes_all_candidates() {
    let torrents = vec![
        fixtures::torrent("a", 10),
        fixtures::torrent("b", 20),
        fixtures::torrent("c", 30),
    ];
    let harness = TestHarness::new(torrents, &[40 * GIB, 100 * GIB]);

    let outcome = harness.run(100).await.unwrap();

    match outcome {
        ReconcileOutcome::Freed {
            removed,
            freed_estimate_bytes,
            free_bytes,
        } => {
            let order: Vec<_> = removed.iter().map(|t| t.hash.as_str()).collect();
            assert_eq!(order, vec!["a", "b", "c"]);
            assert_eq!(freed_estimate_bytes, 60 * GIB);
            assert_eq!(free_bytes, 100 * GIB);
        }
        other => panic!("Expected Freed, got {:?}", other),
    }

    let deletes = harness.torrent_client.deletes().await;
    assert_eq!(deletes.len(), 1);
    assert!(deletes[0].delete_files);
    assert_eq!(deletes[0].hashes.len(), 3);
    assert!(harness.torrent_client.torrents().await.is_empty());
}

#[tokio::test]
async fn test_one_gib_short_fails_without_deleting() {
    let torrents = vec![
        fixtures::torrent("a", 10),
        fixtures::torrent("b", 20),
        fixtures::torrent("c", 29),
    ];
    let harness = TestHarness::new(torrents, &[40 * GIB]);

    let err = harness.run(100).await.unwrap_err();

    match err {
        ReconcileError::InsufficientSelectableSpace {
            available_bytes,
            deficit_bytes,
        } => {
            assert_eq!(available_bytes, 59 * GIB);
            assert_eq!(deficit_bytes, 60 * GIB);
        }
        other => panic!("Expected InsufficientSelectableSpace, got {:?}", other),
    }
    assert!(harness.torrent_client.deletes().await.is_empty());
    assert_eq!(harness.torrent_client.torrents().await.len(), 3);
}

#[tokio::test]
async fn test_smallest_first_removes_only_what_is_needed() {
    let torrents = [2, 4, 1, 8, 3]
        .into_iter()
        .map(|g| fixtures::torrent(&format!("t{}", g), g))
        .collect();
    // 4.5 GiB free, 10 GiB required: deficit 5.5 GiB
    let harness = TestHarness::new(torrents, &[9 * GIB / 2, 11 * GIB]);

    let outcome = harness.run(10).await.unwrap();

    let deletes = harness.torrent_client.deletes().await;
    assert_eq!(deletes.len(), 1);
    let expected: Vec<String> = vec!["t1".into(), "t2".into(), "t3".into()];
    assert_eq!(deletes[0].hashes.iter().cloned().collect::<Vec<_>>(), expected);
    assert_eq!(outcome.free_bytes(), 11 * GIB);
    assert_eq!(harness.torrent_client.torrents().await.len(), 2);
}

#[tokio::test]
async fn test_filter_criteria_protect_torrents() {
    let torrents = vec![
        fixtures::torrent("permaseeded", 50).with_tags("permaseed"),
        fixtures::torrent("kept", 50).with_tags("music, keep"),
        fixtures::torrent("fresh", 50).with_seeding_time(3600),
        fixtures::torrent_in_state("downloading", 50, TorrentState::Downloading),
        fixtures::torrent("removable", 5).with_tags("music"),
    ];
    let harness = TestHarness::new(torrents, &[95 * GIB, 100 * GIB]);

    harness.run(100).await.unwrap();

    let deletes = harness.torrent_client.deletes().await;
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].hashes.len(), 1);
    assert!(deletes[0].hashes.contains("removable"));
}

#[tokio::test]
async fn test_seeding_efficiency_strategy() {
    let torrents = vec![
        fixtures::torrent("big-young", 40).with_seeding_time(4 * 86_400), // 0.1
        fixtures::torrent("small-old", 10).with_seeding_time(50 * 86_400), // 5
        fixtures::torrent("mid", 20).with_seeding_time(20 * 86_400),      // 1
    ];
    let mut harness = TestHarness::new(torrents, &[70 * GIB, 100 * GIB]);
    harness.config.strategy = StrategyKind::SeedingEfficiency;

    let outcome = harness.run(100).await.unwrap();

    match outcome {
        ReconcileOutcome::Freed { removed, .. } => {
            let order: Vec<_> = removed.iter().map(|t| t.hash.as_str()).collect();
            assert_eq!(order, vec!["small-old", "mid"]);
        }
        other => panic!("Expected Freed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_path_is_environment_error() {
    let harness = TestHarness {
        torrent_client: Arc::new(MockTorrentClient::new()),
        disk: Arc::new(MockDiskUsage::missing_path()),
        config: CleanupConfig::default(),
    };

    let err = harness.run(100).await.unwrap_err();

    assert!(matches!(err, ReconcileError::DiskUsage(_)));
    assert!(err.is_environment());
    assert_eq!(harness.torrent_client.connect_count(), 0);
}

#[tokio::test]
async fn test_disk_failure_on_recheck_reports_recheck_phase() {
    let mut harness = TestHarness::new(vec![fixtures::torrent("a", 100)], &[10 * GIB]);
    harness.disk = Arc::new(MockDiskUsage::new(10 * GIB).failing_after(1));

    let err = harness.run(100).await.unwrap_err();

    assert!(matches!(err, ReconcileError::RecheckDiskUsage(_)));
    assert_eq!(err.phase(), ReconcilePhase::Recheck);
    assert!(err.is_environment());
    assert_eq!(harness.torrent_client.deletes().await.len(), 1);
    assert_eq!(harness.disk.query_count(), 2);
}

#[tokio::test]
async fn test_free_space_starts_from_given_reading() {
    let harness = TestHarness::new(vec![fixtures::torrent("a", 100)], &[150 * GIB]);

    let outcome = harness
        .reconciler()
        .free_space(Path::new("/downloads"), 100 * GIB, 10 * GIB)
        .await
        .unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Freed { .. }));
    assert_eq!(harness.torrent_client.connect_count(), 1);
    // Only the recheck queries the disk.
    assert_eq!(harness.disk.query_count(), 1);
}

#[tokio::test]
async fn test_connection_failure_is_fatal() {
    let harness = TestHarness::new(vec![fixtures::torrent("a", 100)], &[10 * GIB]);
    harness
        .torrent_client
        .set_connect_error(TorrentClientError::ConnectionFailed(
            "connection refused".to_string(),
        ))
        .await;

    let err = harness.run(100).await.unwrap_err();

    assert!(matches!(err, ReconcileError::Connect(_)));
    assert_eq!(err.phase(), ReconcilePhase::DeficitComputed);
    assert_eq!(harness.torrent_client.connect_count(), 1);
    assert!(harness.torrent_client.deletes().await.is_empty());
}

#[tokio::test]
async fn test_list_failure_is_fatal() {
    let harness = TestHarness::new(vec![fixtures::torrent("a", 100)], &[10 * GIB]);
    harness
        .torrent_client
        .set_list_error(TorrentClientError::ApiError("HTTP 500".to_string()))
        .await;

    let err = harness.run(100).await.unwrap_err();

    assert!(matches!(err, ReconcileError::ListTorrents(_)));
    assert!(err.is_environment());
}

#[tokio::test]
async fn test_no_torrents() {
    let harness = TestHarness::new(Vec::new(), &[10 * GIB]);

    let err = harness.run(100).await.unwrap_err();

    assert!(matches!(err, ReconcileError::NoTorrents));
    assert!(!err.is_environment());
}

#[tokio::test]
async fn test_no_eligible_torrents() {
    let torrents = vec![
        fixtures::torrent("kept", 100).with_tags("keep"),
        fixtures::torrent_in_state("dl", 100, TorrentState::Downloading),
    ];
    let harness = TestHarness::new(torrents, &[10 * GIB]);

    let err = harness.run(100).await.unwrap_err();

    match err {
        ReconcileError::NoEligibleTorrents { total } => assert_eq!(total, 2),
        other => panic!("Expected NoEligibleTorrents, got {:?}", other),
    }
    assert!(harness.torrent_client.deletes().await.is_empty());
}

#[tokio::test]
async fn test_space_still_short_after_cleanup() {
    let harness = TestHarness::new(vec![fixtures::torrent("a", 80)], &[40 * GIB, 90 * GIB]);

    let err = harness.run(100).await.unwrap_err();

    match err {
        ReconcileError::StillInsufficient {
            free_bytes,
            required_bytes,
        } => {
            assert_eq!(free_bytes, 90 * GIB);
            assert_eq!(required_bytes, 100 * GIB);
        }
        other => panic!("Expected StillInsufficient, got {:?}", other),
    }
    assert_eq!(harness.torrent_client.deletes().await.len(), 1);
    assert_eq!(harness.disk.query_count(), 2);
}

#[tokio::test]
async fn test_failed_delete_request_still_rechecks() {
    let harness = TestHarness::new(vec![fixtures::torrent("a", 80)], &[40 * GIB, 40 * GIB]);
    harness
        .torrent_client
        .set_delete_error(TorrentClientError::Timeout)
        .await;

    let err = harness.run(100).await.unwrap_err();

    assert!(matches!(err, ReconcileError::StillInsufficient { .. }));
    assert_eq!(harness.disk.query_count(), 2);
}

#[tokio::test]
async fn test_keep_data_when_configured() {
    let mut harness = TestHarness::new(vec![fixtures::torrent("a", 80)], &[40 * GIB, 100 * GIB]);
    harness.config.delete_files = false;

    harness.run(100).await.unwrap();

    let deletes = harness.torrent_client.deletes().await;
    assert_eq!(deletes.len(), 1);
    assert!(!deletes[0].delete_files);
}
