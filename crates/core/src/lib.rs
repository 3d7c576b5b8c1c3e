pub mod config;
pub mod disk;
pub mod reconcile;
pub mod selection;
pub mod testing;
pub mod torrent_client;

pub use config::{
    load_config, load_config_from_str, load_document, validate_config, CleanupConfig, Config,
    ConfigDocument, ConfigError, QBittorrentConfig,
};
pub use disk::{DiskUsage, DiskUsageError, Fs2DiskUsage};
pub use reconcile::{
    check_free_space, ReconcileError, ReconcileOutcome, ReconcilePhase, SpaceReconciler,
};
pub use selection::{
    bytes_to_gib, select_for_cleanup, RankingStrategy, SeedingEfficiency, Selection,
    SmallestFirst, StrategyKind, TorrentFilterBuilder, TorrentPredicate, GIB,
};
pub use torrent_client::{
    parse_tags, QBittorrentClient, TorrentClient, TorrentClientError, TorrentRecord, TorrentState,
};
