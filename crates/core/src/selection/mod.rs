//! Torrent selection engine.
//!
//! A filter pipeline narrows the client's torrents down to removal
//! candidates, a ranking strategy orders them, and the selector takes the
//! shortest prefix of that order that frees the requested number of bytes.

mod filter;
mod select;
mod strategy;

pub use filter::{TorrentFilterBuilder, TorrentPredicate};
pub use select::{select_for_cleanup, total_size, Selection};
pub use strategy::{
    seeding_efficiency_score, RankingStrategy, SeedingEfficiency, SmallestFirst, StrategyKind,
};

/// Bytes per GiB.
pub const GIB: u64 = 1024 * 1024 * 1024;

/// Seconds per day.
pub const SECS_PER_DAY: u64 = 86_400;

/// Convert a byte count to GiB for display.
pub fn bytes_to_gib(bytes: u64) -> f64 {
    bytes as f64 / GIB as f64
}
