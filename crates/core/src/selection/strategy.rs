//! Ranking strategies that decide removal priority.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::torrent_client::TorrentRecord;

use super::{GIB, SECS_PER_DAY};

/// Orders removal candidates; earlier entries are removed first.
///
/// Implementations must not rely on tie order being stable.
pub trait RankingStrategy: Send + Sync {
    /// Strategy name for logging.
    fn name(&self) -> &str;

    /// Return the candidates in removal order.
    fn rank(&self, candidates: &[TorrentRecord]) -> Vec<TorrentRecord>;
}

/// Any ordering function can be used as a strategy.
impl<F> RankingStrategy for F
where
    F: Fn(&[TorrentRecord]) -> Vec<TorrentRecord> + Send + Sync,
{
    fn name(&self) -> &str {
        "custom"
    }

    fn rank(&self, candidates: &[TorrentRecord]) -> Vec<TorrentRecord> {
        self(candidates)
    }
}

/// Ascending by size. Ties are left in unspecified order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmallestFirst;

impl RankingStrategy for SmallestFirst {
    fn name(&self) -> &str {
        "smallest_first"
    }

    fn rank(&self, candidates: &[TorrentRecord]) -> Vec<TorrentRecord> {
        let mut ranked = candidates.to_vec();
        ranked.sort_unstable_by_key(|t| t.size_bytes);
        ranked
    }
}

/// Descending by days seeded per GiB stored, so torrents that have seeded
/// longest relative to the space they occupy go first.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedingEfficiency;

/// Seeding days divided by size in GiB. Zero-sized torrents score 0.
pub fn seeding_efficiency_score(torrent: &TorrentRecord) -> f64 {
    if torrent.size_bytes == 0 {
        return 0.0;
    }
    let days = torrent.seeding_time_secs as f64 / SECS_PER_DAY as f64;
    let gib = torrent.size_bytes as f64 / GIB as f64;
    days / gib
}

impl RankingStrategy for SeedingEfficiency {
    fn name(&self) -> &str {
        "seeding_efficiency"
    }

    fn rank(&self, candidates: &[TorrentRecord]) -> Vec<TorrentRecord> {
        let mut scored: Vec<(f64, TorrentRecord)> = candidates
            .iter()
            .map(|t| (seeding_efficiency_score(t), t.clone()))
            .collect();
        scored.sort_unstable_by(|(a, _), (b, _)| b.total_cmp(a));
        scored.into_iter().map(|(_, t)| t).collect()
    }
}

/// The built-in strategies, selectable from configuration or the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    SmallestFirst,
    SeedingEfficiency,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::SmallestFirst => "smallest_first",
            StrategyKind::SeedingEfficiency => "seeding_efficiency",
        }
    }

    /// The strategy implementation for this kind.
    pub fn strategy(&self) -> &'static dyn RankingStrategy {
        match self {
            StrategyKind::SmallestFirst => &SmallestFirst,
            StrategyKind::SeedingEfficiency => &SeedingEfficiency,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "smallest_first" => Ok(StrategyKind::SmallestFirst),
            "seeding_efficiency" => Ok(StrategyKind::SeedingEfficiency),
            other => Err(format!(
                "unknown strategy '{}' (expected smallest-first or seeding-efficiency)",
                other
            )),
        }
    }
}
