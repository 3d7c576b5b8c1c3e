//! Greedy, size-bounded selection of torrents to remove.

use std::collections::BTreeSet;

use crate::torrent_client::TorrentRecord;

use super::strategy::RankingStrategy;

/// Torrents chosen for removal, in strategy order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub torrents: Vec<TorrentRecord>,
    /// Sum of the selected torrents' sizes.
    pub total_bytes: u64,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.torrents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.torrents.len()
    }

    /// Info hashes of the selected torrents.
    pub fn hashes(&self) -> BTreeSet<String> {
        self.torrents.iter().map(|t| t.hash.clone()).collect()
    }
}

/// Choose torrents to free at least `space_to_free_bytes`.
///
/// Returns an empty selection when all candidates together are smaller than
/// the target; removing a subset would destroy data without reaching it.
/// Otherwise candidates are taken in strategy order until the running total
/// reaches the target, so the result is always a prefix of the ranking. This
/// is a first-fit approximation: it does not minimise the number of torrents
/// or the overshoot.
pub fn select_for_cleanup<S>(
    candidates: &[TorrentRecord],
    space_to_free_bytes: u64,
    strategy: &S,
) -> Selection
where
    S: RankingStrategy + ?Sized,
{
    let available = total_size(candidates);
    if available < space_to_free_bytes {
        return Selection::default();
    }

    let mut selection = Selection::default();
    for torrent in strategy.rank(candidates) {
        if selection.total_bytes >= space_to_free_bytes {
            break;
        }
        selection.total_bytes = selection.total_bytes.saturating_add(torrent.size_bytes);
        selection.torrents.push(torrent);
    }
    selection
}

/// Total size of a set of torrents.
pub fn total_size(torrents: &[TorrentRecord]) -> u64 {
    torrents
        .iter()
        .fold(0u64, |acc, t| acc.saturating_add(t.size_bytes))
}
