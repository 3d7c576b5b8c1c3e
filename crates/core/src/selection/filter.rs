//! Composable torrent filters.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::torrent_client::{TorrentRecord, TorrentState};

/// A single boolean test over a torrent record.
///
/// All comparisons are strict; a bound equal to the record's value does not
/// match.
#[derive(Debug, Clone, PartialEq)]
pub enum TorrentPredicate {
    /// State is one of the given states.
    StateIn(BTreeSet<TorrentState>),
    /// Any tracker URL contains the substring.
    TrackerContains(String),
    /// No tracker URL contains the substring.
    TrackerNotContaining(String),
    /// No tracker URL is exactly one of the given URLs.
    TrackerNotIn(BTreeSet<String>),
    /// Tag set intersects the given tags.
    TagsAny(BTreeSet<String>),
    /// Tag set is disjoint from the given tags.
    TagsNone(BTreeSet<String>),
    SizeGreaterThan(u64),
    SizeLessThan(u64),
    /// Completed strictly before the instant. Never-completed torrents do not match.
    CompletedBefore(DateTime<Utc>),
    /// Completed strictly after the instant. Never-completed torrents do not match.
    CompletedAfter(DateTime<Utc>),
    RatioGreaterThan(f64),
    SeedingTimeGreaterThan(u64),
    SeedingTimeLessThan(u64),
}

impl TorrentPredicate {
    /// Evaluate the predicate against a record.
    pub fn matches(&self, torrent: &TorrentRecord) -> bool {
        match self {
            TorrentPredicate::StateIn(states) => states.contains(&torrent.state),
            TorrentPredicate::TrackerContains(needle) => torrent
                .trackers
                .iter()
                .any(|url| url.contains(needle.as_str())),
            TorrentPredicate::TrackerNotContaining(needle) => torrent
                .trackers
                .iter()
                .all(|url| !url.contains(needle.as_str())),
            TorrentPredicate::TrackerNotIn(urls) => {
                torrent.trackers.iter().all(|url| !urls.contains(url))
            }
            TorrentPredicate::TagsAny(tags) => !torrent.tags.is_disjoint(tags),
            TorrentPredicate::TagsNone(tags) => torrent.tags.is_disjoint(tags),
            TorrentPredicate::SizeGreaterThan(bytes) => torrent.size_bytes > *bytes,
            TorrentPredicate::SizeLessThan(bytes) => torrent.size_bytes < *bytes,
            TorrentPredicate::CompletedBefore(at) => {
                torrent.completed_at.is_some_and(|done| done < *at)
            }
            TorrentPredicate::CompletedAfter(at) => {
                torrent.completed_at.is_some_and(|done| done > *at)
            }
            TorrentPredicate::RatioGreaterThan(ratio) => torrent.ratio > *ratio,
            TorrentPredicate::SeedingTimeGreaterThan(secs) => torrent.seeding_time_secs > *secs,
            TorrentPredicate::SeedingTimeLessThan(secs) => torrent.seeding_time_secs < *secs,
        }
    }
}

/// Builds a conjunction of predicates over a borrowed torrent list.
///
/// ```rust,ignore
/// let candidates = TorrentFilterBuilder::new(&torrents)
///     .with_states(TorrentState::FINISHED)
///     .seeding_time_greater_than(3 * 86_400)
///     .without_tags(["permaseed", "keep"])
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TorrentFilterBuilder<'a> {
    torrents: &'a [TorrentRecord],
    predicates: Vec<TorrentPredicate>,
}

impl<'a> TorrentFilterBuilder<'a> {
    /// Start a pipeline with no predicates.
    pub fn new(torrents: &'a [TorrentRecord]) -> Self {
        Self {
            torrents,
            predicates: Vec::new(),
        }
    }

    /// Append an arbitrary predicate.
    pub fn with_predicate(mut self, predicate: TorrentPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn with_states(self, states: impl IntoIterator<Item = TorrentState>) -> Self {
        self.with_predicate(TorrentPredicate::StateIn(states.into_iter().collect()))
    }

    /// Keep only torrents in a finished state.
    pub fn with_finished_states(self) -> Self {
        self.with_states(TorrentState::FINISHED)
    }

    pub fn with_tracker_containing(self, needle: impl Into<String>) -> Self {
        self.with_predicate(TorrentPredicate::TrackerContains(needle.into()))
    }

    pub fn without_tracker_containing(self, needle: impl Into<String>) -> Self {
        self.with_predicate(TorrentPredicate::TrackerNotContaining(needle.into()))
    }

    /// Drop torrents announcing to any of the exact tracker URLs.
    pub fn without_trackers<I, S>(self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_predicate(TorrentPredicate::TrackerNotIn(
            urls.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn with_tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_predicate(TorrentPredicate::TagsAny(
            tags.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn without_tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_predicate(TorrentPredicate::TagsNone(
            tags.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn size_greater_than(self, bytes: u64) -> Self {
        self.with_predicate(TorrentPredicate::SizeGreaterThan(bytes))
    }

    pub fn size_less_than(self, bytes: u64) -> Self {
        self.with_predicate(TorrentPredicate::SizeLessThan(bytes))
    }

    pub fn completed_before(self, at: DateTime<Utc>) -> Self {
        self.with_predicate(TorrentPredicate::CompletedBefore(at))
    }

    pub fn completed_after(self, at: DateTime<Utc>) -> Self {
        self.with_predicate(TorrentPredicate::CompletedAfter(at))
    }

    pub fn ratio_greater_than(self, ratio: f64) -> Self {
        self.with_predicate(TorrentPredicate::RatioGreaterThan(ratio))
    }

    pub fn seeding_time_greater_than(self, secs: u64) -> Self {
        self.with_predicate(TorrentPredicate::SeedingTimeGreaterThan(secs))
    }

    pub fn seeding_time_less_than(self, secs: u64) -> Self {
        self.with_predicate(TorrentPredicate::SeedingTimeLessThan(secs))
    }

    pub fn predicates(&self) -> &[TorrentPredicate] {
        &self.predicates
    }

    /// True if every predicate accepts the torrent.
    pub fn matches(&self, torrent: &TorrentRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(torrent))
    }

    /// Return the torrents accepted by every predicate, in input order.
    ///
    /// The input is never modified, so repeated calls give the same result.
    pub fn build(&self) -> Vec<TorrentRecord> {
        self.torrents
            .iter()
            .filter(|t| self.matches(t))
            .cloned()
            .collect()
    }
}
