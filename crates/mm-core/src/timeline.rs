//! Per-source timeline index: events sorted by timestamp, with binary-search
//! range queries. Writes happen during the ingestion phase only; after
//! `finalize` the index is read-only and safe to share across threads.

use crate::event::Event;
use crate::source::{SOURCE_COUNT, Source};

/// Ordered sequence of one source's events.
///
/// Invariant after `finalize`: timestamps are non-decreasing, ties keep
/// insertion order (stable sort).
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    events: Vec<Event>,
    finalized: bool,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Order is restored by `finalize`.
    pub fn insert(&mut self, event: Event) {
        self.events.push(event);
        self.finalized = false;
    }

    /// Sort events by timestamp (stable — ties keep insertion order).
    pub fn finalize(&mut self) {
        self.events
            .sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events of this timeline, ascending by timestamp once finalized.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Largest timestamp, or None when empty. Requires a finalized timeline.
    pub fn max_timestamp(&self) -> Option<f64> {
        debug_assert!(self.finalized || self.events.is_empty());
        self.events.last().map(|e| e.timestamp)
    }

    /// Events with timestamp in [start, end), ascending.
    /// O(log n + k) via binary search on the sorted vector.
    pub fn range_query(&self, start: f64, end: f64) -> &[Event] {
        debug_assert!(self.finalized || self.events.is_empty());
        if end <= start {
            return &[];
        }
        let lo = self.events.partition_point(|e| e.timestamp < start);
        let hi = self.events.partition_point(|e| e.timestamp < end);
        &self.events[lo..hi]
    }
}

/// The four source timelines plus ingestion bookkeeping.
///
/// Single writer during ingestion; the aggregator only reads after
/// `finalize` (the synchronization barrier between the phases).
#[derive(Clone, Debug, Default)]
pub struct TimelineSet {
    timelines: [Timeline; SOURCE_COUNT],
    skipped: [usize; SOURCE_COUNT],
}

impl TimelineSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, event: Event) {
        self.timelines[event.source.index()].insert(event);
    }

    /// Record skipped (rejected) raw records for a source.
    pub fn add_skipped(&mut self, source: Source, count: usize) {
        self.skipped[source.index()] += count;
    }

    /// Install an already-normalized stream wholesale. Used by callers
    /// that normalize sources on parallel tasks.
    pub fn install(&mut self, source: Source, events: Vec<Event>, skipped: usize) {
        let timeline = &mut self.timelines[source.index()];
        for event in events {
            debug_assert_eq!(event.source, source);
            timeline.insert(event);
        }
        self.skipped[source.index()] += skipped;
    }

    /// Sort every timeline. Must run before any range query.
    pub fn finalize(&mut self) {
        for timeline in &mut self.timelines {
            timeline.finalize();
        }
    }

    pub fn timeline(&self, source: Source) -> &Timeline {
        &self.timelines[source.index()]
    }

    pub fn skipped(&self, source: Source) -> usize {
        self.skipped[source.index()]
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.iter().sum()
    }

    /// Total events across all sources.
    pub fn len(&self) -> usize {
        self.timelines.iter().map(Timeline::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.iter().all(Timeline::is_empty)
    }

    /// Largest timestamp across all sources, or None when all are empty.
    pub fn max_timestamp(&self) -> Option<f64> {
        self.timelines
            .iter()
            .filter_map(Timeline::max_timestamp)
            .fold(None, |acc, t| Some(acc.map_or(t, |a: f64| a.max(t))))
    }
}
