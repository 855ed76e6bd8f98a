//! Sliding-window aggregation over the combined timeline.
//!
//! Windows are produced lazily by an iterator that is a pure function of
//! the timeline set and the window geometry — restartable, finite, and
//! free of shared mutable state. Each window holds the per-source sum of
//! event magnitudes within [start, start + W), optionally decayed by
//! distance from the window center.

use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;
use crate::source::{SOURCE_COUNT, Source};
use crate::timeline::TimelineSet;

/// How an event's magnitude contribution falls off with distance from the
/// window center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decay {
    /// Every event in the window contributes its full magnitude.
    #[default]
    None,
    /// Linear falloff: weight 1 at the center, 0 at the window edges.
    Triangular,
    /// Gaussian falloff with sigma = half the window width.
    Gaussian,
}

impl Decay {
    /// Weight for an event at `distance` seconds from the window center,
    /// where `half_width` is W/2. Always in [0,1].
    pub fn weight(self, distance: f64, half_width: f64) -> f64 {
        if half_width < EPSILON {
            return 1.0;
        }
        match self {
            Decay::None => 1.0,
            Decay::Triangular => (1.0 - distance / half_width).max(0.0),
            Decay::Gaussian => {
                let z = distance / half_width;
                (-0.5 * z * z).exp()
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Decay::None => "none",
            Decay::Triangular => "triangular",
            Decay::Gaussian => "gaussian",
        }
    }

    pub fn parse(s: &str) -> Option<Decay> {
        match s {
            "none" => Some(Decay::None),
            "triangular" => Some(Decay::Triangular),
            "gaussian" => Some(Decay::Gaussian),
            _ => None,
        }
    }
}

/// One window of the slide, with per-source aggregate magnitudes.
/// Transient: created by the aggregator, consumed by the scorer.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateWindow {
    pub start: f64,
    pub end: f64,
    /// Indexed by `Source::index()`.
    pub magnitudes: [f64; SOURCE_COUNT],
}

impl AggregateWindow {
    pub fn magnitude(&self, source: Source) -> f64 {
        self.magnitudes[source.index()]
    }

    pub fn overlaps(&self, other: &AggregateWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Lazy window sequence covering [0, max_timestamp + W) in steps of S.
pub struct Windows<'a> {
    timelines: &'a TimelineSet,
    window_secs: f64,
    slide_secs: f64,
    decay: Decay,
    next_start: f64,
    limit: f64,
}

impl<'a> Windows<'a> {
    /// Callers must pass validated geometry (0 < S <= W); the config layer
    /// enforces this before the engine gets here.
    pub fn new(timelines: &'a TimelineSet, window_secs: f64, slide_secs: f64, decay: Decay) -> Self {
        // Empty input produces an empty sequence.
        let limit = timelines
            .max_timestamp()
            .map(|t| t + window_secs)
            .unwrap_or(0.0);
        Self {
            timelines,
            window_secs,
            slide_secs,
            decay,
            next_start: 0.0,
            limit,
        }
    }

    fn aggregate(&self, start: f64) -> AggregateWindow {
        let end = start + self.window_secs;
        let center = start + self.window_secs / 2.0;
        let half_width = self.window_secs / 2.0;

        let mut magnitudes = [0.0; SOURCE_COUNT];
        for source in Source::ALL {
            let mut sum = 0.0;
            for event in self.timelines.timeline(source).range_query(start, end) {
                let distance = (event.timestamp - center).abs();
                sum += event.magnitude * self.decay.weight(distance, half_width);
            }
            magnitudes[source.index()] = sum;
        }

        AggregateWindow {
            start,
            end,
            magnitudes,
        }
    }
}

impl Iterator for Windows<'_> {
    type Item = AggregateWindow;

    fn next(&mut self) -> Option<AggregateWindow> {
        if self.next_start >= self.limit {
            return None;
        }
        let window = self.aggregate(self.next_start);
        self.next_start += self.slide_secs;
        Some(window)
    }
}
