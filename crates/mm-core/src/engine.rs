//! The engine entry point: normalize → index → aggregate → score → rank.

use serde::{Deserialize, Serialize};

use crate::config::CorrelateConfig;
use crate::error::ConfigError;
use crate::event::{RawRecord, normalize_stream};
use crate::rank::{Moment, rank_moments};
use crate::score::score_windows;
use crate::source::Source;
use crate::timeline::TimelineSet;
use crate::window::Windows;

/// The four raw input streams. Each field defaults to empty so partial
/// JSON documents parse.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceStreams {
    pub visual: Vec<RawRecord>,
    pub speech: Vec<RawRecord>,
    pub comment: Vec<RawRecord>,
    pub engagement: Vec<RawRecord>,
}

impl SourceStreams {
    pub fn records(&self, source: Source) -> &[RawRecord] {
        match source {
            Source::Visual => &self.visual,
            Source::Speech => &self.speech,
            Source::Comment => &self.comment,
            Source::Engagement => &self.engagement,
        }
    }

    pub fn is_empty(&self) -> bool {
        Source::ALL.iter().all(|s| self.records(*s).is_empty())
    }
}

/// Rejected-record counts, one per source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCounts {
    pub visual: usize,
    pub speech: usize,
    pub comment: usize,
    pub engagement: usize,
}

impl SkippedCounts {
    pub fn from_timelines(timelines: &TimelineSet) -> Self {
        Self {
            visual: timelines.skipped(Source::Visual),
            speech: timelines.skipped(Source::Speech),
            comment: timelines.skipped(Source::Comment),
            engagement: timelines.skipped(Source::Engagement),
        }
    }

    pub fn total(&self) -> usize {
        self.visual + self.speech + self.comment + self.engagement
    }
}

/// Everything a correlation run produces: the ranked moments plus
/// bookkeeping the caller reports or persists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorrelationReport {
    /// Non-overlapping, score-descending.
    pub moments: Vec<Moment>,
    pub skipped: SkippedCounts,
    pub windows_scanned: usize,
    pub events_indexed: usize,
}

/// Normalize all four streams and build a finalized timeline set.
///
/// Sequential convenience path; callers that want the four sources
/// normalized on parallel tasks can `normalize_stream` per source and
/// `TimelineSet::install` the results themselves.
pub fn build_timelines(streams: &SourceStreams) -> TimelineSet {
    let mut timelines = TimelineSet::new();
    for source in Source::ALL {
        let (events, skipped) = normalize_stream(source, streams.records(source));
        timelines.install(source, events, skipped);
    }
    timelines.finalize();
    timelines
}

/// Run the full pipeline on raw streams.
///
/// Config problems fail the whole call before any processing. Invalid
/// records are skipped and counted, never fatal. All-empty input is a
/// valid (if uninteresting) run: empty moments, no error.
pub fn correlate(
    streams: &SourceStreams,
    config: &CorrelateConfig,
) -> Result<CorrelationReport, ConfigError> {
    config.validate()?;
    let timelines = build_timelines(streams);
    correlate_timelines(&timelines, config)
}

/// Run aggregation, scoring and ranking over an already-finalized
/// timeline set. This is the synchronization barrier for callers that
/// built the four timelines concurrently.
pub fn correlate_timelines(
    timelines: &TimelineSet,
    config: &CorrelateConfig,
) -> Result<CorrelationReport, ConfigError> {
    config.validate()?;

    let windows: Vec<_> =
        Windows::new(timelines, config.window_secs, config.slide_secs, config.decay).collect();
    let scored = score_windows(&windows, &config.pair_weights);
    let moments = rank_moments(scored, config.max_moments, config.min_score);

    Ok(CorrelationReport {
        moments,
        skipped: SkippedCounts::from_timelines(timelines),
        windows_scanned: windows.len(),
        events_indexed: timelines.len(),
    })
}
