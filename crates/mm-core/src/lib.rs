//! Moment Miner correlation engine.
//!
//! Ingests timestamped event streams from four independent sources
//! (visual scene changes, speech sentiment, comment sentiment, engagement
//! spikes), aggregates them over sliding windows, scores cross-source
//! co-occurrence with per-source base-rate normalization, and greedily
//! selects a ranked set of non-overlapping "moments".
//!
//! Zero I/O — pure math engine with no opinions about transport or
//! persistence.

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod event;
pub mod rank;
pub mod score;
pub mod source;
pub mod timeline;
pub mod window;

pub use config::{CorrelateConfig, PairWeights};
pub use constants::{
    DEFAULT_MAX_MOMENTS, DEFAULT_MIN_SCORE, DEFAULT_SLIDE_SECS, DEFAULT_WINDOW_SECS, EPSILON,
};
pub use engine::{
    CorrelationReport, SkippedCounts, SourceStreams, build_timelines, correlate,
    correlate_timelines,
};
pub use error::{ConfigError, RecordError};
pub use event::{Event, RawRecord, normalize_record, normalize_stream};
pub use rank::{Moment, rank_moments};
pub use score::{ScoredWindow, global_means, score_windows};
pub use source::{SOURCE_COUNT, Source, SourcePair};
pub use timeline::{Timeline, TimelineSet};
pub use window::{AggregateWindow, Decay, Windows};
