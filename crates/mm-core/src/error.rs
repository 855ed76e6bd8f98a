use std::fmt;

use crate::source::Source;

/// Rejects an entire `correlate` call before any processing happens.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Window size must be finite and > 0.
    InvalidWindow(f64),
    /// Slide step must be finite and > 0.
    InvalidSlide(f64),
    /// Slide step must not exceed the window size.
    SlideExceedsWindow { slide: f64, window: f64 },
    /// Minimum score must be finite and >= 0.
    InvalidMinScore(f64),
    /// Pair weights must be finite and >= 0.
    InvalidPairWeight { pair: String, weight: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidWindow(w) => {
                write!(f, "window size must be finite and positive, got {w}")
            }
            ConfigError::InvalidSlide(s) => {
                write!(f, "slide step must be finite and positive, got {s}")
            }
            ConfigError::SlideExceedsWindow { slide, window } => {
                write!(f, "slide step ({slide}) exceeds window size ({window})")
            }
            ConfigError::InvalidMinScore(s) => {
                write!(f, "minimum score must be finite and non-negative, got {s}")
            }
            ConfigError::InvalidPairWeight { pair, weight } => {
                write!(f, "pair weight for {pair} must be finite and non-negative, got {weight}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Rejects a single raw record. The stream continues; the engine counts
/// these per source and reports them alongside the results.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    /// Timestamps must be finite and >= 0.
    NegativeTimestamp { source: Source, timestamp: f64 },
    /// NaN/infinite timestamp.
    NonFiniteTimestamp { source: Source },
    /// NaN/infinite magnitude (out-of-range finite magnitudes are clamped,
    /// not rejected).
    NonFiniteMagnitude { source: Source },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::NegativeTimestamp { source, timestamp } => {
                write!(f, "{source} record has negative timestamp {timestamp}")
            }
            RecordError::NonFiniteTimestamp { source } => {
                write!(f, "{source} record has non-finite timestamp")
            }
            RecordError::NonFiniteMagnitude { source } => {
                write!(f, "{source} record has non-finite magnitude")
            }
        }
    }
}

impl std::error::Error for RecordError {}
