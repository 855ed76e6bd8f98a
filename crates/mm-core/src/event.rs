use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::source::Source;

/// A raw per-source record as supplied by an external collaborator
/// (frame-diff detector, transcription+sentiment step, comment-sentiment
/// step, engagement extractor). Unvalidated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawRecord {
    /// Seconds from the start of the video.
    pub timestamp: f64,
    /// Signal strength. Expected in [0,1]; finite out-of-range values
    /// are clamped during normalization.
    pub magnitude: f64,
    /// Opaque upstream label, e.g. a sentiment class or change description.
    #[serde(default)]
    pub label: String,
}

/// A validated, normalized event. Immutable once created; owned by the
/// timeline index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub source: Source,
    pub timestamp: f64,
    /// Always in [0,1] after normalization.
    pub magnitude: f64,
    pub label: String,
}

/// Validate and normalize a single raw record.
///
/// Negative or non-finite timestamps and non-finite magnitudes reject the
/// record. Finite out-of-range magnitudes are clamped to [0,1].
pub fn normalize_record(source: Source, record: &RawRecord) -> Result<Event, RecordError> {
    if !record.timestamp.is_finite() {
        return Err(RecordError::NonFiniteTimestamp { source });
    }
    if record.timestamp < 0.0 {
        return Err(RecordError::NegativeTimestamp {
            source,
            timestamp: record.timestamp,
        });
    }
    if !record.magnitude.is_finite() {
        return Err(RecordError::NonFiniteMagnitude { source });
    }

    Ok(Event {
        source,
        timestamp: record.timestamp,
        magnitude: record.magnitude.clamp(0.0, 1.0),
        label: record.label.clone(),
    })
}

/// Normalize a whole stream. Invalid records are skipped and counted;
/// valid events come back in input order.
pub fn normalize_stream(source: Source, records: &[RawRecord]) -> (Vec<Event>, usize) {
    let mut events = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for record in records {
        match normalize_record(source, record) {
            Ok(event) => events.push(event),
            Err(_) => skipped += 1,
        }
    }

    (events, skipped)
}
