use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of signal sources. Fixed: the engine correlates exactly these four.
pub const SOURCE_COUNT: usize = 4;

/// One of the four independent signal-producing collaborators.
///
/// Each source hands the engine timestamped records; the engine never
/// looks inside them beyond `{timestamp, magnitude, label}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Scene-change events from the frame-diff detector.
    Visual,
    /// Sentiment events from the transcription + sentiment step.
    Speech,
    /// Sentiment events from the comment-sentiment step.
    Comment,
    /// Spikes from the engagement-metrics extractor.
    Engagement,
}

impl Source {
    pub const ALL: [Source; SOURCE_COUNT] = [
        Source::Visual,
        Source::Speech,
        Source::Comment,
        Source::Engagement,
    ];

    /// Stable index into per-source arrays.
    pub fn index(self) -> usize {
        match self {
            Source::Visual => 0,
            Source::Speech => 1,
            Source::Comment => 2,
            Source::Engagement => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Source::Visual => "visual",
            Source::Speech => "speech",
            Source::Comment => "comment",
            Source::Engagement => "engagement",
        }
    }

    pub fn parse(s: &str) -> Option<Source> {
        match s {
            "visual" => Some(Source::Visual),
            "speech" => Some(Source::Speech),
            "comment" => Some(Source::Comment),
            "engagement" => Some(Source::Engagement),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unordered pair of *distinct* sources, held in canonical index order.
///
/// A source cannot pair with itself — self-pairs are undefined in the
/// scoring model, so the constructor rejects them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePair {
    a: Source,
    b: Source,
}

impl SourcePair {
    /// Build a canonical pair. Returns `None` for self-pairs.
    pub fn new(a: Source, b: Source) -> Option<SourcePair> {
        if a == b {
            return None;
        }
        if a.index() < b.index() {
            Some(SourcePair { a, b })
        } else {
            Some(SourcePair { a: b, b: a })
        }
    }

    pub fn first(self) -> Source {
        self.a
    }

    pub fn second(self) -> Source {
        self.b
    }

    /// All six unordered pairs of distinct sources, in canonical order.
    pub fn all() -> Vec<SourcePair> {
        let mut pairs = Vec::with_capacity(6);
        for i in 0..SOURCE_COUNT {
            for j in (i + 1)..SOURCE_COUNT {
                pairs.push(SourcePair {
                    a: Source::ALL[i],
                    b: Source::ALL[j],
                });
            }
        }
        pairs
    }
}

impl fmt::Display for SourcePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.a, self.b)
    }
}
