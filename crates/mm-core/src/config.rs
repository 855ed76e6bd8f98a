use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_MOMENTS, DEFAULT_MIN_SCORE, DEFAULT_PAIR_WEIGHT, DEFAULT_SLIDE_SECS,
    DEFAULT_WINDOW_SECS,
};
use crate::error::ConfigError;
use crate::source::{SOURCE_COUNT, Source, SourcePair};
use crate::window::Decay;

/// Weights for the six unordered source pairs.
///
/// Serialized as a map like `{"visual:engagement": 1.5}` — omitted pairs
/// keep the default weight of 1.0. Self-pairs are rejected at parse time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, f64>",
    into = "BTreeMap<String, f64>"
)]
pub struct PairWeights {
    weights: [f64; PAIR_COUNT],
}

pub const PAIR_COUNT: usize = SOURCE_COUNT * (SOURCE_COUNT - 1) / 2;

fn pair_slot(pair: SourcePair) -> usize {
    let i = pair.first().index();
    let j = pair.second().index();
    // Canonical pair (i < j) → row-major position in the strict upper triangle
    i * SOURCE_COUNT - i * (i + 1) / 2 + (j - i - 1)
}

impl Default for PairWeights {
    fn default() -> Self {
        Self {
            weights: [DEFAULT_PAIR_WEIGHT; PAIR_COUNT],
        }
    }
}

impl PairWeights {
    pub fn get(&self, pair: SourcePair) -> f64 {
        self.weights[pair_slot(pair)]
    }

    pub fn set(&mut self, pair: SourcePair, weight: f64) {
        self.weights[pair_slot(pair)] = weight;
    }

    /// Fails on non-finite or negative weights, naming the offending pair.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pair in SourcePair::all() {
            let weight = self.get(pair);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidPairWeight {
                    pair: pair.to_string(),
                    weight,
                });
            }
        }
        Ok(())
    }
}

fn parse_pair_key(key: &str) -> Result<SourcePair, String> {
    let (left, right) = key
        .split_once(':')
        .ok_or_else(|| format!("pair key '{key}' must be 'source:source'"))?;
    let a = Source::parse(left).ok_or_else(|| format!("unknown source '{left}'"))?;
    let b = Source::parse(right).ok_or_else(|| format!("unknown source '{right}'"))?;
    SourcePair::new(a, b).ok_or_else(|| format!("source '{left}' cannot pair with itself"))
}

impl TryFrom<BTreeMap<String, f64>> for PairWeights {
    type Error = String;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, String> {
        let mut weights = PairWeights::default();
        for (key, weight) in map {
            let pair = parse_pair_key(&key)?;
            weights.set(pair, weight);
        }
        Ok(weights)
    }
}

impl From<PairWeights> for BTreeMap<String, f64> {
    fn from(weights: PairWeights) -> Self {
        SourcePair::all()
            .into_iter()
            .filter(|p| weights.get(*p) != DEFAULT_PAIR_WEIGHT)
            .map(|p| (format!("{}:{}", p.first(), p.second()), weights.get(p)))
            .collect()
    }
}

/// Tunables for a correlation run. All fields optional in serialized form;
/// defaults match the engine's documented behavior.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelateConfig {
    /// Aggregation window size W, seconds.
    pub window_secs: f64,
    /// Slide step S, seconds. Must satisfy 0 < S <= W.
    pub slide_secs: f64,
    /// Magnitude falloff from window center.
    pub decay: Decay,
    /// Per-pair score weights.
    pub pair_weights: PairWeights,
    /// Cap on selected moments. Zero is legal and yields no moments.
    pub max_moments: usize,
    /// Windows scoring at or below this never become moments.
    pub min_score: f64,
}

impl Default for CorrelateConfig {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            slide_secs: DEFAULT_SLIDE_SECS,
            decay: Decay::None,
            pair_weights: PairWeights::default(),
            max_moments: DEFAULT_MAX_MOMENTS,
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

impl CorrelateConfig {
    /// Reject bad configurations before any processing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.window_secs.is_finite() || self.window_secs <= 0.0 {
            return Err(ConfigError::InvalidWindow(self.window_secs));
        }
        if !self.slide_secs.is_finite() || self.slide_secs <= 0.0 {
            return Err(ConfigError::InvalidSlide(self.slide_secs));
        }
        if self.slide_secs > self.window_secs {
            return Err(ConfigError::SlideExceedsWindow {
                slide: self.slide_secs,
                window: self.window_secs,
            });
        }
        if !self.min_score.is_finite() || self.min_score < 0.0 {
            return Err(ConfigError::InvalidMinScore(self.min_score));
        }
        self.pair_weights.validate()
    }
}
