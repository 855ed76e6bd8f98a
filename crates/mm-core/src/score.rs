//! Correlation scoring with per-source base-rate normalization.
//!
//! Raw aggregates are divided by the source's global mean aggregate across
//! all windows before pairwise multiplication. A chatty source (comments
//! arrive far more often than scene cuts) therefore cannot dominate the
//! score by volume alone, and new sources need no recalibration constants.

use serde::{Deserialize, Serialize};

use crate::config::PairWeights;
use crate::constants::EPSILON;
use crate::source::{SOURCE_COUNT, Source, SourcePair};
use crate::window::AggregateWindow;

/// A window plus its correlation score and contributing source set.
///
/// Invariant: `score >= 0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredWindow {
    pub start: f64,
    pub end: f64,
    /// Raw per-source aggregates, indexed by `Source::index()`.
    pub magnitudes: [f64; SOURCE_COUNT],
    pub score: f64,
    /// Sources with a non-zero aggregate in this window.
    pub contributing: Vec<Source>,
}

impl ScoredWindow {
    pub fn overlaps(&self, other: &ScoredWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Per-source mean aggregate across every window of the slide.
/// Zero-event sources get a zero mean and normalize to zero.
pub fn global_means(windows: &[AggregateWindow]) -> [f64; SOURCE_COUNT] {
    let mut means = [0.0; SOURCE_COUNT];
    if windows.is_empty() {
        return means;
    }
    for window in windows {
        for i in 0..SOURCE_COUNT {
            means[i] += window.magnitudes[i];
        }
    }
    for mean in &mut means {
        *mean /= windows.len() as f64;
    }
    means
}

fn normalized(raw: f64, mean: f64) -> f64 {
    if mean < EPSILON { 0.0 } else { raw / mean }
}

/// Score every window against the global means.
pub fn score_windows(windows: &[AggregateWindow], weights: &PairWeights) -> Vec<ScoredWindow> {
    let means = global_means(windows);

    windows
        .iter()
        .map(|window| score_window(window, &means, weights))
        .collect()
}

fn score_window(
    window: &AggregateWindow,
    means: &[f64; SOURCE_COUNT],
    weights: &PairWeights,
) -> ScoredWindow {
    let contributing: Vec<Source> = Source::ALL
        .into_iter()
        .filter(|s| window.magnitudes[s.index()] > EPSILON)
        .collect();

    let mut score = 0.0;
    for (i, a) in contributing.iter().enumerate() {
        for b in &contributing[i + 1..] {
            // Distinct sources by construction, so the pair always exists
            let Some(pair) = SourcePair::new(*a, *b) else {
                continue;
            };
            let norm_a = normalized(window.magnitudes[a.index()], means[a.index()]);
            let norm_b = normalized(window.magnitudes[b.index()], means[b.index()]);
            score += norm_a * norm_b * weights.get(pair);
        }
    }

    ScoredWindow {
        start: window.start,
        end: window.end,
        magnitudes: window.magnitudes,
        score,
        contributing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn window(start: f64, magnitudes: [f64; SOURCE_COUNT]) -> AggregateWindow {
        AggregateWindow {
            start,
            end: start + 10.0,
            magnitudes,
        }
    }

    #[test]
    fn test_empty_windows() {
        assert!(score_windows(&[], &PairWeights::default()).is_empty());
        assert_eq!(global_means(&[]), [0.0; SOURCE_COUNT]);
    }

    #[test]
    fn test_global_means() {
        let windows = vec![
            window(0.0, [1.0, 0.0, 2.0, 0.0]),
            window(5.0, [3.0, 0.0, 0.0, 0.0]),
        ];
        let means = global_means(&windows);
        assert_relative_eq!(means[0], 2.0);
        assert_relative_eq!(means[1], 0.0);
        assert_relative_eq!(means[2], 1.0);
    }

    #[test]
    fn test_single_source_scores_zero() {
        // No pair can form from one contributing source.
        let windows = vec![window(0.0, [0.9, 0.0, 0.0, 0.0])];
        let scored = score_windows(&windows, &PairWeights::default());
        assert_eq!(scored[0].score, 0.0);
        assert_eq!(scored[0].contributing, vec![Source::Visual]);
    }

    #[test]
    fn test_two_source_pair_score() {
        // One window only: means equal raw aggregates, so both normalize to 1.
        let windows = vec![window(0.0, [0.4, 0.0, 0.0, 0.8])];
        let scored = score_windows(&windows, &PairWeights::default());
        assert_relative_eq!(scored[0].score, 1.0);
        assert_eq!(
            scored[0].contributing,
            vec![Source::Visual, Source::Engagement]
        );
    }

    #[test]
    fn test_four_sources_six_pairs() {
        let windows = vec![window(0.0, [0.5, 0.5, 0.5, 0.5])];
        let scored = score_windows(&windows, &PairWeights::default());
        // All normalized magnitudes are 1, six pairs at weight 1
        assert_relative_eq!(scored[0].score, 6.0);
        assert_eq!(scored[0].contributing.len(), 4);
    }

    #[test]
    fn test_pair_weight_scales_contribution() {
        let mut weights = PairWeights::default();
        let pair = SourcePair::new(Source::Visual, Source::Engagement).unwrap();
        weights.set(pair, 3.0);

        let windows = vec![window(0.0, [0.4, 0.0, 0.0, 0.8])];
        let scored = score_windows(&windows, &weights);
        assert_relative_eq!(scored[0].score, 3.0);
    }

    #[test]
    fn test_base_rate_normalization() {
        // Comment fires in every window; visual fires in one. Without
        // normalization the comment-heavy window would dominate.
        let windows = vec![
            window(0.0, [0.0, 0.0, 1.0, 0.0]),
            window(5.0, [0.5, 0.0, 1.0, 0.0]),
            window(10.0, [0.0, 0.0, 1.0, 0.0]),
            window(15.0, [0.0, 0.0, 1.0, 0.0]),
        ];
        let scored = score_windows(&windows, &PairWeights::default());

        // Only the second window has a pair; its visual normalization is
        // 0.5 / 0.125 = 4, comment normalization is 1.0 / 1.0 = 1.
        assert_relative_eq!(scored[1].score, 4.0);
        assert_eq!(scored[0].score, 0.0);
    }

    #[test]
    fn test_scale_invariance() {
        let base = vec![
            window(0.0, [0.2, 0.1, 0.0, 0.3]),
            window(5.0, [0.4, 0.0, 0.6, 0.1]),
            window(10.0, [0.0, 0.5, 0.2, 0.0]),
        ];
        let scaled: Vec<AggregateWindow> = base
            .iter()
            .map(|w| {
                let mut m = w.magnitudes;
                m[Source::Comment.index()] *= 7.5; // uniform scale of one source
                AggregateWindow {
                    start: w.start,
                    end: w.end,
                    magnitudes: m,
                }
            })
            .collect();

        let scored_base = score_windows(&base, &PairWeights::default());
        let scored_scaled = score_windows(&scaled, &PairWeights::default());

        for (a, b) in scored_base.iter().zip(&scored_scaled) {
            assert_relative_eq!(a.score, b.score, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_scores_non_negative() {
        let windows = vec![
            window(0.0, [0.0, 0.0, 0.0, 0.0]),
            window(5.0, [1.0, 1.0, 1.0, 1.0]),
        ];
        for scored in score_windows(&windows, &PairWeights::default()) {
            assert!(scored.score >= 0.0);
        }
    }
}
