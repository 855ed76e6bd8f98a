//! Greedy non-overlapping moment selection.
//!
//! Interval-scheduling style: highest score first, skip anything that
//! overlaps an earlier pick. Not globally optimal by total score — a DP
//! weighted-interval-scheduling pass could beat it — but the simple greedy
//! is predictable and fast, which is the tradeoff this engine wants.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;
use crate::score::ScoredWindow;
use crate::source::{SOURCE_COUNT, Source};

/// A selected high-correlation time window — the engine's final output unit.
///
/// Invariant: no two moments in a result set overlap in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Moment {
    pub start: f64,
    pub end: f64,
    pub score: f64,
    pub contributing: Vec<Source>,
    /// Raw per-source aggregates carried along for reporting.
    pub magnitudes: [f64; SOURCE_COUNT],
}

impl Moment {
    pub fn overlaps(&self, other: &Moment) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl From<ScoredWindow> for Moment {
    fn from(w: ScoredWindow) -> Self {
        Moment {
            start: w.start,
            end: w.end,
            score: w.score,
            contributing: w.contributing,
            magnitudes: w.magnitudes,
        }
    }
}

/// Score descending, ties broken by earlier start time.
fn by_score_desc(a: &ScoredWindow, b: &ScoredWindow) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal))
}

/// Select up to `max_moments` non-overlapping moments scoring strictly
/// above `min_score`. Output is ordered by score descending, ties by
/// earlier start.
pub fn rank_moments(
    mut candidates: Vec<ScoredWindow>,
    max_moments: usize,
    min_score: f64,
) -> Vec<Moment> {
    let threshold = min_score.max(EPSILON);
    candidates.retain(|w| w.score > threshold);
    candidates.sort_by(by_score_desc);

    let mut selected: Vec<Moment> = Vec::new();
    for candidate in candidates {
        if selected.len() >= max_moments {
            break;
        }
        let moment = Moment::from(candidate);
        if selected.iter().all(|m| !m.overlaps(&moment)) {
            selected.push(moment);
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(start: f64, end: f64, score: f64) -> ScoredWindow {
        ScoredWindow {
            start,
            end,
            magnitudes: [0.0; SOURCE_COUNT],
            score,
            contributing: vec![Source::Visual, Source::Speech],
        }
    }

    #[test]
    fn test_empty_candidates() {
        assert!(rank_moments(Vec::new(), 20, 0.0).is_empty());
    }

    #[test]
    fn test_sorted_by_score_desc() {
        let candidates = vec![
            scored(0.0, 10.0, 1.0),
            scored(20.0, 30.0, 3.0),
            scored(40.0, 50.0, 2.0),
        ];
        let moments = rank_moments(candidates, 20, 0.0);
        let scores: Vec<f64> = moments.iter().map(|m| m.score).collect();
        assert_eq!(scores, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_overlap_resolved_highest_first() {
        // Overlapping pair: the higher-scoring window wins, the other drops.
        let candidates = vec![
            scored(0.0, 10.0, 2.0),
            scored(5.0, 15.0, 5.0),
            scored(20.0, 30.0, 1.0),
        ];
        let moments = rank_moments(candidates, 20, 0.0);
        assert_eq!(moments.len(), 2);
        assert_eq!(moments[0].start, 5.0);
        assert_eq!(moments[1].start, 20.0);
        for (i, a) in moments.iter().enumerate() {
            for b in &moments[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn test_tie_broken_by_earlier_start() {
        let candidates = vec![scored(30.0, 40.0, 2.0), scored(0.0, 10.0, 2.0)];
        let moments = rank_moments(candidates, 20, 0.0);
        assert_eq!(moments[0].start, 0.0);
        assert_eq!(moments[1].start, 30.0);
    }

    #[test]
    fn test_max_moments_cap() {
        let candidates = (0..10)
            .map(|i| scored(i as f64 * 20.0, i as f64 * 20.0 + 10.0, 1.0 + i as f64))
            .collect();
        let moments = rank_moments(candidates, 3, 0.0);
        assert_eq!(moments.len(), 3);
    }

    #[test]
    fn test_zero_max_moments() {
        let candidates = vec![scored(0.0, 10.0, 5.0)];
        assert!(rank_moments(candidates, 0, 0.0).is_empty());
    }

    #[test]
    fn test_min_score_filters() {
        let candidates = vec![
            scored(0.0, 10.0, 0.5),
            scored(20.0, 30.0, 1.5),
            scored(40.0, 50.0, 2.5),
        ];
        let moments = rank_moments(candidates, 20, 1.0);
        assert_eq!(moments.len(), 2);
        assert!(moments.iter().all(|m| m.score > 1.0));
    }

    #[test]
    fn test_zero_score_windows_never_selected() {
        // Default min_score of 0 still means "strictly above zero".
        let candidates = vec![scored(0.0, 10.0, 0.0), scored(20.0, 30.0, 0.0)];
        assert!(rank_moments(candidates, 20, 0.0).is_empty());
    }

    #[test]
    fn test_touching_moments_allowed() {
        // end == start is adjacency, not overlap
        let candidates = vec![scored(0.0, 10.0, 2.0), scored(10.0, 20.0, 1.0)];
        let moments = rank_moments(candidates, 20, 0.0);
        assert_eq!(moments.len(), 2);
    }
}
