/// Default aggregation window size in seconds.
pub const DEFAULT_WINDOW_SECS: f64 = 10.0;

/// Default slide step in seconds.
pub const DEFAULT_SLIDE_SECS: f64 = 5.0;

/// Default cap on the number of selected moments.
pub const DEFAULT_MAX_MOMENTS: usize = 20;

/// Default minimum correlation score for a window to become a moment.
pub const DEFAULT_MIN_SCORE: f64 = 0.0;

/// Default pair weight when none is configured for a source pair.
pub const DEFAULT_PAIR_WEIGHT: f64 = 1.0;

/// Numerical epsilon for near-zero comparisons.
pub const EPSILON: f64 = 1e-10;
