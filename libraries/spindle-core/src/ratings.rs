//! Album rating summary
//!
//! `ratingsQuantity` and `ratingsAverage` are stored on the album for fast
//! reads. They are always derived from a full scan of the album's current
//! reviews (see `spindle_storage::ratings`), never patched with deltas.

use serde::{Deserialize, Serialize};

/// Average shown for albums nobody has reviewed yet
pub const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;

/// Raw group-and-average result over an album's reviews
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingStats {
    pub count: i64,
    /// `None` when `count == 0`
    pub mean: Option<f64>,
}

impl RatingStats {
    pub fn from_ratings(ratings: &[u8]) -> Self {
        if ratings.is_empty() {
            return Self::default();
        }
        let sum: f64 = ratings.iter().map(|&r| f64::from(r)).sum();
        Self {
            count: ratings.len() as i64,
            mean: Some(sum / ratings.len() as f64),
        }
    }
}

/// The denormalized pair written back onto an album
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub ratings_quantity: i64,
    pub ratings_average: f64,
}

impl RatingSummary {
    /// Summary of an album without reviews
    pub const EMPTY: Self = Self {
        ratings_quantity: 0,
        ratings_average: DEFAULT_RATINGS_AVERAGE,
    };

    pub fn from_stats(stats: RatingStats) -> Self {
        match stats.mean {
            Some(mean) if stats.count > 0 => Self {
                ratings_quantity: stats.count,
                ratings_average: round_to_tenth(mean),
            },
            _ => Self::EMPTY,
        }
    }

    /// Tolerant comparison; stored averages round-trip through `REAL`
    pub fn matches(&self, other: &Self) -> bool {
        self.ratings_quantity == other.ratings_quantity
            && (self.ratings_average - other.ratings_average).abs() < 1e-9
    }
}

impl Default for RatingSummary {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Half-away-from-zero rounding to one decimal, same as `SQLite`'s `ROUND(x, 1)`
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
