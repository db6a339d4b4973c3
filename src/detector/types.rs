//! Extreme-move detection types
//!
//! Types for representing a statistically anomalous short-window price move
//! and every reason the detector can decline to fire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::market::Bar;

/// Direction of a detected extreme move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    /// Window return is positive
    Up,
    /// Window return is negative
    Down,
}

/// A confirmed extreme move
///
/// Emitted only when the z-score, volume anomaly and cooldown checks all
/// pass. The final bar of the evaluated window becomes the anchor bar for
/// the reference-price tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Always true for a fired detection; carried for downstream consumers
    pub is_extreme: bool,

    /// Window return divided by the sample std-dev of per-bar returns
    pub z_score: f64,

    /// Trailing window volume over the hour-of-day median
    pub volume_anomaly_ratio: f64,

    /// Direction of the move
    pub direction: MoveDirection,

    /// Simple return over the evaluation window
    pub return_over_window: f64,

    /// The bar that triggered the detection
    pub anchor_bar: Bar,

    /// When the detection fired
    pub detected_at: DateTime<Utc>,
}

impl DetectionResult {
    /// Check if the move is upward
    pub fn is_up(&self) -> bool {
        self.direction == MoveDirection::Up
    }

    /// Check if the move is downward
    pub fn is_down(&self) -> bool {
        self.direction == MoveDirection::Down
    }
}

/// Reason the detector declined to fire
///
/// Data insufficiency is never an error: each decline names exactly which
/// precondition failed so callers can log or ignore it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclineReason {
    /// Fewer bars than the configured evaluation window
    InsufficientHistory { have: usize, need: usize },
    /// Per-bar returns have zero variance; z is undefined
    ZeroVolatility,
    /// |z| below the configured threshold
    BelowZThreshold { z: f64, threshold: f64 },
    /// Not enough prior volume samples for this hour of day
    InsufficientVolumeHistory { have: usize, need: usize },
    /// Window volume did not exceed the anomaly threshold
    VolumeNotAnomalous { ratio: f64, threshold: f64 },
    /// A detection fired for this symbol within the cooldown period
    CooldownActive { remaining_secs: i64 },
}

/// Outcome of one detector invocation
#[derive(Debug, Clone)]
pub enum DetectionOutcome {
    /// All checks passed; an extreme move was detected
    Fired(DetectionResult),
    /// The detector declined, with the first failing precondition
    Declined(DeclineReason),
}

impl DetectionOutcome {
    /// The detection result if the detector fired
    pub fn fired(&self) -> Option<&DetectionResult> {
        match self {
            DetectionOutcome::Fired(result) => Some(result),
            DetectionOutcome::Declined(_) => None,
        }
    }

    /// True when the detector fired
    pub fn is_fired(&self) -> bool {
        matches!(self, DetectionOutcome::Fired(_))
    }
}
