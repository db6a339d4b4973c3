//! Anchored reference-price tracking
//!
//! Each fired detection anchors a volume-weighted average price at the
//! triggering bar. The track follows every subsequent bar for that symbol
//! until a time stop or a divergence stop deactivates it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::AnchorConfig;
use crate::detector::{DetectionResult, MoveDirection};
use crate::market::Bar;

/// Why a track was deactivated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeactivationReason {
    /// Bars since anchor exceeded the time stop
    TimeStop { bars: u64 },
    /// Price diverged against the move direction beyond the band
    DivergenceStop { distance: Decimal },
}

/// Result of advancing a track by one bar
#[derive(Debug, Clone)]
pub enum TrackUpdate {
    /// Track remains active
    Active { vwap: Decimal, distance: Decimal },
    /// Track deactivated this bar; eligible for removal
    Deactivated(DeactivationReason),
}

/// VWAP track anchored at a detection's trigger bar
///
/// `is_active` transitions true to false exactly once; a deactivated track
/// is never reactivated. A later detection for the same symbol must replace
/// the track with a fresh one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorTrack {
    /// Symbol this track belongs to
    pub symbol: String,
    /// Time of the anchoring bar
    pub anchor_time: DateTime<Utc>,
    /// Close of the anchoring bar
    pub anchor_price: Decimal,
    /// Direction of the detected move
    pub direction: MoveDirection,
    /// Bars processed since the anchor
    pub bars_since_anchor: u64,
    /// False once a deactivation rule has fired
    pub is_active: bool,
    /// Set when the track deactivates
    pub stop_reason: Option<DeactivationReason>,
    cum_price_volume: Decimal,
    cum_volume: Decimal,
}

impl AnchorTrack {
    /// Current volume-weighted average price from the anchor forward
    ///
    /// Seeded with the anchor bar's close x volume, so the initial VWAP
    /// equals the anchor price even before any subsequent bar arrives.
    pub fn vwap(&self) -> Decimal {
        if self.cum_volume.is_zero() {
            self.anchor_price
        } else {
            self.cum_price_volume / self.cum_volume
        }
    }
}

/// Creates and advances anchored VWAP tracks
pub struct AnchorTracker {
    config: AnchorConfig,
}

impl AnchorTracker {
    /// Create a tracker with the given configuration
    pub fn new(config: AnchorConfig) -> Self {
        Self { config }
    }

    /// Create a tracker with default configuration
    pub fn with_defaults() -> Self {
        Self::new(AnchorConfig::default())
    }

    /// Open a fresh track anchored at the detection's trigger bar
    pub fn open(&self, symbol: &str, detection: &DetectionResult) -> AnchorTrack {
        let bar = &detection.anchor_bar;
        AnchorTrack {
            symbol: symbol.to_string(),
            anchor_time: bar.timestamp,
            anchor_price: bar.close,
            direction: detection.direction,
            bars_since_anchor: 0,
            is_active: true,
            stop_reason: None,
            cum_price_volume: bar.close * bar.volume,
            cum_volume: bar.volume,
        }
    }

    /// Advance an active track by one bar
    ///
    /// Accumulates typical price x volume, recomputes the divergence from
    /// VWAP and applies the time and divergence stops. Deactivation is
    /// one-way: the caller should drop the track once `Deactivated` is
    /// returned.
    pub fn advance(&self, track: &mut AnchorTrack, bar: &Bar) -> TrackUpdate {
        if !track.is_active {
            let reason = track
                .stop_reason
                .clone()
                .unwrap_or(DeactivationReason::TimeStop {
                    bars: track.bars_since_anchor,
                });
            return TrackUpdate::Deactivated(reason);
        }

        track.bars_since_anchor += 1;
        track.cum_price_volume += bar.typical_price() * bar.volume;
        track.cum_volume += bar.volume;

        let vwap = track.vwap();
        let distance = if vwap.is_zero() {
            dec!(0)
        } else {
            bar.close / vwap - dec!(1)
        };

        if track.bars_since_anchor > self.config.time_stop_hours * 60 {
            let reason = DeactivationReason::TimeStop {
                bars: track.bars_since_anchor,
            };
            track.is_active = false;
            track.stop_reason = Some(reason.clone());
            return TrackUpdate::Deactivated(reason);
        }

        let against_move = match track.direction {
            MoveDirection::Up => distance < -self.config.divergence_band,
            MoveDirection::Down => distance > self.config.divergence_band,
        };
        if against_move {
            let reason = DeactivationReason::DivergenceStop { distance };
            track.is_active = false;
            track.stop_reason = Some(reason.clone());
            return TrackUpdate::Deactivated(reason);
        }

        TrackUpdate::Active { vwap, distance }
    }
}
