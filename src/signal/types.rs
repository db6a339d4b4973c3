//! Signal types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::detector::{DetectionResult, MoveDirection};
use crate::regime::RegimeState;

/// A fully vetted entry signal, ready for execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    /// Unique signal identifier
    pub id: Uuid,
    /// Symbol the detection fired on
    pub symbol: String,
    /// Direction of the detected move
    pub direction: MoveDirection,
    /// Approved entry size
    pub size: Decimal,
    /// Detection z-score
    pub z_score: f64,
    /// Return over the detection window
    pub return_over_window: f64,
    /// Window volume vs hourly median at detection time
    pub volume_anomaly_ratio: f64,
    /// Regime the signal was approved under
    pub regime: RegimeState,
    /// Close of the anchoring bar
    pub anchor_price: Decimal,
    /// When the detection fired
    pub detected_at: DateTime<Utc>,
    /// When the signal cleared all gates
    pub approved_at: DateTime<Utc>,
    /// Human-readable trail of the decision
    pub rationale: Vec<String>,
}

impl TradeSignal {
    /// Build a signal from a detection and its approved size
    pub fn new(
        symbol: &str,
        detection: &DetectionResult,
        regime: RegimeState,
        size: Decimal,
        approved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            direction: detection.direction,
            size,
            z_score: detection.z_score,
            return_over_window: detection.return_over_window,
            volume_anomaly_ratio: detection.volume_anomaly_ratio,
            regime,
            anchor_price: detection.anchor_bar.close,
            detected_at: detection.detected_at,
            approved_at,
            rationale: Vec::new(),
        }
    }

    /// Append one step to the decision trail
    pub fn with_rationale(mut self, step: impl Into<String>) -> Self {
        self.rationale.push(step.into());
        self
    }
}
