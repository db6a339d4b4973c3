//! Volatility regime classification
//!
//! A deliberately simple threshold heuristic over a market-wide volatility
//! indicator. The [`RegimeModel`] trait is the substitution seam: a fitted
//! multi-state model can replace [`ThresholdClassifier`] without touching
//! any caller.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::RegimeConfig;

/// Market regime label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeLabel {
    LowVol,
    HighVol,
    Trending,
}

/// Classified regime plus the sizing posture it implies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeState {
    pub label: RegimeLabel,
    /// Probability mass over [low_vol, high_vol, trending]
    pub probabilities: [f64; 3],
    /// Size multiplier applied by the sizer
    pub size_multiplier: Decimal,
    /// High-vol regimes demand twice the usual edge before entry
    pub requires_double_edge: bool,
}

impl RegimeState {
    /// Confidence in the assigned label
    pub fn confidence(&self) -> f64 {
        self.probabilities.iter().cloned().fold(0.0, f64::max)
    }
}

/// Interface every regime model satisfies
pub trait RegimeModel: Send + Sync {
    /// Classify from the current indicator reading, if one is available
    fn classify(&self, indicator: Option<f64>) -> RegimeState;
}

/// Three-band threshold heuristic over the volatility indicator
pub struct ThresholdClassifier {
    config: RegimeConfig,
}

impl ThresholdClassifier {
    pub fn new(config: RegimeConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(RegimeConfig::default())
    }
}

impl RegimeModel for ThresholdClassifier {
    fn classify(&self, indicator: Option<f64>) -> RegimeState {
        let value = match indicator {
            Some(v) => v,
            // Unavailable indicator never fails the pipeline
            None => {
                return RegimeState {
                    label: RegimeLabel::LowVol,
                    probabilities: [0.5, 0.2, 0.3],
                    size_multiplier: dec!(1.0),
                    requires_double_edge: false,
                }
            }
        };

        if value < self.config.low_vol_ceiling {
            RegimeState {
                label: RegimeLabel::LowVol,
                probabilities: [0.7, 0.1, 0.2],
                size_multiplier: self.config.low_vol_multiplier,
                requires_double_edge: false,
            }
        } else if value > self.config.high_vol_floor {
            RegimeState {
                label: RegimeLabel::HighVol,
                probabilities: [0.1, 0.7, 0.2],
                size_multiplier: self.config.high_vol_multiplier,
                requires_double_edge: true,
            }
        } else {
            RegimeState {
                label: RegimeLabel::Trending,
                probabilities: [0.15, 0.15, 0.7],
                size_multiplier: self.config.trending_multiplier,
                requires_double_edge: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_indicator_maps_to_low_vol() {
        let model = ThresholdClassifier::with_defaults();
        let state = model.classify(Some(12.0));
        assert_eq!(state.label, RegimeLabel::LowVol);
        assert_eq!(state.size_multiplier, dec!(1.0));
        assert!(!state.requires_double_edge);
        assert!((state.confidence() - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_high_indicator_maps_to_high_vol_with_double_edge() {
        let model = ThresholdClassifier::with_defaults();
        let state = model.classify(Some(32.0));
        assert_eq!(state.label, RegimeLabel::HighVol);
        assert_eq!(state.size_multiplier, dec!(0.3));
        assert!(state.requires_double_edge);
    }

    #[test]
    fn test_mid_indicator_maps_to_trending() {
        let model = ThresholdClassifier::with_defaults();
        let state = model.classify(Some(20.0));
        assert_eq!(state.label, RegimeLabel::Trending);
        assert_eq!(state.size_multiplier, dec!(0.8));
        assert!(!state.requires_double_edge);
        assert!((state.confidence() - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_band_edges_fall_to_trending() {
        let model = ThresholdClassifier::with_defaults();
        assert_eq!(model.classify(Some(15.0)).label, RegimeLabel::Trending);
        assert_eq!(model.classify(Some(25.0)).label, RegimeLabel::Trending);
    }

    #[test]
    fn test_missing_indicator_yields_neutral_default() {
        let model = ThresholdClassifier::with_defaults();
        let state = model.classify(None);
        assert_eq!(state.label, RegimeLabel::LowVol);
        assert_eq!(state.size_multiplier, dec!(1.0));
        assert!(!state.requires_double_edge);
        assert!((state.confidence() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let model = ThresholdClassifier::with_defaults();
        for indicator in [None, Some(10.0), Some(20.0), Some(40.0)] {
            let total: f64 = model.classify(indicator).probabilities.iter().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }
}
