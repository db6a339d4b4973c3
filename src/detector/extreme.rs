//! Extreme move detection
//!
//! Flags bars where the trailing window return is a large multiple of the
//! window's own per-bar volatility and the window volume is anomalous for
//! the hour of day. Every insufficiency declines silently; the detector
//! never errors on thin data.

use chrono::{DateTime, Duration, Timelike, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::DetectorConfig;
use crate::market::{Bar, SymbolState};

use super::types::{DeclineReason, DetectionOutcome, DetectionResult, MoveDirection};

/// Stateless evaluator; all per-symbol state lives in [`SymbolState`]
pub struct ExtremeDetector {
    config: DetectorConfig,
}

impl ExtremeDetector {
    /// Create a detector with the given configuration
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Create a detector with default thresholds
    pub fn with_defaults() -> Self {
        Self::new(DetectorConfig::default())
    }

    /// Evaluate the trailing window of `bars` for an extreme move
    ///
    /// The window volume sum is recorded into the hour-of-day profile on
    /// every call, after the anomaly comparison, so history accrues even
    /// when the move itself is unremarkable. On a fired detection the
    /// cooldown timestamp is stamped into `state`.
    pub fn evaluate(
        &self,
        symbol: &str,
        bars: &[Bar],
        state: &mut SymbolState,
        now: DateTime<Utc>,
    ) -> DetectionOutcome {
        let need = self.config.window_bars;
        if bars.len() < need {
            return DetectionOutcome::Declined(DeclineReason::InsufficientHistory {
                have: bars.len(),
                need,
            });
        }
        let window = &bars[bars.len() - need..];
        let last = &window[need - 1];

        // Snapshot the hour bucket before recording so the window never
        // compares against its own sample.
        let window_volume: f64 = window.iter().map(|b| to_f64(b.volume)).sum();
        let hour = last.timestamp.hour();
        let prior_samples = state.volume_profile.samples(hour);
        let prior_median = state.volume_profile.median(hour);
        state.volume_profile.record(hour, window_volume);

        let first_close = to_f64(window[0].close);
        let last_close = to_f64(last.close);
        if first_close <= 0.0 {
            return DetectionOutcome::Declined(DeclineReason::ZeroVolatility);
        }
        let window_return = last_close / first_close - 1.0;

        let returns: Vec<f64> = window
            .windows(2)
            .map(|pair| {
                let prev = to_f64(pair[0].close);
                let next = to_f64(pair[1].close);
                if prev <= 0.0 {
                    0.0
                } else {
                    next / prev - 1.0
                }
            })
            .collect();
        let sigma = sample_std(&returns);
        if sigma < f64::EPSILON {
            return DetectionOutcome::Declined(DeclineReason::ZeroVolatility);
        }

        let z = window_return / sigma;
        if z.abs() < self.config.z_threshold {
            return DetectionOutcome::Declined(DeclineReason::BelowZThreshold {
                z,
                threshold: self.config.z_threshold,
            });
        }

        if prior_samples < self.config.min_volume_samples {
            debug!(
                symbol,
                hour,
                have = prior_samples,
                need = self.config.min_volume_samples,
                "volume history too thin for anomaly check"
            );
            return DetectionOutcome::Declined(DeclineReason::InsufficientVolumeHistory {
                have: prior_samples,
                need: self.config.min_volume_samples,
            });
        }
        let ratio_threshold = if self.in_auction_window(now) {
            self.config.auction_volume_ratio_threshold
        } else {
            self.config.volume_ratio_threshold
        };
        let ratio = match prior_median {
            Some(median) if median > 0.0 => window_volume / median,
            _ => 0.0,
        };
        if ratio <= ratio_threshold {
            return DetectionOutcome::Declined(DeclineReason::VolumeNotAnomalous {
                ratio,
                threshold: ratio_threshold,
            });
        }

        if let Some(last_fired) = state.last_detection {
            let cooldown = Duration::minutes(self.config.cooldown_minutes);
            let elapsed = now - last_fired;
            if elapsed < cooldown {
                return DetectionOutcome::Declined(DeclineReason::CooldownActive {
                    remaining_secs: (cooldown - elapsed).num_seconds(),
                });
            }
        }

        state.last_detection = Some(now);
        let direction = if window_return > 0.0 {
            MoveDirection::Up
        } else {
            MoveDirection::Down
        };
        info!(
            symbol,
            z,
            volume_ratio = ratio,
            direction = ?direction,
            window_return,
            "extreme move detected"
        );
        DetectionOutcome::Fired(DetectionResult {
            is_extreme: true,
            z_score: z,
            volume_anomaly_ratio: ratio,
            direction,
            return_over_window: window_return,
            anchor_bar: last.clone(),
            detected_at: now,
        })
    }

    fn in_auction_window(&self, now: DateTime<Utc>) -> bool {
        let t = now.time();
        self.config.auction_windows.iter().any(|w| w.contains(t))
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.try_into().unwrap_or(0.0)
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuctionWindow;
    use chrono::{NaiveTime, TimeZone};
    use rust_decimal_macros::dec;

    fn ts(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn bar_at(minute: i64, close: f64, volume: Decimal) -> Bar {
        let close = Decimal::try_from(close).unwrap();
        Bar {
            timestamp: ts(minute),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    /// Bars whose per-bar returns are `drift + (-1)^i * noise`, so the
    /// return std is independent of drift and the window return is
    /// approximately `n * drift`.
    fn drifting_bars(n: usize, drift: f64, noise: f64) -> Vec<Bar> {
        let mut close = 100.0;
        let mut bars = vec![bar_at(0, close, dec!(200))];
        for i in 1..n {
            let r = drift + if i % 2 == 0 { noise } else { -noise };
            close *= 1.0 + r;
            bars.push(bar_at(i as i64, close, dec!(200)));
        }
        bars
    }

    fn config(window_bars: usize) -> DetectorConfig {
        DetectorConfig {
            window_bars,
            ..DetectorConfig::default()
        }
    }

    /// Seed the hour bucket so the window's volume sum comes out at `ratio`
    /// times the median.
    fn seed_volume(state: &mut SymbolState, hour: u32, window_sum: f64, ratio: f64) {
        for _ in 0..6 {
            state.volume_profile.record(hour, window_sum / ratio);
        }
    }

    fn extract_z(outcome: &DetectionOutcome) -> f64 {
        match outcome {
            DetectionOutcome::Fired(r) => r.z_score,
            DetectionOutcome::Declined(DeclineReason::BelowZThreshold { z, .. }) => *z,
            other => panic!("expected a z-bearing outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_insufficient_history_declines() {
        let detector = ExtremeDetector::with_defaults();
        let bars = drifting_bars(10, 0.0, 0.001);
        let mut state = SymbolState::new(30);
        let outcome = detector.evaluate("BTCUSDT", &bars, &mut state, ts(10));
        assert!(matches!(
            outcome,
            DetectionOutcome::Declined(DeclineReason::InsufficientHistory { have: 10, need: 60 })
        ));
    }

    #[test]
    fn test_flat_prices_decline_on_zero_volatility() {
        let detector = ExtremeDetector::new(config(31));
        let bars = drifting_bars(31, 0.0, 0.0);
        let mut state = SymbolState::new(30);
        let outcome = detector.evaluate("BTCUSDT", &bars, &mut state, ts(31));
        assert!(matches!(
            outcome,
            DetectionOutcome::Declined(DeclineReason::ZeroVolatility)
        ));
    }

    #[test]
    fn test_small_move_declines_below_z_threshold() {
        let detector = ExtremeDetector::new(config(31));
        // Noise only, no drift: window return near zero
        let bars = drifting_bars(31, 0.0, 0.001);
        let mut state = SymbolState::new(30);
        let outcome = detector.evaluate("BTCUSDT", &bars, &mut state, ts(31));
        match outcome {
            DetectionOutcome::Declined(DeclineReason::BelowZThreshold { z, threshold }) => {
                assert!(z.abs() < 1.0, "z was {z}");
                assert_eq!(threshold, 2.0);
            }
            other => panic!("expected BelowZThreshold, got {:?}", other),
        }
    }

    #[test]
    fn test_extreme_move_needs_volume_history() {
        let detector = ExtremeDetector::new(config(31));
        let bars = drifting_bars(31, 0.001, 0.001);
        let mut state = SymbolState::new(30);
        let outcome = detector.evaluate("BTCUSDT", &bars, &mut state, ts(31));
        assert!(matches!(
            outcome,
            DetectionOutcome::Declined(DeclineReason::InsufficientVolumeHistory { have: 0, need: 5 })
        ));
        // The evaluation itself still feeds the profile
        assert_eq!(state.volume_profile.samples(12), 1);
    }

    #[test]
    fn test_normal_volume_declines() {
        let detector = ExtremeDetector::new(config(31));
        let bars = drifting_bars(31, 0.001, 0.001);
        let mut state = SymbolState::new(30);
        seed_volume(&mut state, 12, 31.0 * 200.0, 1.0);
        let outcome = detector.evaluate("BTCUSDT", &bars, &mut state, ts(31));
        match outcome {
            DetectionOutcome::Declined(DeclineReason::VolumeNotAnomalous { ratio, threshold }) => {
                assert!((ratio - 1.0).abs() < 1e-9);
                assert_eq!(threshold, 1.5);
            }
            other => panic!("expected VolumeNotAnomalous, got {:?}", other),
        }
    }

    #[test]
    fn test_extreme_up_move_with_volume_spike_fires() {
        let detector = ExtremeDetector::new(config(31));
        // 30 one-minute returns with std near 0.001 and total drift giving
        // z near 2.5
        let bars = drifting_bars(31, 2.5 * 0.001 / 30.0, 0.001);
        let mut state = SymbolState::new(30);
        seed_volume(&mut state, 12, 31.0 * 200.0, 1.8);

        let outcome = detector.evaluate("BTCUSDT", &bars, &mut state, ts(31));
        match outcome {
            DetectionOutcome::Fired(result) => {
                assert!(result.is_extreme);
                assert_eq!(result.direction, MoveDirection::Up);
                assert!(result.z_score > 2.0 && result.z_score < 3.0, "z was {}", result.z_score);
                assert!((result.volume_anomaly_ratio - 1.8).abs() < 1e-6);
                assert_eq!(result.anchor_bar.close, bars.last().unwrap().close);
                assert_eq!(state.last_detection, Some(ts(31)));
            }
            other => panic!("expected Fired, got {:?}", other),
        }
    }

    #[test]
    fn test_extreme_down_move_fires_down() {
        let detector = ExtremeDetector::new(config(31));
        let bars = drifting_bars(31, -0.001, 0.001);
        let mut state = SymbolState::new(30);
        seed_volume(&mut state, 12, 31.0 * 200.0, 3.0);

        let outcome = detector.evaluate("BTCUSDT", &bars, &mut state, ts(31));
        match outcome {
            DetectionOutcome::Fired(result) => {
                assert_eq!(result.direction, MoveDirection::Down);
                assert!(result.z_score < -2.0);
                assert!(result.return_over_window < 0.0);
            }
            other => panic!("expected Fired, got {:?}", other),
        }
    }

    #[test]
    fn test_cooldown_blocks_refire() {
        let detector = ExtremeDetector::new(config(31));
        let bars = drifting_bars(31, 0.001, 0.001);
        let mut state = SymbolState::new(30);
        seed_volume(&mut state, 12, 31.0 * 200.0, 3.0);

        assert!(detector.evaluate("BTCUSDT", &bars, &mut state, ts(31)).is_fired());

        let outcome = detector.evaluate("BTCUSDT", &bars, &mut state, ts(32));
        match outcome {
            DetectionOutcome::Declined(DeclineReason::CooldownActive { remaining_secs }) => {
                assert_eq!(remaining_secs, 14 * 60);
            }
            other => panic!("expected CooldownActive, got {:?}", other),
        }

        // Past the cooldown the same conditions fire again
        assert!(detector.evaluate("BTCUSDT", &bars, &mut state, ts(47)).is_fired());
    }

    #[test]
    fn test_auction_window_raises_volume_bar() {
        let mut cfg = config(31);
        cfg.auction_windows = vec![AuctionWindow {
            start: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
        }];
        let detector = ExtremeDetector::new(cfg);
        let bars = drifting_bars(31, 0.001, 0.001);
        let mut state = SymbolState::new(30);
        // 1.8x clears the normal 1.5x bar but not the 2.0x auction bar
        seed_volume(&mut state, 12, 31.0 * 200.0, 1.8);

        let outcome = detector.evaluate("BTCUSDT", &bars, &mut state, ts(31));
        assert!(matches!(
            outcome,
            DetectionOutcome::Declined(DeclineReason::VolumeNotAnomalous { threshold, .. })
                if threshold == 2.0
        ));
    }

    #[test]
    fn test_z_scales_linearly_with_window_return() {
        let detector = ExtremeDetector::new(config(61));
        let drift = 0.0002;

        // Same noise pattern, doubled drift: same sigma, doubled return
        let mut state_a = SymbolState::new(30);
        let mut state_b = SymbolState::new(30);
        seed_volume(&mut state_a, 12, 1.0, 10_000.0);
        seed_volume(&mut state_b, 12, 1.0, 10_000.0);

        let z1 = extract_z(&detector.evaluate(
            "BTCUSDT",
            &drifting_bars(61, drift, 0.001),
            &mut state_a,
            ts(61),
        ));
        let z2 = extract_z(&detector.evaluate(
            "BTCUSDT",
            &drifting_bars(61, 2.0 * drift, 0.001),
            &mut state_b,
            ts(61),
        ));
        assert!((z2 / z1 - 2.0).abs() < 0.05, "z1={z1} z2={z2}");
    }
}
