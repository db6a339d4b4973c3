//! Dynamic position sizing
//!
//! Size grows with detection strength and shrinks under every risk layer:
//! regime posture, drawdown rung and psychological state each contribute a
//! multiplier in [0, 1]. A zero multiplier from any layer zeroes the size
//! outright; otherwise the result is clamped to the configured band.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::SizingConfig;
use crate::market::Bar;

/// Every factor that went into a computed size
#[derive(Debug, Clone)]
pub struct SizeBreakdown {
    /// Capital base, ATR-normalized when enabled
    pub base: Decimal,
    /// min(|z| / 2, 2), the detection-strength factor
    pub edge_multiplier: Decimal,
    pub regime_multiplier: Decimal,
    pub drawdown_multiplier: Decimal,
    pub pvs_multiplier: Decimal,
    /// Final clamped size
    pub size: Decimal,
}

/// Computes entry size from signal strength and risk multipliers
pub struct DynamicSizer {
    config: SizingConfig,
}

impl DynamicSizer {
    /// Create a sizer; expects a validated configuration
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    /// Compute the size for a detection with the given risk multipliers
    ///
    /// `bars` feed the optional ATR normalization; with fewer than
    /// `atr_period + 1` bars the base falls back to the flat risk amount.
    pub fn compute(
        &self,
        z_score: f64,
        bars: &[Bar],
        regime_multiplier: Decimal,
        drawdown_multiplier: Decimal,
        pvs_multiplier: Decimal,
    ) -> SizeBreakdown {
        let edge_raw = (z_score.abs() / 2.0).min(2.0);
        let edge_multiplier = Decimal::try_from(edge_raw).unwrap_or(Decimal::ZERO);

        let base = if self.config.volatility_normalized {
            self.atr_base(bars).unwrap_or(self.config.risk_amount)
        } else {
            self.config.risk_amount
        };

        let regime_multiplier = clamp_unit(regime_multiplier);
        let drawdown_multiplier = clamp_unit(drawdown_multiplier);
        let pvs_multiplier = clamp_unit(pvs_multiplier);

        let raw = base * edge_multiplier * regime_multiplier * drawdown_multiplier * pvs_multiplier;
        // A halting layer zeroes the size; the minimum clamp must not
        // resurrect it.
        let size = if raw.is_zero() {
            Decimal::ZERO
        } else {
            raw.clamp(self.config.min_size, self.config.max_size)
        };

        debug!(
            %base,
            edge = %edge_multiplier,
            regime = %regime_multiplier,
            drawdown = %drawdown_multiplier,
            pvs = %pvs_multiplier,
            %size,
            "position size computed"
        );

        SizeBreakdown {
            base,
            edge_multiplier,
            regime_multiplier,
            drawdown_multiplier,
            pvs_multiplier,
            size,
        }
    }

    /// Risk amount scaled by inverse relative ATR over the trailing bars
    fn atr_base(&self, bars: &[Bar]) -> Option<Decimal> {
        let period = self.config.atr_period;
        if bars.len() < period + 1 {
            return None;
        }
        let tail = &bars[bars.len() - (period + 1)..];
        let mut sum = Decimal::ZERO;
        for pair in tail.windows(2) {
            let (prev, bar) = (&pair[0], &pair[1]);
            let range = bar.high - bar.low;
            let above = (bar.high - prev.close).abs();
            let below = (bar.low - prev.close).abs();
            sum += range.max(above).max(below);
        }
        let atr = sum / Decimal::from(period as u64);

        let price = tail[tail.len() - 1].close;
        if price <= Decimal::ZERO {
            return None;
        }
        let ratio = (atr / price).max(self.config.atr_floor);
        Some(self.config.risk_amount / ratio)
    }
}

fn clamp_unit(value: Decimal) -> Decimal {
    value.clamp(Decimal::ZERO, Decimal::ONE)
}
