//! Drawdown ladder
//!
//! Tracks peak equity and maps drawdown magnitude onto a ladder of rungs,
//! each cutting position size further. The deepest rung halts entries
//! outright. Peak only resets through an explicit operator action, never
//! automatically.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::DrawdownConfig;

/// Upward rung transition, reported once per rung until reset
#[derive(Debug, Clone, PartialEq)]
pub struct RungChange {
    pub from: usize,
    pub to: usize,
    pub drawdown: Decimal,
}

/// Outcome of feeding one equity reading to the ladder
#[derive(Debug, Clone)]
pub struct LadderUpdate {
    pub rung: usize,
    pub multiplier: Decimal,
    /// Signed drawdown from peak, zero or negative
    pub drawdown: Decimal,
    pub change: Option<RungChange>,
}

/// Peak-tracking drawdown ladder
pub struct DrawdownLadder {
    config: DrawdownConfig,
    peak_equity: Decimal,
    current_equity: Decimal,
    current_drawdown: Decimal,
    rung: usize,
    notified: Vec<bool>,
    last_reset: Option<DateTime<Utc>>,
}

impl DrawdownLadder {
    /// Create a ladder; expects a validated configuration
    pub fn new(config: DrawdownConfig) -> Self {
        let rungs = config.thresholds.len();
        Self {
            config,
            peak_equity: Decimal::ZERO,
            current_equity: Decimal::ZERO,
            current_drawdown: Decimal::ZERO,
            rung: 0,
            notified: vec![false; rungs],
            last_reset: None,
        }
    }

    /// Feed the latest account equity and recompute the rung
    ///
    /// Rung increases emit a [`RungChange`] the first time each rung is
    /// reached; re-entering a rung after partial recovery stays silent
    /// until [`reset`](Self::reset). Rung decreases are always silent.
    pub fn update(&mut self, equity: Decimal) -> LadderUpdate {
        self.current_equity = equity;
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        self.current_drawdown = if self.peak_equity > Decimal::ZERO {
            (equity - self.peak_equity) / self.peak_equity
        } else {
            Decimal::ZERO
        };

        let magnitude = -self.current_drawdown;
        let new_rung = self
            .config
            .thresholds
            .iter()
            .filter(|t| magnitude >= **t)
            .count();

        let mut change = None;
        if new_rung > self.rung && !self.notified[new_rung - 1] {
            self.notified[new_rung - 1] = true;
            change = Some(RungChange {
                from: self.rung,
                to: new_rung,
                drawdown: self.current_drawdown,
            });
            warn!(
                from = self.rung,
                to = new_rung,
                drawdown = %self.current_drawdown,
                "drawdown rung escalated"
            );
        }
        self.rung = new_rung;

        LadderUpdate {
            rung: new_rung,
            multiplier: self.multiplier(),
            drawdown: self.current_drawdown,
            change,
        }
    }

    /// Size multiplier for the current rung
    pub fn multiplier(&self) -> Decimal {
        if self.rung == 0 {
            Decimal::ONE
        } else {
            self.config.multipliers[self.rung - 1]
        }
    }

    /// True once the deepest rung is reached; all entries stop
    pub fn should_halt(&self) -> bool {
        self.rung == self.config.thresholds.len()
    }

    pub fn rung(&self) -> usize {
        self.rung
    }

    pub fn drawdown(&self) -> Decimal {
        self.current_drawdown
    }

    pub fn peak_equity(&self) -> Decimal {
        self.peak_equity
    }

    pub fn last_reset_at(&self) -> Option<DateTime<Utc>> {
        self.last_reset
    }

    /// Operator acknowledgment: re-anchor peak at current equity and clear
    /// rung and notification state
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.peak_equity = self.current_equity;
        self.current_drawdown = Decimal::ZERO;
        self.rung = 0;
        self.notified = vec![false; self.config.thresholds.len()];
        self.last_reset = Some(now);
        info!(peak = %self.peak_equity, "drawdown ladder reset");
    }
}
