//! Psychological risk scoring
//!
//! Scores the operator's behavioral state from observable trading patterns:
//! fear (loss streaks, daily damage, volatility spikes), fatigue
//! (overtrading, session length, late entries) and confidence deficit
//! (rule violations, revenge entries, burst clusters). The composite score
//! maps to a level that scales or halts entry sizing.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::PvsConfig;

use super::history::TradeHistory;

const FEAR_CAP: f64 = 7.0;
const FATIGUE_CAP: f64 = 6.0;
const DEFICIT_CAP: f64 = 7.0;
const SMALL_ACCOUNT_MULTIPLIER: f64 = 1.5;

/// Behavioral risk level derived from the composite score
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum PvsLevel {
    Normal,
    Elevated,
    Warning,
    Critical,
}

/// Full score breakdown from one evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvsState {
    pub fear: f64,
    pub fatigue: f64,
    pub confidence_deficit: f64,
    /// Composite score, always within [0, 10]
    pub score: f64,
    pub level: PvsLevel,
    pub small_account: bool,
}

impl PvsState {
    /// Size multiplier implied by the level
    pub fn size_multiplier(&self) -> Decimal {
        match self.level {
            PvsLevel::Critical => Decimal::ZERO,
            PvsLevel::Warning => dec!(0.5),
            PvsLevel::Normal | PvsLevel::Elevated => Decimal::ONE,
        }
    }

    /// Critical state stops all entries
    pub fn should_halt(&self) -> bool {
        self.level == PvsLevel::Critical
    }
}

impl Default for PvsState {
    fn default() -> Self {
        Self {
            fear: 0.0,
            fatigue: 0.0,
            confidence_deficit: 0.0,
            score: 0.0,
            level: PvsLevel::Normal,
            small_account: false,
        }
    }
}

/// Alert emitted when an elevated level is active and not rate-limited
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvsAlert {
    pub level: PvsLevel,
    pub score: f64,
}

/// Result of one scoring pass
#[derive(Debug, Clone)]
pub struct PvsUpdate {
    pub state: PvsState,
    pub level_change: Option<(PvsLevel, PvsLevel)>,
    pub alert: Option<PvsAlert>,
}

/// Composite psychological risk scorer
pub struct PsychologicalRiskScore {
    config: PvsConfig,
    current_level: PvsLevel,
    last_alert: HashMap<PvsLevel, DateTime<Utc>>,
}

impl PsychologicalRiskScore {
    pub fn new(config: PvsConfig) -> Self {
        Self {
            config,
            current_level: PvsLevel::Normal,
            last_alert: HashMap::new(),
        }
    }

    pub fn level(&self) -> PvsLevel {
        self.current_level
    }

    /// Score the current behavioral state
    ///
    /// `history.roll_day(now)` must have been applied by the caller so
    /// yesterday's counters do not bleed into today's score.
    pub fn evaluate(
        &mut self,
        now: DateTime<Utc>,
        equity: Decimal,
        vol_indicator: Option<f64>,
        history: &TradeHistory,
    ) -> PvsUpdate {
        let fear = self.fear_score(equity, vol_indicator, history);
        let fatigue = self.fatigue_score(now, history);
        let confidence_deficit = self.deficit_score(now, history);

        let small_account = equity < self.config.small_account_threshold;
        let raw = (fear + fatigue + confidence_deficit) / 3.0;
        let scaled = if small_account {
            raw * SMALL_ACCOUNT_MULTIPLIER
        } else {
            raw
        };
        let score = scaled.clamp(0.0, 10.0);

        let level = if score >= self.config.halt_threshold {
            PvsLevel::Critical
        } else if score >= self.config.warning_threshold {
            PvsLevel::Warning
        } else if score >= self.config.elevated_threshold {
            PvsLevel::Elevated
        } else {
            PvsLevel::Normal
        };

        let level_change = if level != self.current_level {
            let change = (self.current_level, level);
            info!(from = ?change.0, to = ?change.1, score, "psychological risk level changed");
            Some(change)
        } else {
            None
        };
        self.current_level = level;

        let alert = if matches!(level, PvsLevel::Warning | PvsLevel::Critical)
            && self.alert_due(level, now)
        {
            self.last_alert.insert(level, now);
            warn!(level = ?level, score, fear, fatigue, confidence_deficit, "psychological risk alert");
            Some(PvsAlert { level, score })
        } else {
            None
        };

        PvsUpdate {
            state: PvsState {
                fear,
                fatigue,
                confidence_deficit,
                score,
                level,
                small_account,
            },
            level_change,
            alert,
        }
    }

    fn alert_due(&self, level: PvsLevel, now: DateTime<Utc>) -> bool {
        match self.last_alert.get(&level) {
            None => true,
            Some(last) => now - *last >= Duration::minutes(self.config.alert_interval_minutes),
        }
    }

    fn fear_score(
        &self,
        equity: Decimal,
        vol_indicator: Option<f64>,
        history: &TradeHistory,
    ) -> f64 {
        let mut fear: f64 = 0.0;

        fear += match history.consecutive_losses() {
            0 | 1 => 0.0,
            2 => 1.0,
            3 => 2.0,
            _ => 3.0,
        };

        if equity > Decimal::ZERO {
            let daily_ratio = history.daily_pnl() / equity;
            if daily_ratio <= dec!(-0.05) {
                fear += 2.0;
            } else if daily_ratio <= dec!(-0.03) {
                fear += 1.0;
            }
        }

        if let Some(indicator) = vol_indicator {
            if indicator > self.config.vol_spike_threshold {
                fear += 1.0;
            }
        }

        fear += match history.losses_in_last(5) {
            0..=2 => 0.0,
            3 => 0.5,
            _ => 1.0,
        };

        fear.min(FEAR_CAP)
    }

    fn fatigue_score(&self, now: DateTime<Utc>, history: &TradeHistory) -> f64 {
        let mut fatigue: f64 = 0.0;

        let hour_trades = history.trades_in_last_hour(now);
        if hour_trades > 5 {
            fatigue += 2.0;
        } else if hour_trades > 3 {
            fatigue += 1.0;
        }

        let hours = history.distinct_trading_hours_today(now);
        if hours > 5 {
            fatigue += 2.0;
        } else if hours > 3 {
            fatigue += 1.0;
        }

        if history.traded_at_or_after_today(now, self.config.late_session_cutoff) {
            fatigue += 1.0;
        }

        let today = history.trades_today();
        if today > 5 {
            fatigue += 1.0;
        } else if today > 3 {
            fatigue += 0.5;
        }

        fatigue.min(FATIGUE_CAP)
    }

    fn deficit_score(&self, now: DateTime<Utc>, history: &TradeHistory) -> f64 {
        let mut deficit = history.violations_today().len().min(3) as f64;

        if let Some(gap) = history.min_gap_after_loss_today(now) {
            if gap <= Duration::minutes(15) {
                deficit += 2.0;
            } else if gap <= Duration::minutes(30) {
                deficit += 1.0;
            }
        }

        if history.has_trade_cluster(3, Duration::minutes(30)) {
            deficit += 1.0;
        }

        deficit.min(DEFICIT_CAP)
    }
}
