//! Cascade veto
//!
//! A single marginal condition never blocks a trade; two or more
//! simultaneously do. The verdict always carries the complete violation
//! list so the caller can log exactly why an entry died.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::CascadeConfig;

use super::history::TradeHistory;

/// One tripped cascade condition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CascadeViolation {
    WeakSignal { z: f64 },
    LossStreak { count: u32 },
    ElevatedPvs { score: f64 },
    RuleViolations { count: usize },
    Overtrading { trades_in_hour: usize },
    LowRegimeConfidence { confidence: f64 },
}

/// Complete evaluation of the cascade conditions
#[derive(Debug, Clone, Serialize)]
pub struct CascadeVerdict {
    pub violations: Vec<CascadeViolation>,
    pub threshold: usize,
}

impl CascadeVerdict {
    /// True when enough conditions tripped at once
    pub fn vetoed(&self) -> bool {
        self.violations.len() >= self.threshold
    }
}

/// Evaluates all cascade conditions against a proposed entry
pub struct CascadeVeto {
    config: CascadeConfig,
}

impl CascadeVeto {
    pub fn new(config: CascadeConfig) -> Self {
        Self { config }
    }

    /// Check a proposed entry against the current risk snapshot
    pub fn evaluate(
        &self,
        z_score: f64,
        pvs_score: f64,
        regime_confidence: f64,
        history: &TradeHistory,
        now: DateTime<Utc>,
    ) -> CascadeVerdict {
        let mut violations = Vec::new();

        if z_score.abs() < self.config.edge_z_threshold {
            violations.push(CascadeViolation::WeakSignal { z: z_score });
        }

        let losses = history.consecutive_losses();
        if losses >= self.config.max_consecutive_losses {
            violations.push(CascadeViolation::LossStreak { count: losses });
        }

        if pvs_score >= self.config.pvs_threshold {
            violations.push(CascadeViolation::ElevatedPvs { score: pvs_score });
        }

        let rule_count = history.violations_today().len();
        if rule_count > 0 {
            violations.push(CascadeViolation::RuleViolations { count: rule_count });
        }

        let trades_in_hour = history.trades_in_last_hour(now);
        if trades_in_hour > self.config.max_trades_per_hour {
            violations.push(CascadeViolation::Overtrading { trades_in_hour });
        }

        if regime_confidence < self.config.min_regime_confidence {
            violations.push(CascadeViolation::LowRegimeConfidence {
                confidence: regime_confidence,
            });
        }

        let verdict = CascadeVerdict {
            violations,
            threshold: self.config.cascade_threshold,
        };
        if verdict.vetoed() {
            warn!(
                count = verdict.violations.len(),
                threshold = verdict.threshold,
                violations = ?verdict.violations,
                "cascade veto tripped"
            );
        } else if !verdict.violations.is_empty() {
            debug!(
                count = verdict.violations.len(),
                violations = ?verdict.violations,
                "cascade conditions below veto threshold"
            );
        }
        verdict
    }
}
