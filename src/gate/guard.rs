//! Final pre-execution checks
//!
//! Every signal that survives detection, sizing, and timing passes through
//! one last guard immediately before execution. The guard re-checks the
//! halting layers in a fixed order so the most severe condition is the one
//! reported.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::regime::RegimeState;
use crate::risk::{CascadeVerdict, CascadeViolation, PvsState};

/// Everything the guard needs to rule on one signal
#[derive(Debug)]
pub struct GuardContext<'a> {
    pub drawdown_halt: bool,
    pub drawdown_rung: usize,
    pub pvs: &'a PvsState,
    pub cascade: &'a CascadeVerdict,
    pub regime: &'a RegimeState,
    pub z_score: f64,
    pub edge_z_threshold: f64,
    pub open_positions: usize,
    pub max_open_positions: usize,
    pub size: Decimal,
    pub min_size: Decimal,
}

/// Why a signal was refused
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenyReason {
    DrawdownHalt { rung: usize },
    PvsHalt { score: f64 },
    CascadeVeto { violations: Vec<CascadeViolation> },
    /// High-vol regime demands twice the usual edge
    DoubleEdgeRequired { z_score: f64, required: f64 },
    MaxPositionsReached { open: usize, max: usize },
    SizeBelowMinimum { size: Decimal, min: Decimal },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    Allow,
    Deny(DenyReason),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// Stateless pre-execution gate; all inputs arrive through the context
pub struct ExecutionGuard;

impl ExecutionGuard {
    pub fn new() -> Self {
        Self
    }

    /// Rule on one signal. Checks run in severity order and the first
    /// failure wins.
    pub fn check(&self, ctx: &GuardContext<'_>) -> GuardDecision {
        if ctx.drawdown_halt {
            return self.deny(DenyReason::DrawdownHalt {
                rung: ctx.drawdown_rung,
            });
        }

        if ctx.pvs.should_halt() {
            return self.deny(DenyReason::PvsHalt {
                score: ctx.pvs.score,
            });
        }

        if ctx.cascade.vetoed() {
            return self.deny(DenyReason::CascadeVeto {
                violations: ctx.cascade.violations.clone(),
            });
        }

        if ctx.regime.requires_double_edge {
            let required = 2.0 * ctx.edge_z_threshold;
            if ctx.z_score.abs() < required {
                return self.deny(DenyReason::DoubleEdgeRequired {
                    z_score: ctx.z_score,
                    required,
                });
            }
        }

        if ctx.open_positions >= ctx.max_open_positions {
            return self.deny(DenyReason::MaxPositionsReached {
                open: ctx.open_positions,
                max: ctx.max_open_positions,
            });
        }

        if ctx.size < ctx.min_size {
            return self.deny(DenyReason::SizeBelowMinimum {
                size: ctx.size,
                min: ctx.min_size,
            });
        }

        debug!(z_score = ctx.z_score, size = %ctx.size, "guard passed");
        GuardDecision::Allow
    }

    fn deny(&self, reason: DenyReason) -> GuardDecision {
        warn!(?reason, "signal refused at execution guard");
        GuardDecision::Deny(reason)
    }
}

impl Default for ExecutionGuard {
    fn default() -> Self {
        Self::new()
    }
}
