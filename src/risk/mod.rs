//! Risk management module
//!
//! Drawdown ladder, psychological scoring, cascade veto and dynamic
//! position sizing, all fed by a shared bounded trade history.

mod cascade;
mod drawdown;
mod history;
mod pvs;
mod sizing;

pub use cascade::{CascadeVerdict, CascadeVeto, CascadeViolation};
pub use drawdown::{DrawdownLadder, LadderUpdate, RungChange};
pub use history::{TradeHistory, TradeRecord};
pub use pvs::{PsychologicalRiskScore, PvsAlert, PvsLevel, PvsState, PvsUpdate};
pub use sizing::{DynamicSizer, SizeBreakdown};
