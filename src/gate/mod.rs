//! Entry gating: timing and final pre-execution checks

mod guard;
mod timing;

pub use guard::{DenyReason, ExecutionGuard, GuardContext, GuardDecision};
pub use timing::{EntryTimingGate, PendingEntry, TimingVerdict};
