//! sigma-edge: decision core for an extreme-move reversion strategy
//!
//! This library provides the core components for:
//! - Extreme-move detection from per-symbol bar windows
//! - Volatility regime classification
//! - Anchored VWAP reference tracking from detection anchors
//! - Layered risk control: drawdown ladder, psychological risk score,
//!   cascade veto, dynamic sizing
//! - Randomized entry timing with retracement checks
//! - Final pre-execution guarding
//! - Health monitoring with circuit-broken self-recovery
//! - Full observability stack

pub mod anchor;
pub mod cli;
pub mod config;
pub mod detector;
pub mod engine;
pub mod gate;
pub mod market;
pub mod recovery;
pub mod regime;
pub mod risk;
pub mod signal;
pub mod telemetry;
