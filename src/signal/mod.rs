//! Trade signal types

mod types;

pub use types::TradeSignal;
