//! Market data types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One minute of trading for a single symbol.
///
/// Bars are immutable once produced and owned by the caller; the decision
/// core only ever borrows slices of bar history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time
    pub timestamp: DateTime<Utc>,
    /// Opening price
    pub open: Decimal,
    /// Highest traded price
    pub high: Decimal,
    /// Lowest traded price
    pub low: Decimal,
    /// Closing price
    pub close: Decimal,
    /// Traded volume
    pub volume: Decimal,
}

impl Bar {
    /// Typical price (H+L+C)/3 used for VWAP accumulation
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / dec!(3)
    }
}
