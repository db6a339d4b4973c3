//! Entry timing gate
//!
//! Extreme moves overshoot; entries wait out a randomized window before
//! executing. The randomized wait keeps entry timing from being
//! front-runnable, while the anchored reference price provides an early
//! exit from the wait when price has already come back to fair.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::TimingConfig;
use crate::signal::TradeSignal;

/// A signal waiting out its entry window
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub signal: TradeSignal,
    pub created_at: DateTime<Utc>,
    /// Randomized wait deadline
    pub ready_at: DateTime<Utc>,
    /// Hard drop deadline
    pub expires_at: DateTime<Utc>,
}

/// Outcome of polling a pending entry
#[derive(Debug, Clone, PartialEq)]
pub enum TimingVerdict {
    /// Execute now
    Approve,
    /// Wait window still running
    Hold { ready_at: DateTime<Utc> },
    /// Move has retraced too far; rejected this poll but kept pending
    Deferred { retracement: f64 },
    /// Pending entry is stale and must be dropped
    Expired,
}

/// Applies the randomized wait and retracement rules
pub struct EntryTimingGate {
    config: TimingConfig,
}

impl EntryTimingGate {
    pub fn new(config: TimingConfig) -> Self {
        Self { config }
    }

    /// False disables the gate entirely; signals execute immediately
    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Park an approved signal behind a randomized wait window
    pub fn open(
        &self,
        signal: TradeSignal,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> PendingEntry {
        let min = self.config.min_wait_minutes;
        let max = self.config.max_wait_minutes;
        let wait = if min == max {
            min
        } else {
            rng.gen_range(min..=max)
        };
        debug!(signal = %signal.id, wait_minutes = wait, "entry parked behind timing gate");
        PendingEntry {
            signal,
            created_at: now,
            ready_at: now + Duration::minutes(wait),
            expires_at: now + Duration::minutes(self.config.expiry_minutes),
        }
    }

    /// Re-evaluate a pending entry against the current price
    ///
    /// `reference` is the anchored VWAP when the track is still alive;
    /// price within the immediate band of it approves without waiting.
    pub fn poll(
        &self,
        pending: &PendingEntry,
        now: DateTime<Utc>,
        price: Decimal,
        reference: Option<Decimal>,
    ) -> TimingVerdict {
        if now >= pending.expires_at {
            return TimingVerdict::Expired;
        }

        if let Some(reference) = reference {
            if reference > Decimal::ZERO {
                let distance = (price / reference - Decimal::ONE).abs();
                if distance <= self.config.immediate_band {
                    return TimingVerdict::Approve;
                }
            }
        }

        if now < pending.ready_at {
            return TimingVerdict::Hold {
                ready_at: pending.ready_at,
            };
        }

        let retracement = self.retracement(pending, price);
        if retracement > self.config.max_retracement {
            return TimingVerdict::Deferred { retracement };
        }

        TimingVerdict::Approve
    }

    /// Fraction of the original detection move given back since the anchor
    ///
    /// The window-start price is implied by the anchor and the detection's
    /// window return; a value of 1.0 means the move fully round-tripped.
    fn retracement(&self, pending: &PendingEntry, price: Decimal) -> f64 {
        let anchor = to_f64(pending.signal.anchor_price);
        let r = pending.signal.return_over_window;
        if anchor <= 0.0 || (1.0 + r) == 0.0 {
            return 0.0;
        }
        let start = anchor / (1.0 + r);
        let move_size = anchor - start;
        if move_size.abs() < f64::EPSILON {
            return 0.0;
        }
        (anchor - to_f64(price)) / move_size
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.try_into().unwrap_or(0.0)
}
