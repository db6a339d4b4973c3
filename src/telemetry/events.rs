//! Strategy event stream
//!
//! Every state transition an operator cares about is emitted as a typed
//! event. The engine buffers them per step; callers drain and forward to
//! whatever sink they run (log lines in live mode, JSON lines in replay).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::anchor::DeactivationReason;
use crate::gate::DenyReason;
use crate::recovery::FaultCategory;
use crate::regime::RegimeLabel;
use crate::risk::PvsLevel;
use crate::signal::TradeSignal;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StrategyEvent {
    RegimeChanged {
        from: RegimeLabel,
        to: RegimeLabel,
        confidence: f64,
    },
    RungChanged {
        from: usize,
        to: usize,
        drawdown: Decimal,
    },
    LadderReset {
        peak_equity: Decimal,
    },
    PvsLevelChanged {
        from: PvsLevel,
        to: PvsLevel,
        score: f64,
    },
    PvsAlert {
        level: PvsLevel,
        score: f64,
    },
    CircuitOpened {
        category: FaultCategory,
    },
    CircuitClosed {
        category: FaultCategory,
    },
    SignalApproved {
        signal: TradeSignal,
    },
    SignalVetoed {
        symbol: String,
        reason: DenyReason,
    },
    SignalPending {
        symbol: String,
        ready_at: DateTime<Utc>,
    },
    EntryExpired {
        symbol: String,
    },
    TrackOpened {
        symbol: String,
        anchor_price: Decimal,
    },
    TrackDeactivated {
        symbol: String,
        reason: DeactivationReason,
    },
}
