//! Strategy metrics

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Current equity
    Equity,
    /// Drawdown from peak equity
    DrawdownPct,
    /// Active drawdown ladder rung
    DrawdownRung,
    /// Composite psychological risk score
    PvsScore,
    /// Open position count
    OpenPositions,
    /// Symbols with live state
    TrackedSymbols,
    /// Confidence of the current regime classification
    RegimeConfidence,
    /// Current loss streak length
    ConsecutiveLosses,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Extreme-move detections fired
    DetectionsFired,
    /// Signals that cleared every gate
    SignalsApproved,
    /// Signals refused at the execution guard
    SignalsVetoed,
    /// Pending entries dropped at expiry
    EntriesExpired,
    /// Recovery actions attempted
    RecoveryAttempts,
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let name = match metric {
        GaugeMetric::Equity => "sigma_edge_equity_usd",
        GaugeMetric::DrawdownPct => "sigma_edge_drawdown_pct",
        GaugeMetric::DrawdownRung => "sigma_edge_drawdown_rung",
        GaugeMetric::PvsScore => "sigma_edge_pvs_score",
        GaugeMetric::OpenPositions => "sigma_edge_open_positions",
        GaugeMetric::TrackedSymbols => "sigma_edge_tracked_symbols",
        GaugeMetric::RegimeConfidence => "sigma_edge_regime_confidence",
        GaugeMetric::ConsecutiveLosses => "sigma_edge_consecutive_losses",
    };
    metrics::gauge!(name).set(value);
}

/// Increment a counter
pub fn increment(metric: CounterMetric) {
    let name = match metric {
        CounterMetric::DetectionsFired => "sigma_edge_detections_fired_total",
        CounterMetric::SignalsApproved => "sigma_edge_signals_approved_total",
        CounterMetric::SignalsVetoed => "sigma_edge_signals_vetoed_total",
        CounterMetric::EntriesExpired => "sigma_edge_entries_expired_total",
        CounterMetric::RecoveryAttempts => "sigma_edge_recovery_attempts_total",
    };
    metrics::counter!(name).increment(1);
}
