//! Strategy engine
//!
//! Owns every layer of the decision pipeline and wires them together:
//! bars flow into detection, detections flow through regime, risk, and
//! timing gates, and account updates keep the halting layers current.
//! The engine holds all state itself; callers construct one per strategy
//! instance and drive it from whatever runtime they use.

use std::collections::HashMap;
use std::mem;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use tracing::debug;

use crate::anchor::{AnchorTrack, AnchorTracker, TrackUpdate};
use crate::config::Config;
use crate::detector::{DeclineReason, DetectionOutcome, DetectionResult, ExtremeDetector};
use crate::gate::{
    EntryTimingGate, ExecutionGuard, GuardContext, GuardDecision, PendingEntry, TimingVerdict,
};
use crate::market::{Bar, SymbolState};
use crate::recovery::{
    BreakerTransition, FaultCategory, HealthMonitor, HealthReport, HealthSnapshot, RecoveryOutcome,
};
use crate::regime::{RegimeModel, RegimeState, ThresholdClassifier};
use crate::risk::{
    CascadeVeto, DrawdownLadder, DynamicSizer, PsychologicalRiskScore, PvsState, TradeHistory,
    TradeRecord,
};
use crate::signal::TradeSignal;
use crate::telemetry::{self, CounterMetric, GaugeMetric, StrategyEvent};

pub struct StrategyEngine {
    config: Config,
    detector: ExtremeDetector,
    regime_model: Box<dyn RegimeModel>,
    anchor_tracker: AnchorTracker,
    ladder: DrawdownLadder,
    pvs: PsychologicalRiskScore,
    cascade: CascadeVeto,
    sizer: DynamicSizer,
    timing: EntryTimingGate,
    guard: ExecutionGuard,
    health: HealthMonitor,
    history: TradeHistory,

    symbols: HashMap<String, SymbolState>,
    bars: HashMap<String, Vec<Bar>>,
    pending: HashMap<String, PendingEntry>,
    bar_capacity: usize,

    current_regime: RegimeState,
    last_pvs: PvsState,
    last_equity: Decimal,
    last_bar_at: Option<DateTime<Utc>>,
    open_positions: usize,

    events: Vec<StrategyEvent>,
    rng: StdRng,
}

impl StrategyEngine {
    /// Build an engine with the threshold regime classifier
    pub fn new(config: Config) -> Self {
        let model = Box::new(ThresholdClassifier::new(config.regime.clone()));
        Self::with_model(config, model)
    }

    /// Build an engine around a caller-supplied regime model
    pub fn with_model(config: Config, regime_model: Box<dyn RegimeModel>) -> Self {
        let rng = match config.engine.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let current_regime = regime_model.classify(None);
        let bar_capacity = config
            .detector
            .window_bars
            .max(config.sizing.atr_period + 1);

        Self {
            detector: ExtremeDetector::new(config.detector.clone()),
            anchor_tracker: AnchorTracker::new(config.anchor.clone()),
            ladder: DrawdownLadder::new(config.drawdown.clone()),
            pvs: PsychologicalRiskScore::new(config.pvs.clone()),
            cascade: CascadeVeto::new(config.cascade.clone()),
            sizer: DynamicSizer::new(config.sizing.clone()),
            timing: EntryTimingGate::new(config.timing.clone()),
            guard: ExecutionGuard::new(),
            health: HealthMonitor::new(config.health.clone(), config.recovery.clone()),
            history: TradeHistory::default(),
            symbols: HashMap::new(),
            bars: HashMap::new(),
            pending: HashMap::new(),
            bar_capacity,
            current_regime,
            last_pvs: PvsState::default(),
            last_equity: Decimal::ZERO,
            last_bar_at: None,
            open_positions: 0,
            events: Vec::new(),
            rng,
            regime_model,
            config,
        }
    }

    /// Feed one closed bar for a symbol.
    ///
    /// Advances any live anchor track first so the track never consumes the
    /// bar that re-anchors it, then runs detection. A firing detection is
    /// pushed through the full gate pipeline in the same call.
    pub fn on_bar(&mut self, symbol: &str, bar: Bar) -> DetectionOutcome {
        let detected_at = bar.timestamp;
        self.last_bar_at = Some(detected_at);

        let volume_capacity = self.config.detector.volume_history_per_hour;
        let state = self
            .symbols
            .entry(symbol.to_string())
            .or_insert_with(|| SymbolState::new(volume_capacity));

        let mut deactivation = None;
        if let Some(track) = state.track.as_mut() {
            if let TrackUpdate::Deactivated(reason) = self.anchor_tracker.advance(track, &bar) {
                deactivation = Some(reason);
            }
        }
        if deactivation.is_some() {
            state.track = None;
        }
        if let Some(reason) = deactivation {
            self.emit(StrategyEvent::TrackDeactivated {
                symbol: symbol.to_string(),
                reason,
            });
        }

        let window = self.bars.entry(symbol.to_string()).or_default();
        window.push(bar);
        if window.len() > self.bar_capacity {
            let excess = window.len() - self.bar_capacity;
            window.drain(..excess);
        }

        let outcome = match (self.bars.get(symbol), self.symbols.get_mut(symbol)) {
            (Some(bars), Some(state)) => self.detector.evaluate(symbol, bars, state, detected_at),
            _ => DetectionOutcome::Declined(DeclineReason::InsufficientHistory {
                have: 0,
                need: self.config.detector.window_bars,
            }),
        };

        if let Some(detection) = outcome.fired() {
            telemetry::increment(CounterMetric::DetectionsFired);
            let detection = detection.clone();
            self.open_track(symbol, &detection);
            self.process_detection(symbol, detection);
        }

        outcome
    }

    fn open_track(&mut self, symbol: &str, detection: &DetectionResult) {
        let track = self.anchor_tracker.open(symbol, detection);
        let anchor_price = track.anchor_price;
        if let Some(state) = self.symbols.get_mut(symbol) {
            state.track = Some(track);
        }
        self.emit(StrategyEvent::TrackOpened {
            symbol: symbol.to_string(),
            anchor_price,
        });
    }

    /// Run a fresh detection through cascade, sizing, the execution guard,
    /// and the timing gate
    fn process_detection(&mut self, symbol: &str, detection: DetectionResult) {
        let verdict = self.cascade.evaluate(
            detection.z_score,
            self.last_pvs.score,
            self.current_regime.confidence(),
            &self.history,
            detection.detected_at,
        );

        let bars = self.bars.get(symbol).map(Vec::as_slice).unwrap_or_default();
        let breakdown = self.sizer.compute(
            detection.z_score,
            bars,
            self.current_regime.size_multiplier,
            self.ladder.multiplier(),
            self.last_pvs.size_multiplier(),
        );

        let decision = self.guard.check(&GuardContext {
            drawdown_halt: self.ladder.should_halt(),
            drawdown_rung: self.ladder.rung(),
            pvs: &self.last_pvs,
            cascade: &verdict,
            regime: &self.current_regime,
            z_score: detection.z_score,
            edge_z_threshold: self.config.cascade.edge_z_threshold,
            open_positions: self.open_positions,
            max_open_positions: self.config.engine.max_open_positions,
            size: breakdown.size,
            min_size: self.config.sizing.min_size,
        });

        let reason = match decision {
            GuardDecision::Allow => {
                let signal = TradeSignal::new(
                    symbol,
                    &detection,
                    self.current_regime.clone(),
                    breakdown.size,
                    detection.detected_at,
                )
                .with_rationale(format!(
                    "z-score {:.2} on {:.2}% window move, volume {:.2}x median",
                    detection.z_score,
                    detection.return_over_window * 100.0,
                    detection.volume_anomaly_ratio,
                ))
                .with_rationale(format!(
                    "sized {} = {} base x {} edge x {} regime x {} drawdown x {} pvs",
                    breakdown.size,
                    breakdown.base,
                    breakdown.edge_multiplier,
                    breakdown.regime_multiplier,
                    breakdown.drawdown_multiplier,
                    breakdown.pvs_multiplier,
                ));

                if self.timing.enabled() {
                    let pending = self.timing.open(signal, detection.detected_at, &mut self.rng);
                    let ready_at = pending.ready_at;
                    self.pending.insert(symbol.to_string(), pending);
                    self.emit(StrategyEvent::SignalPending {
                        symbol: symbol.to_string(),
                        ready_at,
                    });
                } else {
                    telemetry::increment(CounterMetric::SignalsApproved);
                    self.emit(StrategyEvent::SignalApproved { signal });
                }
                return;
            }
            GuardDecision::Deny(reason) => reason,
        };

        telemetry::increment(CounterMetric::SignalsVetoed);
        self.emit(StrategyEvent::SignalVetoed {
            symbol: symbol.to_string(),
            reason,
        });
    }

    /// Poll a parked entry against the latest price.
    ///
    /// Returns the signal once it clears the timing gate and a final guard
    /// re-check; halting conditions that arose during the wait still veto.
    pub fn poll_pending(
        &mut self,
        symbol: &str,
        now: DateTime<Utc>,
        price: Decimal,
    ) -> Option<TradeSignal> {
        let pending = self.pending.get(symbol)?;
        let reference = self
            .symbols
            .get(symbol)
            .and_then(|s| s.track.as_ref())
            .filter(|t| t.is_active)
            .map(|t| t.vwap());
        let verdict = self.timing.poll(pending, now, price, reference);

        match verdict {
            TimingVerdict::Approve => {
                let pending = self.pending.remove(symbol)?;
                self.approve_pending(symbol, pending.signal, now)
            }
            TimingVerdict::Expired => {
                self.pending.remove(symbol);
                telemetry::increment(CounterMetric::EntriesExpired);
                self.emit(StrategyEvent::EntryExpired {
                    symbol: symbol.to_string(),
                });
                None
            }
            TimingVerdict::Hold { .. } | TimingVerdict::Deferred { .. } => None,
        }
    }

    fn approve_pending(
        &mut self,
        symbol: &str,
        mut signal: TradeSignal,
        now: DateTime<Utc>,
    ) -> Option<TradeSignal> {
        let verdict = self.cascade.evaluate(
            signal.z_score,
            self.last_pvs.score,
            self.current_regime.confidence(),
            &self.history,
            now,
        );
        let decision = self.guard.check(&GuardContext {
            drawdown_halt: self.ladder.should_halt(),
            drawdown_rung: self.ladder.rung(),
            pvs: &self.last_pvs,
            cascade: &verdict,
            regime: &self.current_regime,
            z_score: signal.z_score,
            edge_z_threshold: self.config.cascade.edge_z_threshold,
            open_positions: self.open_positions,
            max_open_positions: self.config.engine.max_open_positions,
            size: signal.size,
            min_size: self.config.sizing.min_size,
        });

        match decision {
            GuardDecision::Allow => {
                signal.approved_at = now;
                telemetry::increment(CounterMetric::SignalsApproved);
                self.emit(StrategyEvent::SignalApproved {
                    signal: signal.clone(),
                });
                Some(signal)
            }
            GuardDecision::Deny(reason) => {
                telemetry::increment(CounterMetric::SignalsVetoed);
                self.emit(StrategyEvent::SignalVetoed {
                    symbol: symbol.to_string(),
                    reason,
                });
                None
            }
        }
    }

    /// Feed an equity reading plus the current volatility indicator.
    ///
    /// Updates the drawdown ladder, the psychological score, and the regime
    /// classification in that order.
    pub fn on_account_update(
        &mut self,
        now: DateTime<Utc>,
        equity: Decimal,
        vol_indicator: Option<f64>,
    ) {
        self.history.roll_day(now);
        self.last_equity = equity;

        let ladder_update = self.ladder.update(equity);
        if let Some(change) = ladder_update.change {
            self.emit(StrategyEvent::RungChanged {
                from: change.from,
                to: change.to,
                drawdown: change.drawdown,
            });
        }

        let pvs_update = self.pvs.evaluate(now, equity, vol_indicator, &self.history);
        if let Some((from, to)) = pvs_update.level_change {
            self.emit(StrategyEvent::PvsLevelChanged {
                from,
                to,
                score: pvs_update.state.score,
            });
        }
        if let Some(alert) = pvs_update.alert {
            self.emit(StrategyEvent::PvsAlert {
                level: alert.level,
                score: alert.score,
            });
        }
        self.last_pvs = pvs_update.state;

        let regime = self.regime_model.classify(vol_indicator);
        if regime.label != self.current_regime.label {
            self.emit(StrategyEvent::RegimeChanged {
                from: self.current_regime.label,
                to: regime.label,
                confidence: regime.confidence(),
            });
        }
        self.current_regime = regime;

        telemetry::set_gauge(GaugeMetric::Equity, to_f64(equity));
        telemetry::set_gauge(GaugeMetric::DrawdownPct, to_f64(self.ladder.drawdown()));
        telemetry::set_gauge(GaugeMetric::DrawdownRung, self.ladder.rung() as f64);
        telemetry::set_gauge(GaugeMetric::PvsScore, self.last_pvs.score);
        telemetry::set_gauge(
            GaugeMetric::RegimeConfidence,
            self.current_regime.confidence(),
        );
        telemetry::set_gauge(
            GaugeMetric::ConsecutiveLosses,
            self.history.consecutive_losses() as f64,
        );
    }

    /// Record a closed trade's realized pnl
    pub fn record_trade(&mut self, now: DateTime<Utc>, pnl: Decimal) {
        self.history.record_trade(TradeRecord {
            timestamp: now,
            pnl,
        });
    }

    /// Record a process rule violation (oversize, off-plan entry, ...)
    pub fn record_violation(&mut self, now: DateTime<Utc>, rule: impl Into<String>) {
        self.history.record_violation(now, rule);
    }

    /// Operator acknowledgement that resets the drawdown baseline
    pub fn reset_drawdown(&mut self, now: DateTime<Utc>) {
        self.ladder.reset(now);
        self.emit(StrategyEvent::LadderReset {
            peak_equity: self.ladder.peak_equity(),
        });
    }

    /// Record an operational error for the health monitor's rate window
    pub fn record_operational_error(&mut self, now: DateTime<Utc>) {
        self.health.record_error(now);
    }

    /// Run all health checks against current engine state
    pub fn health_check(&self, now: DateTime<Utc>) -> HealthReport {
        let snapshot = HealthSnapshot {
            last_bar_at: self.last_bar_at,
            tracked_symbols: self.symbols.len(),
        };
        telemetry::set_gauge(GaugeMetric::TrackedSymbols, self.symbols.len() as f64);
        self.health.evaluate(&snapshot, now)
    }

    /// Run a recovery action for a fault category under the circuit breaker
    pub fn run_recovery<F>(
        &mut self,
        category: FaultCategory,
        now: DateTime<Utc>,
        action: F,
    ) -> RecoveryOutcome
    where
        F: FnOnce() -> Result<(), String>,
    {
        telemetry::increment(CounterMetric::RecoveryAttempts);
        let (outcome, transition) = self
            .health
            .attempt_recovery(category, now, &mut self.rng, action);
        match transition {
            Some(BreakerTransition::Opened) => {
                self.emit(StrategyEvent::CircuitOpened { category })
            }
            Some(BreakerTransition::Closed) => {
                self.emit(StrategyEvent::CircuitClosed { category })
            }
            None => {}
        }
        outcome
    }

    /// Position count comes from the executing layer, which owns fills
    pub fn set_open_positions(&mut self, count: usize) {
        self.open_positions = count;
        telemetry::set_gauge(GaugeMetric::OpenPositions, count as f64);
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<StrategyEvent> {
        mem::take(&mut self.events)
    }

    fn emit(&mut self, event: StrategyEvent) {
        debug!(?event, "strategy event");
        self.events.push(event);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn current_regime(&self) -> &RegimeState {
        &self.current_regime
    }

    pub fn pvs_state(&self) -> &PvsState {
        &self.last_pvs
    }

    pub fn ladder(&self) -> &DrawdownLadder {
        &self.ladder
    }

    pub fn history(&self) -> &TradeHistory {
        &self.history
    }

    pub fn pending(&self, symbol: &str) -> Option<&PendingEntry> {
        self.pending.get(symbol)
    }

    pub fn track(&self, symbol: &str) -> Option<&AnchorTrack> {
        self.symbols.get(symbol).and_then(|s| s.track.as_ref())
    }

    pub fn tracked_symbols(&self) -> usize {
        self.symbols.len()
    }

    pub fn open_positions(&self) -> usize {
        self.open_positions
    }

    pub fn last_equity(&self) -> Decimal {
        self.last_equity
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.try_into().unwrap_or(0.0)
}
