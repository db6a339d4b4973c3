//! End-to-end pipeline tests: bars in, events and approved signals out.
//!
//! Everything here goes through the public engine surface the binary uses,
//! so the scenarios double as documentation of the decision flow.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use sigma_edge::anchor::DeactivationReason;
use sigma_edge::config::Config;
use sigma_edge::detector::{DeclineReason, DetectionOutcome, MoveDirection};
use sigma_edge::engine::StrategyEngine;
use sigma_edge::gate::DenyReason;
use sigma_edge::market::Bar;
use sigma_edge::telemetry::StrategyEvent;

const SYMBOL: &str = "ETHUSDT";

fn base_time() -> DateTime<Utc> {
    // 08:00 keeps the warmup hour and the detection hour distinct
    Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap()
}

fn seeded_config() -> Config {
    let mut config = Config::default();
    config.engine.rng_seed = Some(11);
    config
}

fn bar(minute: i64, close: Decimal, volume: Decimal) -> Bar {
    Bar {
        timestamp: base_time() + Duration::minutes(minute),
        open: close,
        high: close + dec!(0.05),
        low: close - dec!(0.05),
        close,
        volume,
    }
}

fn wavy_close(minute: i64) -> Decimal {
    if minute % 2 == 0 {
        dec!(100.05)
    } else {
        dec!(99.95)
    }
}

/// 60 quiet bars in hour 8 plus 5 in hour 9, then a 0.5% jump on
/// roughly 1.6x the hour's median window volume at 09:05.
fn feed_spike(engine: &mut StrategyEngine) -> DetectionOutcome {
    for minute in 0..65 {
        let outcome = engine.on_bar(SYMBOL, bar(minute, wavy_close(minute), dec!(100)));
        assert!(!outcome.is_fired(), "warmup bar must not fire");
    }
    engine.on_bar(SYMBOL, bar(65, dec!(100.45), dec!(3500)))
}

#[test]
fn test_shipped_example_config_is_valid() {
    let config = Config::from_toml(include_str!("../../config.toml.example"))
        .expect("example config must parse and validate");
    assert_eq!(config.detector.window_bars, 60);
    assert_eq!(config.drawdown.thresholds.len(), 4);
    assert!(config.timing.enabled);
}

#[test]
fn test_spike_flows_through_timing_to_approved_signal() {
    let mut engine = StrategyEngine::new(seeded_config());
    engine.on_account_update(base_time() - Duration::hours(1), dec!(10000), Some(12.0));
    engine.drain_events();

    let outcome = feed_spike(&mut engine);
    assert!(outcome.is_fired(), "spike must fire: {:?}", outcome);
    assert!(engine.pending(SYMBOL).is_some(), "entry parked behind timing gate");
    assert!(engine.track(SYMBOL).is_some(), "anchored reference opened");

    let events = engine.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, StrategyEvent::TrackOpened { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, StrategyEvent::SignalPending { .. })));

    // Past the longest possible wait, price holding next to the anchor VWAP
    let poll_at = base_time() + Duration::minutes(100);
    let signal = engine
        .poll_pending(SYMBOL, poll_at, dec!(100.40))
        .expect("entry approved after the wait");

    assert_eq!(signal.symbol, SYMBOL);
    assert_eq!(signal.direction, MoveDirection::Up);
    assert_eq!(signal.approved_at, poll_at);
    assert!(signal.z_score > 3.0 && signal.z_score < 3.7, "z was {}", signal.z_score);
    assert!(signal.size >= engine.config().sizing.min_size);
    assert!(!signal.rationale.is_empty());
    assert!(engine.pending(SYMBOL).is_none());

    let events = engine.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, StrategyEvent::SignalApproved { .. })));
}

#[test]
fn test_cooldown_suppresses_immediate_refire() {
    let mut engine = StrategyEngine::new(seeded_config());
    let outcome = feed_spike(&mut engine);
    assert!(outcome.is_fired());

    for minute in 66..70 {
        engine.on_bar(SYMBOL, bar(minute, wavy_close(minute), dec!(100)));
    }
    // A second, larger jump five minutes after the first
    let outcome = engine.on_bar(SYMBOL, bar(70, dec!(100.90), dec!(3500)));
    assert!(matches!(
        outcome,
        DetectionOutcome::Declined(DeclineReason::CooldownActive { .. })
    ));
}

#[test]
fn test_drawdown_halt_vetoes_fired_detection() {
    let mut engine = StrategyEngine::new(seeded_config());
    let morning = base_time() - Duration::hours(1);
    engine.on_account_update(morning, dec!(10000), Some(12.0));
    // 45% underwater pins the ladder on its halt rung
    engine.on_account_update(morning + Duration::minutes(30), dec!(5500), Some(12.0));
    assert!(engine.ladder().should_halt());
    engine.drain_events();

    let outcome = feed_spike(&mut engine);
    assert!(outcome.is_fired(), "detection itself still runs while halted");
    assert!(engine.pending(SYMBOL).is_none(), "no entry may be parked");

    let events = engine.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        StrategyEvent::SignalVetoed {
            reason: DenyReason::DrawdownHalt { rung: 4 },
            ..
        }
    )));
}

#[test]
fn test_high_vol_regime_demands_double_edge() {
    let mut engine = StrategyEngine::new(seeded_config());
    engine.on_account_update(base_time() - Duration::hours(1), dec!(10000), Some(30.0));
    engine.drain_events();

    let outcome = feed_spike(&mut engine);
    assert!(outcome.is_fired());

    // z near 3.4 clears the base bar but not twice it
    let events = engine.drain_events();
    let veto = events.iter().find_map(|e| match e {
        StrategyEvent::SignalVetoed { reason, .. } => Some(reason.clone()),
        _ => None,
    });
    match veto {
        Some(DenyReason::DoubleEdgeRequired { required, .. }) => {
            assert_eq!(required, 4.0);
        }
        other => panic!("expected double-edge veto, got {:?}", other),
    }
}

#[test]
fn test_destructive_morning_halts_entries_via_risk_score() {
    let mut engine = StrategyEngine::new(seeded_config());
    let day_start = base_time() - Duration::hours(8);

    // A loss every hour overnight, then a five-minute revenge burst
    for hour in 0..7 {
        engine.record_trade(day_start + Duration::hours(hour), dec!(-40));
    }
    for i in 1..6 {
        engine.record_trade(day_start + Duration::hours(6) + Duration::minutes(i * 5), dec!(-40));
    }
    for _ in 0..4 {
        engine.record_violation(day_start + Duration::hours(6), "oversized entry");
    }
    engine.on_account_update(day_start + Duration::minutes(390), dec!(4000), Some(35.0));

    assert!(engine.pvs_state().should_halt(), "score was {}", engine.pvs_state().score);
    engine.drain_events();

    let outcome = feed_spike(&mut engine);
    assert!(outcome.is_fired());
    assert!(engine.pending(SYMBOL).is_none());

    let events = engine.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        StrategyEvent::SignalVetoed {
            reason: DenyReason::PvsHalt { .. },
            ..
        }
    )));
}

#[test]
fn test_reference_track_retires_on_time_stop() {
    let mut engine = StrategyEngine::new(seeded_config());
    let outcome = feed_spike(&mut engine);
    assert!(outcome.is_fired());
    engine.drain_events();

    // Price pins to the anchor so only the clock can retire the track
    for minute in 66..=306 {
        engine.on_bar(SYMBOL, bar(minute, dec!(100.45), dec!(100)));
    }

    assert!(engine.track(SYMBOL).is_none());
    let events = engine.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        StrategyEvent::TrackDeactivated {
            reason: DeactivationReason::TimeStop { .. },
            ..
        }
    )));
}
