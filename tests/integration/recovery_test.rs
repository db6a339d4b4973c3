//! Health checks and breaker-gated recovery driven through the engine.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;

use sigma_edge::config::Config;
use sigma_edge::engine::StrategyEngine;
use sigma_edge::market::Bar;
use sigma_edge::recovery::{FaultCategory, RecoveryOutcome, RefusalReason};
use sigma_edge::telemetry::StrategyEvent;

const SYMBOL: &str = "BTCUSDT";

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap() + Duration::seconds(secs)
}

fn engine(max_attempts: u32) -> StrategyEngine {
    let mut config = Config::default();
    config.engine.rng_seed = Some(3);
    config.recovery.jitter_fraction = 0.0;
    config.recovery.max_attempts = max_attempts;
    StrategyEngine::new(config)
}

fn bar(at: DateTime<Utc>) -> Bar {
    Bar {
        timestamp: at,
        open: dec!(100),
        high: dec!(100.1),
        low: dec!(99.9),
        close: dec!(100),
        volume: dec!(250),
    }
}

#[test]
fn test_health_reflects_data_staleness() {
    let mut engine = engine(2);

    // Nothing received yet
    let report = engine.health_check(ts(0));
    assert!(!report.healthy);
    assert!(report.failures().any(|c| c.name == "data_freshness"));

    engine.on_bar(SYMBOL, bar(ts(0)));
    assert!(engine.health_check(ts(60)).healthy);
    assert!(!engine.health_check(ts(300)).healthy);
}

#[test]
fn test_error_burst_flags_unhealthy_until_window_slides() {
    let mut engine = engine(2);
    engine.on_bar(SYMBOL, bar(ts(0)));
    for i in 0..11 {
        engine.record_operational_error(ts(i));
    }

    let report = engine.health_check(ts(20));
    assert!(!report.healthy);
    assert!(report.failures().any(|c| c.name == "error_rate"));

    engine.on_bar(SYMBOL, bar(ts(310)));
    assert!(engine.health_check(ts(320)).healthy);
}

#[test]
fn test_breaker_opens_skips_and_closes_through_engine() {
    let mut engine = engine(2);

    let outcome = engine.run_recovery(FaultCategory::StaleData, ts(0), || {
        Err("resubscribe refused".to_string())
    });
    assert_eq!(
        outcome,
        RecoveryOutcome::Failed {
            error: "resubscribe refused".to_string()
        }
    );

    // Past the 60s backoff, still failing; this reaches the attempt cap
    let outcome = engine.run_recovery(FaultCategory::StaleData, ts(70), || {
        Err("still down".to_string())
    });
    assert!(matches!(outcome, RecoveryOutcome::Failed { .. }));

    let outcome = engine.run_recovery(FaultCategory::StaleData, ts(200), || {
        panic!("action must not run while the circuit is open")
    });
    assert!(matches!(
        outcome,
        RecoveryOutcome::Skipped(RefusalReason::CircuitOpen { .. })
    ));
    let events = engine.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        StrategyEvent::CircuitOpened {
            category: FaultCategory::StaleData
        }
    )));

    // After the open window the probe runs and closes the circuit
    let outcome = engine.run_recovery(FaultCategory::StaleData, ts(3800), || Ok(()));
    assert_eq!(outcome, RecoveryOutcome::Recovered);
    let events = engine.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        StrategyEvent::CircuitClosed {
            category: FaultCategory::StaleData
        }
    )));

    // Failure count was reset on close
    let outcome = engine.run_recovery(FaultCategory::StaleData, ts(3810), || Ok(()));
    assert_eq!(outcome, RecoveryOutcome::Recovered);
}

#[test]
fn test_backoff_refuses_rapid_engine_retries() {
    let mut engine = engine(5);

    let _ = engine.run_recovery(FaultCategory::ErrorRateSpike, ts(0), || {
        Err("boom".to_string())
    });
    let outcome = engine.run_recovery(FaultCategory::ErrorRateSpike, ts(10), || {
        panic!("action ran during backoff")
    });
    assert_eq!(
        outcome,
        RecoveryOutcome::Skipped(RefusalReason::BackoffActive { wait_secs: 50 })
    );
    assert!(
        engine.drain_events().is_empty(),
        "a skipped retry is not a breaker transition"
    );
}
