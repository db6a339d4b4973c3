//! Operational health checks and gated recovery
//!
//! Three checks run on a fixed tick: bar-data freshness, symbol-state
//! growth, and the operational error rate. Failing checks map onto the
//! circuit breaker's fault categories so recovery actions stay rate
//! limited even when a check fails on every tick.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{HealthConfig, RecoveryConfig};
use crate::recovery::breaker::{
    AttemptDecision, BreakerTransition, CircuitBreaker, FaultCategory, RefusalReason,
};

/// Point-in-time view of the engine handed to the monitor
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    pub last_bar_at: Option<DateTime<Utc>>,
    pub tracked_symbols: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
    pub category: FaultCategory,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub checks: Vec<HealthCheck>,
    pub evaluated_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn failures(&self) -> impl Iterator<Item = &HealthCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Result of one gated recovery attempt
#[derive(Debug, PartialEq)]
pub enum RecoveryOutcome {
    Recovered,
    Failed { error: String },
    Skipped(RefusalReason),
}

pub struct HealthMonitor {
    config: HealthConfig,
    breaker: CircuitBreaker,
    errors: VecDeque<DateTime<Utc>>,
}

impl HealthMonitor {
    pub fn new(config: HealthConfig, recovery: RecoveryConfig) -> Self {
        Self {
            config,
            breaker: CircuitBreaker::new(recovery),
            errors: VecDeque::new(),
        }
    }

    /// Record an operational error (feed drop, parse failure, io error)
    pub fn record_error(&mut self, now: DateTime<Utc>) {
        self.errors.push_back(now);
        let cutoff = now - Duration::seconds(self.config.error_window_secs as i64);
        while let Some(front) = self.errors.front() {
            if *front > cutoff {
                break;
            }
            self.errors.pop_front();
        }
    }

    pub fn errors_in_window(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::seconds(self.config.error_window_secs as i64);
        self.errors.iter().filter(|t| **t > cutoff).count()
    }

    /// Run all checks against a snapshot
    pub fn evaluate(&self, snapshot: &HealthSnapshot, now: DateTime<Utc>) -> HealthReport {
        let mut checks = Vec::with_capacity(3);

        let max_age = Duration::seconds(self.config.max_data_age_secs as i64);
        let (passed, detail) = match snapshot.last_bar_at {
            Some(last) => {
                let age = now - last;
                (
                    age <= max_age,
                    format!("last bar {}s ago", age.num_seconds()),
                )
            }
            None => (false, "no bars received".to_string()),
        };
        checks.push(HealthCheck {
            name: "data_freshness",
            passed,
            detail,
            category: FaultCategory::StaleData,
        });

        checks.push(HealthCheck {
            name: "symbol_capacity",
            passed: snapshot.tracked_symbols <= self.config.max_tracked_symbols,
            detail: format!(
                "{} of {} symbols tracked",
                snapshot.tracked_symbols, self.config.max_tracked_symbols
            ),
            category: FaultCategory::MemoryPressure,
        });

        let errors = self.errors_in_window(now);
        checks.push(HealthCheck {
            name: "error_rate",
            passed: errors <= self.config.max_errors_in_window,
            detail: format!(
                "{} errors in last {}s",
                errors, self.config.error_window_secs
            ),
            category: FaultCategory::ErrorRateSpike,
        });

        let healthy = checks.iter().all(|c| c.passed);
        if healthy {
            debug!("health checks passed");
        } else {
            for check in checks.iter().filter(|c| !c.passed) {
                warn!(check = check.name, detail = %check.detail, "health check failed");
            }
        }

        HealthReport {
            healthy,
            checks,
            evaluated_at: now,
        }
    }

    /// Run a recovery action if the breaker permits it, feeding the result
    /// back into the breaker
    pub fn attempt_recovery<F>(
        &mut self,
        category: FaultCategory,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
        action: F,
    ) -> (RecoveryOutcome, Option<BreakerTransition>)
    where
        F: FnOnce() -> Result<(), String>,
    {
        let (decision, transition) = self.breaker.check(category, now, rng);
        match decision {
            AttemptDecision::Refused(reason) => {
                debug!(?category, ?reason, "recovery attempt skipped");
                (RecoveryOutcome::Skipped(reason), transition)
            }
            AttemptDecision::Permitted => match action() {
                Ok(()) => {
                    self.breaker.record_success(category);
                    debug!(?category, "recovery action succeeded");
                    (RecoveryOutcome::Recovered, transition)
                }
                Err(error) => {
                    self.breaker.record_failure(category);
                    warn!(?category, %error, "recovery action failed");
                    (RecoveryOutcome::Failed { error }, transition)
                }
            },
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn monitor() -> HealthMonitor {
        let recovery = RecoveryConfig {
            jitter_fraction: 0.0,
            max_attempts: 2,
            ..RecoveryConfig::default()
        };
        HealthMonitor::new(HealthConfig::default(), recovery)
    }

    #[test]
    fn test_all_checks_pass_on_fresh_state() {
        let monitor = monitor();
        let snapshot = HealthSnapshot {
            last_bar_at: Some(ts(0)),
            tracked_symbols: 10,
        };

        let report = monitor.evaluate(&snapshot, ts(30));
        assert!(report.healthy);
        assert_eq!(report.checks.len(), 3);
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_stale_data_fails_freshness() {
        let monitor = monitor();
        let snapshot = HealthSnapshot {
            last_bar_at: Some(ts(0)),
            tracked_symbols: 10,
        };

        let report = monitor.evaluate(&snapshot, ts(300));
        assert!(!report.healthy);
        let failed: Vec<_> = report.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "data_freshness");
        assert_eq!(failed[0].category, FaultCategory::StaleData);
    }

    #[test]
    fn test_no_bars_is_stale() {
        let monitor = monitor();
        let snapshot = HealthSnapshot {
            last_bar_at: None,
            tracked_symbols: 0,
        };

        let report = monitor.evaluate(&snapshot, ts(0));
        assert!(!report.healthy);
        assert!(report.failures().any(|c| c.name == "data_freshness"));
    }

    #[test]
    fn test_symbol_growth_fails_capacity() {
        let monitor = monitor();
        let snapshot = HealthSnapshot {
            last_bar_at: Some(ts(0)),
            tracked_symbols: 51,
        };

        let report = monitor.evaluate(&snapshot, ts(10));
        assert!(report.failures().any(|c| c.name == "symbol_capacity"));
    }

    #[test]
    fn test_error_rate_window_slides() {
        let mut monitor = monitor();
        for i in 0..11 {
            monitor.record_error(ts(i));
        }
        let snapshot = HealthSnapshot {
            last_bar_at: Some(ts(11)),
            tracked_symbols: 1,
        };

        // Eleven errors inside the 300s window
        let report = monitor.evaluate(&snapshot, ts(20));
        assert!(report.failures().any(|c| c.name == "error_rate"));

        // Same errors no longer count once the window slides past them
        let snapshot = HealthSnapshot {
            last_bar_at: Some(ts(400)),
            tracked_symbols: 1,
        };
        let report = monitor.evaluate(&snapshot, ts(400));
        assert!(report.healthy);
        assert_eq!(monitor.errors_in_window(ts(400)), 0);
    }

    #[test]
    fn test_recovery_success_path() {
        let mut monitor = monitor();
        let mut rng = StdRng::seed_from_u64(5);

        let (outcome, transition) =
            monitor.attempt_recovery(FaultCategory::StaleData, ts(0), &mut rng, || Ok(()));
        assert_eq!(outcome, RecoveryOutcome::Recovered);
        assert_eq!(transition, None);
        assert_eq!(monitor.breaker().failure_count(FaultCategory::StaleData), 0);
    }

    #[test]
    fn test_failed_recoveries_open_the_circuit() {
        let mut monitor = monitor();
        let mut rng = StdRng::seed_from_u64(5);

        let (outcome, _) = monitor.attempt_recovery(FaultCategory::StaleData, ts(0), &mut rng, || {
            Err("resubscribe refused".to_string())
        });
        assert_eq!(
            outcome,
            RecoveryOutcome::Failed {
                error: "resubscribe refused".to_string()
            }
        );

        // Second failure past the backoff reaches max_attempts
        let (outcome, _) =
            monitor.attempt_recovery(FaultCategory::StaleData, ts(100), &mut rng, || {
                Err("still down".to_string())
            });
        assert!(matches!(outcome, RecoveryOutcome::Failed { .. }));

        let (outcome, transition) =
            monitor.attempt_recovery(FaultCategory::StaleData, ts(500), &mut rng, || Ok(()));
        assert!(matches!(
            outcome,
            RecoveryOutcome::Skipped(RefusalReason::CircuitOpen { .. })
        ));
        assert_eq!(transition, Some(BreakerTransition::Opened));
    }

    #[test]
    fn test_backoff_skips_rapid_retries() {
        let mut monitor = monitor();
        let mut rng = StdRng::seed_from_u64(5);

        let (_, _) = monitor.attempt_recovery(FaultCategory::ErrorRateSpike, ts(0), &mut rng, || {
            Err("boom".to_string())
        });

        // Ten seconds later the 60s backoff is still running; the action
        // must not run at all
        let (outcome, _) =
            monitor.attempt_recovery(FaultCategory::ErrorRateSpike, ts(10), &mut rng, || {
                panic!("action ran during backoff")
            });
        assert_eq!(
            outcome,
            RecoveryOutcome::Skipped(RefusalReason::BackoffActive { wait_secs: 50 })
        );
    }
}
