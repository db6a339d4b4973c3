//! Recovery circuit breaker
//!
//! Automated recovery actions (resubscribes, state eviction, restarts) can
//! make an incident worse when retried in a tight loop. Each fault category
//! gets exponential backoff with jitter between attempts, and a circuit
//! that opens after repeated failures and stays open for a cooling-off
//! period before exactly one probe attempt is allowed through.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RecoveryConfig;

/// Failure domains tracked independently by the breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCategory {
    StaleData,
    MemoryPressure,
    ErrorRateSpike,
}

/// Why an attempt was refused
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefusalReason {
    CircuitOpen { remaining_secs: i64 },
    BackoffActive { wait_secs: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptDecision {
    Permitted,
    Refused(RefusalReason),
}

/// State changes worth surfacing to operators
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerTransition {
    Opened,
    Closed,
}

#[derive(Debug, Clone, Default)]
struct CategoryState {
    failure_count: u32,
    last_attempt: Option<DateTime<Utc>>,
    open_since: Option<DateTime<Utc>>,
}

pub struct CircuitBreaker {
    config: RecoveryConfig,
    states: HashMap<FaultCategory, CategoryState>,
}

impl CircuitBreaker {
    pub fn new(config: RecoveryConfig) -> Self {
        Self {
            config,
            states: HashMap::new(),
        }
    }

    /// Rule on whether a recovery attempt may proceed right now.
    ///
    /// Permitting an attempt records it as the latest attempt time, so a
    /// subsequent failure backs off from this call.
    pub fn check(
        &mut self,
        category: FaultCategory,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> (AttemptDecision, Option<BreakerTransition>) {
        let open_duration = Duration::seconds(self.config.open_duration_secs as i64);
        let state = self.states.entry(category).or_default();

        if let Some(opened) = state.open_since {
            let elapsed = now - opened;
            if elapsed < open_duration {
                let remaining = (open_duration - elapsed).num_seconds();
                return (
                    AttemptDecision::Refused(RefusalReason::CircuitOpen {
                        remaining_secs: remaining,
                    }),
                    None,
                );
            }
            // Cooling-off served: close and let one probe through
            state.open_since = None;
            state.failure_count = 0;
            state.last_attempt = Some(now);
            info!(?category, "circuit closed after cooling off");
            return (AttemptDecision::Permitted, Some(BreakerTransition::Closed));
        }

        if state.failure_count >= self.config.max_attempts {
            state.open_since = Some(now);
            warn!(
                ?category,
                failures = state.failure_count,
                open_secs = self.config.open_duration_secs,
                "circuit opened"
            );
            return (
                AttemptDecision::Refused(RefusalReason::CircuitOpen {
                    remaining_secs: self.config.open_duration_secs as i64,
                }),
                Some(BreakerTransition::Opened),
            );
        }

        if state.failure_count > 0 {
            if let Some(last) = state.last_attempt {
                let required = Self::backoff(&self.config, state.failure_count, rng);
                let elapsed = now - last;
                if elapsed < required {
                    let wait = (required - elapsed).num_seconds();
                    return (
                        AttemptDecision::Refused(RefusalReason::BackoffActive { wait_secs: wait }),
                        None,
                    );
                }
            }
        }

        state.last_attempt = Some(now);
        (AttemptDecision::Permitted, None)
    }

    /// Backoff doubles per failure, capped, with up to `jitter_fraction`
    /// extra so synchronized retries spread out
    fn backoff(config: &RecoveryConfig, failures: u32, rng: &mut impl Rng) -> Duration {
        let exponent = failures.saturating_sub(1).min(16);
        let raw = config.base_backoff_secs.saturating_mul(1u64 << exponent);
        let capped = raw.min(config.max_backoff_secs);
        let jitter = if config.jitter_fraction > 0.0 {
            rng.gen_range(0.0..=config.jitter_fraction)
        } else {
            0.0
        };
        let total = capped as f64 * (1.0 + jitter);
        Duration::seconds(total.round() as i64)
    }

    pub fn record_success(&mut self, category: FaultCategory) {
        let state = self.states.entry(category).or_default();
        state.failure_count = 0;
        state.open_since = None;
    }

    pub fn record_failure(&mut self, category: FaultCategory) {
        let state = self.states.entry(category).or_default();
        state.failure_count += 1;
    }

    pub fn failure_count(&self, category: FaultCategory) -> u32 {
        self.states
            .get(&category)
            .map(|s| s.failure_count)
            .unwrap_or(0)
    }

    pub fn open_since(&self, category: FaultCategory) -> Option<DateTime<Utc>> {
        self.states.get(&category).and_then(|s| s.open_since)
    }
}
