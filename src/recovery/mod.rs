//! Health monitoring and rate-limited self-recovery

mod breaker;
mod health;

pub use breaker::{
    AttemptDecision, BreakerTransition, CircuitBreaker, FaultCategory, RefusalReason,
};
pub use health::{HealthCheck, HealthMonitor, HealthReport, HealthSnapshot, RecoveryOutcome};
