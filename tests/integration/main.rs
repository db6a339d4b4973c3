//! Integration test harness

mod pipeline_test;
mod recovery_test;
