//! Extreme move detection over rolling bar windows

mod extreme;
mod types;
mod volume;

pub use extreme::ExtremeDetector;
pub use types::{DeclineReason, DetectionOutcome, DetectionResult, MoveDirection};
pub use volume::HourlyVolumeProfile;
