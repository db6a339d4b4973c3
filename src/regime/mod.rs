//! Market regime classification

mod classifier;

pub use classifier::{RegimeLabel, RegimeModel, RegimeState, ThresholdClassifier};
