//! Anchored VWAP reference tracking

mod tracker;

pub use tracker::{AnchorTrack, AnchorTracker, DeactivationReason, TrackUpdate};
