//! Per-symbol rolling state

use chrono::{DateTime, Utc};

use crate::anchor::AnchorTrack;
use crate::detector::HourlyVolumeProfile;

/// Mutable state the strategy keeps for one symbol
///
/// Owned by the engine and passed to the detector by mutable reference;
/// nothing here is shared or global.
#[derive(Debug, Clone)]
pub struct SymbolState {
    /// Hour-of-day volume history for anomaly detection
    pub volume_profile: HourlyVolumeProfile,
    /// Last time a detection fired for this symbol
    pub last_detection: Option<DateTime<Utc>>,
    /// Active anchored VWAP track, if any
    pub track: Option<AnchorTrack>,
}

impl SymbolState {
    /// Create empty state with the given volume-history capacity per hour
    pub fn new(volume_capacity: usize) -> Self {
        Self {
            volume_profile: HourlyVolumeProfile::new(volume_capacity),
            last_detection: None,
            track: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_empty() {
        let state = SymbolState::new(30);
        assert!(state.last_detection.is_none());
        assert!(state.track.is_none());
        assert!(state.volume_profile.median(9).is_none());
    }
}
