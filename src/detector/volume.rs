//! Hour-of-day volume baselines
//!
//! Intraday volume is strongly seasonal, so window sums are compared against
//! a rolling median of sums previously observed in the same hour of day.

use std::collections::VecDeque;

/// Rolling per-hour-of-day buffers of trailing-window volume sums
///
/// One bounded ring per hour (0-23). Samples are recorded after the caller
/// has taken its median, so a sum never compares against itself.
#[derive(Debug, Clone)]
pub struct HourlyVolumeProfile {
    buckets: [VecDeque<f64>; 24],
    capacity: usize,
}

impl HourlyVolumeProfile {
    /// Create a profile where each hour retains at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            buckets: std::array::from_fn(|_| VecDeque::new()),
            capacity,
        }
    }

    /// Record a trailing-window volume sum for the given hour of day
    pub fn record(&mut self, hour: u32, window_volume: f64) {
        let bucket = &mut self.buckets[(hour % 24) as usize];
        bucket.push_back(window_volume);
        while bucket.len() > self.capacity {
            bucket.pop_front();
        }
    }

    /// Number of samples recorded for the given hour
    pub fn samples(&self, hour: u32) -> usize {
        self.buckets[(hour % 24) as usize].len()
    }

    /// Median of recorded sums for the given hour, if any exist
    pub fn median(&self, hour: u32) -> Option<f64> {
        let bucket = &self.buckets[(hour % 24) as usize];
        if bucket.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = bucket.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }
}
