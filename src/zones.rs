//! Heart-rate zone distribution.
//!
//! Integrates time-in-zone from discrete heart-rate samples. Each sample owns the
//! interval up to the next one, capped so that a sensor dropout never dumps minutes
//! of time into a single zone.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{HeatmapError, Result};

/// Longest interval a single sample may account for, in milliseconds.
pub const MAX_SAMPLE_GAP_MS: i64 = 10_000;

/// Number of heart-rate zones.
pub const ZONE_COUNT: usize = 5;

/// A heart-rate reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct HeartRateSample {
    /// Unix timestamp in milliseconds
    pub timestamp_ms: i64,
    /// Beats per minute
    pub bpm: f64,
}

impl HeartRateSample {
    pub fn new(timestamp_ms: i64, bpm: f64) -> Self {
        Self { timestamp_ms, bpm }
    }
}

/// Configuration for HR zone classification.
///
/// Zone limits are fractions of the maximum heart rate: zone 1 is below
/// `zone1_limit`, zone 5 is at or above `zone4_limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct HrZoneConfig {
    /// Maximum heart rate in bpm (default: 190)
    pub max_heart_rate: f64,
    /// Upper bound of zone 1 (default: 0.60)
    pub zone1_limit: f64,
    /// Upper bound of zone 2 (default: 0.70)
    pub zone2_limit: f64,
    /// Upper bound of zone 3 (default: 0.80)
    pub zone3_limit: f64,
    /// Upper bound of zone 4 (default: 0.90)
    pub zone4_limit: f64,
}

impl Default for HrZoneConfig {
    fn default() -> Self {
        Self {
            max_heart_rate: 190.0,
            zone1_limit: 0.60,
            zone2_limit: 0.70,
            zone3_limit: 0.80,
            zone4_limit: 0.90,
        }
    }
}

impl HrZoneConfig {
    /// Build a validated configuration.
    pub fn new(max_heart_rate: f64, limits: [f64; 4]) -> Result<Self> {
        let config = Self {
            max_heart_rate,
            zone1_limit: limits[0],
            zone2_limit: limits[1],
            zone3_limit: limits[2],
            zone4_limit: limits[3],
        };
        config.validate()?;
        Ok(config)
    }

    pub fn limits(&self) -> [f64; 4] {
        [self.zone1_limit, self.zone2_limit, self.zone3_limit, self.zone4_limit]
    }

    /// Max HR must be positive and the limits strictly increasing and positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_heart_rate.is_finite() && self.max_heart_rate > 0.0) {
            return Err(HeatmapError::InvalidZoneConfig(format!(
                "max heart rate must be positive, got {}",
                self.max_heart_rate
            )));
        }
        let limits = self.limits();
        if !limits.iter().all(|l| l.is_finite() && *l > 0.0) {
            return Err(HeatmapError::InvalidZoneConfig(format!(
                "zone limits must be positive fractions, got {:?}",
                limits
            )));
        }
        if !limits.windows(2).all(|w| w[0] < w[1]) {
            return Err(HeatmapError::InvalidZoneConfig(format!(
                "zone limits must be strictly increasing, got {:?}",
                limits
            )));
        }
        Ok(())
    }

    /// Zone index (0-4) for a heart rate.
    pub fn classify(&self, bpm: f64) -> usize {
        let p = bpm / self.max_heart_rate;
        self.limits()
            .iter()
            .position(|limit| p < *limit)
            .unwrap_or(ZONE_COUNT - 1)
    }

    /// Zone boundaries in bpm, rounded down: `[z1, z2, z3, z4]`.
    pub fn zone_bpm_bounds(&self) -> [u32; 4] {
        self.limits().map(|l| (self.max_heart_rate * l) as u32)
    }
}

/// Minutes spent in each zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ZoneDurations {
    pub zone1_minutes: f64,
    pub zone2_minutes: f64,
    pub zone3_minutes: f64,
    pub zone4_minutes: f64,
    pub zone5_minutes: f64,
}

impl ZoneDurations {
    fn from_seconds(seconds: [f64; ZONE_COUNT]) -> Self {
        Self {
            zone1_minutes: seconds[0] / 60.0,
            zone2_minutes: seconds[1] / 60.0,
            zone3_minutes: seconds[2] / 60.0,
            zone4_minutes: seconds[3] / 60.0,
            zone5_minutes: seconds[4] / 60.0,
        }
    }

    pub fn as_array(&self) -> [f64; ZONE_COUNT] {
        [
            self.zone1_minutes,
            self.zone2_minutes,
            self.zone3_minutes,
            self.zone4_minutes,
            self.zone5_minutes,
        ]
    }

    pub fn total_minutes(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

/// Time in each zone for time-ordered samples.
///
/// Each sample is credited with the gap to the next one, capped at
/// [`MAX_SAMPLE_GAP_MS`]. The last sample contributes nothing. Out-of-order pairs
/// contribute nothing.
///
/// ```rust
/// use pitch_heatmap::{HeartRateSample, HrZoneConfig, calculate_zone_durations};
///
/// let config = HrZoneConfig::new(200.0, [0.6, 0.7, 0.8, 0.9]).unwrap();
/// let samples = [HeartRateSample::new(0, 100.0), HeartRateSample::new(60_000, 100.0)];
/// let zones = calculate_zone_durations(&samples, &config);
/// // 60s gap capped to 10s
/// assert!((zones.zone1_minutes - 10.0 / 60.0).abs() < 1e-12);
/// ```
pub fn calculate_zone_durations(samples: &[HeartRateSample], config: &HrZoneConfig) -> ZoneDurations {
    let mut seconds = [0.0; ZONE_COUNT];

    for pair in samples.windows(2) {
        let gap_ms = pair[1]
            .timestamp_ms
            .saturating_sub(pair[0].timestamp_ms)
            .clamp(0, MAX_SAMPLE_GAP_MS);
        seconds[config.classify(pair[0].bpm)] += gap_ms as f64 / 1000.0;
    }

    let durations = ZoneDurations::from_seconds(seconds);
    debug!(
        "[PitchHeatmap] zone durations from {} samples: {:?}",
        samples.len(),
        durations.as_array()
    );
    durations
}
