//! Sync engine configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};

/// Default number of decimals kept on synthesized frames and values
pub const DEFAULT_ROUND_DECIMALS: u32 = 7;

/// Default share of the nominal interval a block may drift before it is rejected
pub const DEFAULT_MAX_DRIFT_RATIO: f64 = 0.5;

/// Drift correction configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncEngineConfig {
    /// A block whose surplus (after unwrapping) or deficit exceeds
    /// `max_drift_ratio * interval` is reported instead of corrected
    #[serde(default = "default_max_drift_ratio")]
    pub max_drift_ratio: f64,

    /// Decimal places kept on interpolated frames and channel values
    #[serde(default = "default_round_decimals")]
    pub round_decimals: u32,
}

impl Default for SyncEngineConfig {
    fn default() -> Self {
        Self {
            max_drift_ratio: DEFAULT_MAX_DRIFT_RATIO,
            round_decimals: DEFAULT_ROUND_DECIMALS,
        }
    }
}

impl SyncEngineConfig {
    /// Largest drift (in frames) still corrected for `interval`
    pub fn drift_tolerance(&self, interval: u64) -> f64 {
        self.max_drift_ratio * interval as f64
    }

    /// Whether `drift` frames exceeds the tolerance for `interval`
    pub fn exceeds_tolerance(&self, drift: u64, interval: u64) -> bool {
        drift as f64 > self.drift_tolerance(interval)
    }
}

fn default_max_drift_ratio() -> f64 {
    DEFAULT_MAX_DRIFT_RATIO
}

fn default_round_decimals() -> u32 {
    DEFAULT_ROUND_DECIMALS
}
