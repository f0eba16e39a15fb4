use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};

/// Default measurement-noise magnitude placed on the diagonal of R
pub const DEFAULT_MEASUREMENT_NOISE: f64 = 29.0;

/// Acceleration-noise variance scaling the discretized Q blocks
pub const ACCELERATION_NOISE_VARIANCE: f64 = 0.0625;

/// Smallest interval substituted by [`IntervalPolicy::Clamp`] unless overridden [s]
pub const DEFAULT_MIN_INTERVAL: f64 = 1e-3;

/// What to do with a fix whose timestamp does not advance past the previous one
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IntervalPolicy {
    /// Return `DegenerateInterval` and leave the filter untouched
    #[default]
    Reject,
    /// Substitute `min_interval` for any shorter interval and run the cycle
    Clamp { min_interval: f64 },
}

impl IntervalPolicy {
    /// Clamp to [`DEFAULT_MIN_INTERVAL`]
    pub fn clamp() -> Self {
        IntervalPolicy::Clamp {
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }
}

/// Per-filter configuration, fixed for the filter's lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Diagonal of R
    pub measurement_noise: f64,

    /// σ in the per-axis process noise blocks
    pub acceleration_variance: f64,

    pub interval_policy: IntervalPolicy,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
            acceleration_variance: ACCELERATION_NOISE_VARIANCE,
            interval_policy: IntervalPolicy::Reject,
        }
    }
}

impl FilterConfig {
    pub fn with_measurement_noise(mut self, r: f64) -> Self {
        self.measurement_noise = r;
        self
    }

    pub fn with_acceleration_variance(mut self, sigma: f64) -> Self {
        self.acceleration_variance = sigma;
        self
    }

    pub fn with_interval_policy(mut self, policy: IntervalPolicy) -> Self {
        self.interval_policy = policy;
        self
    }

    /// Parse a (possibly partial) JSON document; missing keys take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: FilterConfig = serde_json::from_str(json)
            .map_err(|e| FilterError::InvalidConfig(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// R must stay positive definite and Q non-negative.
    pub fn validate(&self) -> Result<()> {
        if !self.measurement_noise.is_finite() || self.measurement_noise <= 0.0 {
            return Err(FilterError::InvalidConfig(format!(
                "measurement_noise must be finite and positive, got {}",
                self.measurement_noise
            )));
        }
        if !self.acceleration_variance.is_finite() || self.acceleration_variance < 0.0 {
            return Err(FilterError::InvalidConfig(format!(
                "acceleration_variance must be finite and non-negative, got {}",
                self.acceleration_variance
            )));
        }
        if let IntervalPolicy::Clamp { min_interval } = self.interval_policy {
            if !min_interval.is_finite() || min_interval <= 0.0 {
                return Err(FilterError::InvalidConfig(format!(
                    "min_interval must be finite and positive, got {}",
                    min_interval
                )));
            }
        }
        Ok(())
    }
}
