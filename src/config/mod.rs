/// Autoscaler Configuration
///
/// Typed configuration for the control loop and the sizing algorithm.
/// Validated once up front; runtime changes (the profile switch) go through
/// the engine, which holds the active configuration.

use crate::error::{Result, ScalerError};
use crate::scaler::ScaleProfile;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerConfig {
    /// Seconds between autoscale iterations.
    pub sleep_interval_secs: u64,
    /// Sizing policy profile.
    pub profile: ScaleProfile,
    /// Desired PG count per device; feeds each subtree's full-capacity
    /// PG budget.
    pub mon_target_pg_per_osd: u32,
    /// Advisory per-device ceiling, consulted by observers rather than
    /// enforced here.
    pub mon_max_pg_per_osd: u32,
    /// Hysteresis factor gating adjustments. Must be >= 2.0 so the next
    /// power of two in either direction always crosses it.
    pub threshold: f64,
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self {
            sleep_interval_secs: 60,
            profile: ScaleProfile::ScaleUp,
            mon_target_pg_per_osd: 100,
            mon_max_pg_per_osd: 250,
            threshold: 3.0,
        }
    }
}

impl ScalerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sleep_interval_secs == 0 {
            return Err(ScalerError::Configuration(
                "sleep_interval_secs must be > 0".into(),
            ));
        }
        if self.mon_target_pg_per_osd == 0 {
            return Err(ScalerError::Configuration(
                "mon_target_pg_per_osd must be > 0".into(),
            ));
        }
        if self.threshold < 2.0 {
            return Err(ScalerError::Configuration(format!(
                "threshold must be >= 2.0, got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    pub fn sleep_interval(&self) -> Duration {
        Duration::from_secs(self.sleep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScalerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.profile, ScaleProfile::ScaleUp);
        assert_eq!(config.sleep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_threshold_floor() {
        let config = ScalerConfig {
            threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = ScalerConfig {
            sleep_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
