use crate::error::{Result, ScalerError};
use serde::{Deserialize, Serialize};

/// Default lower bound on any pool's PG count, unless overridden per pool.
pub const PG_NUM_MIN: u32 = 32;

/// Per-pool autoscaling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoscaleMode {
    /// The autoscaler ignores the pool entirely
    Off,
    /// The autoscaler applies PG count changes itself
    On,
    /// The autoscaler only raises health warnings
    Warn,
}

impl std::fmt::Display for AutoscaleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AutoscaleMode::Off => "off",
            AutoscaleMode::On => "on",
            AutoscaleMode::Warn => "warn",
        };
        write!(f, "{}", s)
    }
}

/// Sizing knobs carried by each pool.
///
/// Validated once when the snapshot is constructed; after that the scaler
/// reads them without further checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolScaleOptions {
    /// Fraction of the subtree this pool is expected to consume (0 disables).
    /// Takes precedence over `target_size_bytes` when both are set.
    #[serde(default)]
    pub target_size_ratio: f64,
    /// Expected logical size of the pool in bytes (0 disables).
    #[serde(default)]
    pub target_size_bytes: u64,
    /// Lower bound for the quantized PG count.
    #[serde(default = "default_pg_num_min")]
    pub pg_num_min: u32,
    /// Multiplicative weight applied to the computed PG target.
    #[serde(default = "default_bias")]
    pub pg_autoscale_bias: f64,
}

fn default_pg_num_min() -> u32 {
    PG_NUM_MIN
}

fn default_bias() -> f64 {
    1.0
}

impl Default for PoolScaleOptions {
    fn default() -> Self {
        Self {
            target_size_ratio: 0.0,
            target_size_bytes: 0,
            pg_num_min: PG_NUM_MIN,
            pg_autoscale_bias: 1.0,
        }
    }
}

impl PoolScaleOptions {
    pub fn validate(&self) -> Result<()> {
        if self.target_size_ratio < 0.0 {
            return Err(ScalerError::Cluster(format!(
                "target_size_ratio must be >= 0.0, got {}",
                self.target_size_ratio
            )));
        }
        if self.pg_num_min < 1 {
            return Err(ScalerError::Cluster("pg_num_min must be >= 1".into()));
        }
        if self.pg_autoscale_bias <= 0.0 {
            return Err(ScalerError::Cluster(format!(
                "pg_autoscale_bias must be > 0.0, got {}",
                self.pg_autoscale_bias
            )));
        }
        Ok(())
    }
}

/// One pool as seen in the OSD map snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    /// Numeric pool id
    pub id: u64,
    /// Pool name
    pub name: String,
    /// Replica count; the per-PG resource multiplier
    pub size: u32,
    /// Multiplier converting logical bytes to raw bytes consumed. For
    /// replicated pools this equals `size`; erasure-coded pools carry a
    /// fractional coding overhead. Unset (0) falls back to `size`.
    #[serde(default)]
    pub raw_used_rate: f64,
    /// PG count currently in effect
    pub pg_num: u32,
    /// PG count the cluster is transitioning toward
    pub pg_num_target: u32,
    /// CRUSH rule the pool places through
    pub crush_rule: u32,
    pub pg_autoscale_mode: AutoscaleMode,
    #[serde(default)]
    pub options: PoolScaleOptions,
}

impl Pool {
    /// Raw-used rate with the replica-count fallback applied.
    pub fn raw_used_rate(&self) -> f64 {
        if self.raw_used_rate > 0.0 {
            self.raw_used_rate
        } else {
            f64::from(self.size)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.size < 1 {
            return Err(ScalerError::Cluster(format!(
                "pool {} has replication size 0",
                self.id
            )));
        }
        if self.raw_used_rate < 0.0 {
            return Err(ScalerError::Cluster(format!(
                "pool {} has negative raw_used_rate",
                self.id
            )));
        }
        self.options
            .validate()
            .map_err(|e| ScalerError::Cluster(format!("pool {}: {}", self.id, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Pool {
        Pool {
            id: 1,
            name: "rbd".to_string(),
            size: 3,
            raw_used_rate: 0.0,
            pg_num: 32,
            pg_num_target: 32,
            crush_rule: 0,
            pg_autoscale_mode: AutoscaleMode::On,
            options: PoolScaleOptions::default(),
        }
    }

    #[test]
    fn test_option_defaults() {
        let opts = PoolScaleOptions::default();
        assert_eq!(opts.target_size_ratio, 0.0);
        assert_eq!(opts.target_size_bytes, 0);
        assert_eq!(opts.pg_num_min, 32);
        assert_eq!(opts.pg_autoscale_bias, 1.0);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_option_validation() {
        let mut opts = PoolScaleOptions {
            target_size_ratio: -0.1,
            ..Default::default()
        };
        assert!(opts.validate().is_err());

        opts.target_size_ratio = 0.0;
        opts.pg_num_min = 0;
        assert!(opts.validate().is_err());

        opts.pg_num_min = 1;
        opts.pg_autoscale_bias = 0.0;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_raw_used_rate_fallback() {
        let mut p = pool();
        assert_eq!(p.raw_used_rate(), 3.0);
        p.raw_used_rate = 1.5;
        assert_eq!(p.raw_used_rate(), 1.5);
    }

    #[test]
    fn test_pool_validation() {
        let mut p = pool();
        assert!(p.validate().is_ok());
        p.size = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_mode_serde() {
        let mode: AutoscaleMode = serde_json::from_str("\"warn\"").unwrap();
        assert_eq!(mode, AutoscaleMode::Warn);
        assert_eq!(mode.to_string(), "warn");
    }
}
