use crate::cluster::Pool;
use crate::scaler::subtree::SubtreeResourceStatus;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Sizing policy profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleProfile {
    /// Start pools minimal and grow them as usage builds up.
    #[serde(rename = "scale-up")]
    ScaleUp,
    /// Start pools with the full PG complement and release PGs to pools
    /// that need them.
    #[serde(rename = "scale-down")]
    ScaleDown,
}

impl std::fmt::Display for ScaleProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScaleProfile::ScaleUp => "scale-up",
            ScaleProfile::ScaleDown => "scale-down",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ScaleProfile {
    type Err = crate::error::ScalerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scale-up" => Ok(ScaleProfile::ScaleUp),
            "scale-down" => Ok(ScaleProfile::ScaleDown),
            other => Err(crate::error::ScalerError::InvalidInput(format!(
                "unknown profile '{}', expected scale-up or scale-down",
                other
            ))),
        }
    }
}

/// Round to the nearest power of two, ties toward the higher power.
/// Idempotent on powers of two and monotone non-decreasing.
pub fn nearest_power_of_two(n: u64) -> u64 {
    if n <= 1 {
        return n;
    }
    let hi = n.next_power_of_two();
    let lo = hi >> 1;
    if hi - n > n - lo {
        lo
    } else {
        hi
    }
}

/// Outcome of sizing one pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PgTargetOutcome {
    /// The ratio the pool was ultimately granted.
    pub final_ratio: f64,
    /// Raw (unquantized) PG target.
    pub pool_pg_target: f64,
    /// Quantized PG target, floored at the pool's `pg_num_min`.
    pub final_pg_target: u32,
}

fn quantize(pool_pg_target: f64, pg_num_min: u32) -> u32 {
    let ideal = pool_pg_target.max(0.0) as u64;
    let quantized = nearest_power_of_two(ideal).min(u64::from(u32::MAX)) as u32;
    quantized.max(pg_num_min)
}

/// Compute a pool's PG target under the active profile.
///
/// Scale-up decides in a single pass. Scale-down runs twice: the first pass
/// (`is_used` set) claims PGs on the subtree accumulator for pools using
/// more than their even share and returns `None` for the rest, which the
/// caller revisits in a second pass that splits the remaining budget evenly.
pub fn calc_final_pg_target(
    pool: &Pool,
    root_id: i64,
    subtree: &mut SubtreeResourceStatus,
    capacity_ratio: f64,
    bias: f64,
    is_used: bool,
    profile: ScaleProfile,
) -> Option<PgTargetOutcome> {
    let pg_num_min = pool.options.pg_num_min;
    let size = f64::from(pool.size);

    let (final_ratio, pool_pg_target) = match profile {
        ScaleProfile::ScaleUp => {
            let final_ratio = capacity_ratio;
            let pool_pg_target = final_ratio * f64::from(subtree.pg_target) / size * bias;
            (final_ratio, pool_pg_target)
        }
        ScaleProfile::ScaleDown => {
            let (final_ratio, pool_pg_target) = if is_used {
                let even_ratio = 1.0 / subtree.pool_count as f64;
                let used_ratio = capacity_ratio;
                if used_ratio <= even_ratio {
                    // Even-share pool; the second pass sizes it.
                    return None;
                }
                subtree.pool_used += 1;

                let final_ratio = used_ratio.max(even_ratio);
                let used_pg = final_ratio * f64::from(subtree.pg_target);
                subtree.pg_left -= used_pg.trunc() as i64;
                (final_ratio, used_pg / size * bias)
            } else {
                let remaining = subtree.pool_count - subtree.pool_used;
                let final_ratio = 1.0 / remaining as f64;
                (final_ratio, final_ratio * subtree.pg_left as f64 / size * bias)
            };
            info!(
                pool = %pool.name,
                root_id,
                capacity_ratio,
                bias,
                pg_target = pool_pg_target,
                quantized = quantize(pool_pg_target, pg_num_min),
                current = pool.pg_num_target,
                "scale-down sizing"
            );
            (final_ratio, pool_pg_target)
        }
    };

    Some(PgTargetOutcome {
        final_ratio,
        pool_pg_target,
        final_pg_target: quantize(pool_pg_target, pg_num_min),
    })
}
