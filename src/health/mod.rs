/// Health Check Assembly
///
/// Builds the batch of health warnings each iteration publishes: pools in
/// warn mode that should grow or shrink, pools with conflicting size
/// targets, and subtrees whose collective reservations overcommit the
/// available capacity.

use crate::cluster::{AutoscaleMode, Pool};
use crate::commands::format_bytes;
use crate::scaler::{PoolScaleResult, SubtreeMap};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HealthCode {
    PoolTooFewPgs,
    PoolTooManyPgs,
    PoolTargetSizeBytesOvercommitted,
    PoolHasTargetSizeBytesAndRatio,
}

impl HealthCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthCode::PoolTooFewPgs => "POOL_TOO_FEW_PGS",
            HealthCode::PoolTooManyPgs => "POOL_TOO_MANY_PGS",
            HealthCode::PoolTargetSizeBytesOvercommitted => {
                "POOL_TARGET_SIZE_BYTES_OVERCOMMITTED"
            }
            HealthCode::PoolHasTargetSizeBytesAndRatio => {
                "POOL_HAS_TARGET_SIZE_BYTES_AND_RATIO"
            }
        }
    }
}

impl std::fmt::Display for HealthCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub severity: HealthSeverity,
    pub summary: String,
    pub count: usize,
    pub detail: Vec<String>,
}

/// The complete health-check set for one iteration; publishing it replaces
/// any previously published set.
pub type HealthReport = BTreeMap<HealthCode, HealthCheck>;

/// Sink the assembled report is published to.
pub trait HealthSink {
    fn publish(&self, report: HealthReport);
}

/// Assemble the health report for one iteration's sizing results.
pub fn build_health_report(
    results: &[PoolScaleResult],
    pools: &BTreeMap<u64, Pool>,
    subtrees: &SubtreeMap,
) -> HealthReport {
    let mut report = HealthReport::new();

    let mut too_few = Vec::new();
    let mut too_many = Vec::new();
    let mut bytes_and_ratio = Vec::new();

    // Per-root reservation accounting for the overcommit check.
    let mut total_bytes: BTreeMap<i64, f64> = BTreeMap::new();
    let mut total_target_bytes: BTreeMap<i64, f64> = BTreeMap::new();
    let mut target_bytes_pools: BTreeMap<i64, Vec<String>> = BTreeMap::new();

    for r in results {
        if let Some(pool) = pools.get(&r.pool_id) {
            if pool.options.target_size_ratio > 0.0 && pool.options.target_size_bytes > 0 {
                bytes_and_ratio.push(format!(
                    "Pool {} has target_size_bytes and target_size_ratio set",
                    r.pool_name
                ));
            }
        }

        let reserved = r.target_bytes as f64 * r.raw_used_rate;
        *total_bytes.entry(r.crush_root_id).or_default() += r.actual_raw_used.max(reserved);
        if r.target_bytes > 0 {
            *total_target_bytes.entry(r.crush_root_id).or_default() += reserved;
            target_bytes_pools
                .entry(r.crush_root_id)
                .or_default()
                .push(r.pool_name.clone());
        }

        if !r.would_adjust || r.pg_autoscale_mode != AutoscaleMode::Warn {
            continue;
        }
        let msg = format!(
            "Pool {} has {} placement groups, should have {}",
            r.pool_name, r.pg_num_target, r.pg_num_final
        );
        if r.pg_num_final > r.pg_num_target {
            too_few.push(msg);
        } else {
            too_many.push(msg);
        }
    }

    if !too_few.is_empty() {
        report.insert(
            HealthCode::PoolTooFewPgs,
            HealthCheck {
                severity: HealthSeverity::Warning,
                summary: format!("{} pools have too few placement groups", too_few.len()),
                count: too_few.len(),
                detail: too_few,
            },
        );
    }
    if !too_many.is_empty() {
        report.insert(
            HealthCode::PoolTooManyPgs,
            HealthCheck {
                severity: HealthSeverity::Warning,
                summary: format!("{} pools have too many placement groups", too_many.len()),
                count: too_many.len(),
                detail: too_many,
            },
        );
    }

    let mut overcommitted = Vec::new();
    for (&root_id, &total) in &total_bytes {
        let Some(subtree) = subtrees.get(root_id) else {
            continue;
        };
        let capacity = subtree.capacity;
        if capacity == 0 {
            continue;
        }
        let total_target = total_target_bytes.get(&root_id).copied().unwrap_or(0.0);
        if total_target > 0.0 && total > capacity as f64 {
            overcommitted.push(format!(
                "Pools {:?} overcommit available storage by {:.3}x due to target_size_bytes {} on pools {:?}",
                subtree.pool_names,
                total / capacity as f64,
                format_bytes(total_target as u64),
                target_bytes_pools.get(&root_id).cloned().unwrap_or_default()
            ));
        } else if total_target > capacity as f64 {
            overcommitted.push(format!(
                "Pools {:?} overcommit available storage by {:.3}x due to collective target_size_bytes of {}",
                subtree.pool_names,
                total / capacity as f64,
                format_bytes(total_target as u64)
            ));
        }
    }
    if !overcommitted.is_empty() {
        report.insert(
            HealthCode::PoolTargetSizeBytesOvercommitted,
            HealthCheck {
                severity: HealthSeverity::Warning,
                summary: format!(
                    "{} subtrees have overcommitted pool target_size_bytes",
                    overcommitted.len()
                ),
                count: overcommitted.len(),
                detail: overcommitted,
            },
        );
    }

    if !bytes_and_ratio.is_empty() {
        report.insert(
            HealthCode::PoolHasTargetSizeBytesAndRatio,
            HealthCheck {
                severity: HealthSeverity::Warning,
                summary: format!(
                    "{} pools have both target_size_bytes and target_size_ratio set",
                    bytes_and_ratio.len()
                ),
                count: bytes_and_ratio.len(),
                detail: bytes_and_ratio,
            },
        );
    }

    report
}
