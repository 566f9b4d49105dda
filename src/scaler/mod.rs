/// PG Sizing Algorithm
///
/// Turns a cluster snapshot into one sizing recommendation per pool:
/// subtree partitioning, capacity-ratio arithmetic, profile-driven PG
/// target computation, and the threshold gate deciding whether a change is
/// worth acting on.

pub mod decision;
pub mod ratio;
pub mod subtree;
pub mod target;

pub use subtree::{SubtreeMap, SubtreeResourceStatus};
pub use target::{nearest_power_of_two, PgTargetOutcome, ScaleProfile};

use crate::cluster::{AutoscaleMode, ClusterSnapshot};
use crate::config::ScalerConfig;
use crate::error::{Result, ScalerError};
use serde::Serialize;
use tracing::{debug, warn};

/// Sizing recommendation and its inputs for one pool. Rows of the
/// autoscale-status report.
#[derive(Debug, Clone, Serialize)]
pub struct PoolScaleResult {
    pub pool_id: u64,
    pub pool_name: String,
    pub crush_root_id: i64,
    pub pg_autoscale_mode: AutoscaleMode,
    pub pg_num_target: u32,
    pub logical_used: u64,
    pub target_bytes: u64,
    pub raw_used_rate: f64,
    pub subtree_capacity: u64,
    /// Raw bytes actually consumed
    pub actual_raw_used: f64,
    /// Raw bytes counting reservations: max(stored, target_bytes) * rate
    pub raw_used: f64,
    pub actual_capacity_ratio: f64,
    pub capacity_ratio: f64,
    pub target_ratio: f64,
    pub effective_target_ratio: f64,
    /// Unquantized PG target, truncated
    pub pg_num_ideal: u32,
    pub pg_num_final: u32,
    pub would_adjust: bool,
    pub bias: f64,
}

/// Size every pool in the snapshot under the configured profile.
///
/// Runs the subtree analysis, then the per-pool target pass; under
/// scale-down the pools deferred by the first pass get a second pass that
/// splits the remaining PG budget evenly.
pub fn pool_status(
    snapshot: &ClusterSnapshot,
    config: &ScalerConfig,
) -> Result<(Vec<PoolScaleResult>, SubtreeMap)> {
    if config.threshold < 2.0 {
        return Err(ScalerError::Configuration(format!(
            "threshold must be >= 2.0, got {}",
            config.threshold
        )));
    }

    let mut subtrees = SubtreeMap::analyze(snapshot, config.mon_target_pg_per_osd);
    let mut results = Vec::new();

    let all_pools: Vec<u64> = snapshot.pools.keys().copied().collect();
    let deferred = calc_pool_targets(snapshot, &all_pools, &mut subtrees, config, true, &mut results);

    if config.profile == ScaleProfile::ScaleDown {
        calc_pool_targets(snapshot, &deferred, &mut subtrees, config, false, &mut results);
    }

    Ok((results, subtrees))
}

/// One sizing pass over `pool_ids`. Returns the pools deferred to the
/// scale-down second pass.
fn calc_pool_targets(
    snapshot: &ClusterSnapshot,
    pool_ids: &[u64],
    subtrees: &mut SubtreeMap,
    config: &ScalerConfig,
    is_used: bool,
    results: &mut Vec<PoolScaleResult>,
) -> Vec<u64> {
    let mut deferred = Vec::new();

    for &pool_id in pool_ids {
        let Some(pool) = snapshot.pools.get(&pool_id) else {
            continue;
        };
        let Some(stats) = snapshot.pool_stats.get(&pool_id) else {
            // Race with pool deletion; skip.
            continue;
        };

        let Some(root_id) = snapshot.crush.root_for_rule(pool.crush_rule) else {
            warn!(pool_id, rule = pool.crush_rule, "cannot resolve crush root, skipping pool");
            continue;
        };
        if config.profile == ScaleProfile::ScaleDown && subtrees.is_overlapped(root_id) {
            warn!(pool_id, root_id, "pool contains an overlapping root, skipping scaling");
            continue;
        }
        let Some(subtree) = subtrees.get_mut(root_id) else {
            warn!(pool_id, root_id, "pool has no analyzed subtree, skipping");
            continue;
        };
        let capacity = subtree.capacity;
        if capacity == 0 {
            debug!(pool_id, root_id, "skipping empty subtree");
            continue;
        }

        let raw_used_rate = pool.raw_used_rate();
        let logical_used = stats.stored;
        let bias = pool.options.pg_autoscale_bias;
        // Ratio takes precedence if both are set.
        let target_bytes = if pool.options.target_size_ratio == 0.0 {
            pool.options.target_size_bytes
        } else {
            0
        };

        let actual_raw_used = logical_used as f64 * raw_used_rate;
        let actual_capacity_ratio = actual_raw_used / capacity as f64;
        let raw_used = logical_used.max(target_bytes) as f64 * raw_used_rate;

        let target_ratio = ratio::effective_target_ratio(
            pool.options.target_size_ratio,
            subtree.total_target_ratio,
            subtree.total_target_bytes,
            capacity,
        );
        let capacity_ratio =
            ratio::pool_capacity_ratio(logical_used, target_bytes, raw_used_rate, capacity)
                .max(target_ratio);

        let Some(outcome) = target::calc_final_pg_target(
            pool,
            root_id,
            subtree,
            capacity_ratio,
            bias,
            is_used,
            config.profile,
        ) else {
            deferred.push(pool_id);
            continue;
        };

        let would_adjust = decision::would_adjust(
            outcome.final_pg_target,
            pool.pg_num_target,
            outcome.final_ratio,
            config.threshold,
        );

        results.push(PoolScaleResult {
            pool_id,
            pool_name: pool.name.clone(),
            crush_root_id: root_id,
            pg_autoscale_mode: pool.pg_autoscale_mode,
            pg_num_target: pool.pg_num_target,
            logical_used,
            target_bytes,
            raw_used_rate,
            subtree_capacity: capacity,
            actual_raw_used,
            raw_used,
            actual_capacity_ratio,
            capacity_ratio,
            target_ratio: pool.options.target_size_ratio,
            effective_target_ratio: target_ratio,
            pg_num_ideal: outcome.pool_pg_target.max(0.0) as u32,
            pg_num_final: outcome.final_pg_target,
            would_adjust,
            bias,
        });
    }

    deferred
}
