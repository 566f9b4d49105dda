use crate::cluster::ClusterSnapshot;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, warn};

/// Resource accounting for one non-overlapping subtree of the placement
/// hierarchy: the unit within which pools compete for PGs.
#[derive(Debug, Clone, Default)]
pub struct SubtreeResourceStatus {
    /// Roots participating in this subtree. More than one entry means
    /// overlap was detected and the roots were collapsed together.
    pub root_ids: Vec<i64>,
    pub osds: BTreeSet<u32>,
    pub osd_count: usize,
    /// Ideal full-capacity PG total: `osd_count * mon_target_pg_per_osd`
    pub pg_target: u32,
    /// Raw PGs currently allocated: sum of `pg_num_target * size`
    pub pg_current: u64,
    /// PGs not yet claimed by the scale-down first pass. Signed: claims on
    /// an overcommitted subtree can overdraw the budget.
    pub pg_left: i64,
    /// Total physical capacity of member devices in bytes
    pub capacity: u64,
    pub pool_ids: Vec<u64>,
    pub pool_names: Vec<String>,
    pub pool_count: usize,
    /// Pools claimed by the scale-down first pass
    pub pool_used: usize,
    /// Sum of member pools' `target_size_ratio`
    pub total_target_ratio: f64,
    /// Sum of member pools' `target_size_bytes`, converted to raw bytes
    pub total_target_bytes: f64,
}

/// Pools partitioned across the placement tree: every root seen resolves to
/// a subtree record, and roots whose device sets intersect are collapsed
/// into one record and remembered in the overlap set.
#[derive(Debug, Clone, Default)]
pub struct SubtreeMap {
    subtrees: Vec<SubtreeResourceStatus>,
    by_root: BTreeMap<i64, usize>,
    overlapped_roots: BTreeSet<i64>,
}

impl SubtreeMap {
    /// Partition the snapshot's pools into subtrees and aggregate each
    /// subtree's resources. Pool iteration is by ascending id and subtree
    /// probing by allocation order, so identical inputs always produce
    /// identical maps and overlap sets.
    pub fn analyze(snapshot: &ClusterSnapshot, mon_target_pg_per_osd: u32) -> Self {
        let mut map = SubtreeMap::default();

        for (pool_id, pool) in &snapshot.pools {
            let Some(rule) = snapshot.crush.rule_by_id(pool.crush_rule) else {
                warn!(pool_id, rule = pool.crush_rule, "pool references unknown crush rule, skipping");
                continue;
            };
            let Some(root_id) = snapshot.crush.rule_root(&rule.name) else {
                warn!(pool_id, rule = %rule.name, "crush rule has no resolvable root, skipping pool");
                continue;
            };
            let Some(osds) = snapshot.crush.osds_under(root_id).cloned() else {
                warn!(pool_id, root_id, "no devices resolvable under root, skipping pool");
                continue;
            };

            let index = match map
                .subtrees
                .iter()
                .position(|prev| !prev.osds.is_disjoint(&osds))
            {
                Some(index) => {
                    let prev = &map.subtrees[index];
                    for &prev_root in &prev.root_ids {
                        if prev_root != root_id {
                            map.overlapped_roots.insert(prev_root);
                            map.overlapped_roots.insert(root_id);
                        }
                    }
                    if map.overlapped_roots.contains(&root_id) {
                        error!(
                            pool_id,
                            overlapped_roots = ?map.overlapped_roots,
                            "pool has overlapping roots"
                        );
                    }
                    index
                }
                None => {
                    map.subtrees.push(SubtreeResourceStatus::default());
                    map.subtrees.len() - 1
                }
            };

            map.by_root.insert(root_id, index);
            let subtree = &mut map.subtrees[index];
            if !subtree.root_ids.contains(&root_id) {
                subtree.root_ids.push(root_id);
            }
            subtree.osds.extend(osds);
            subtree.pool_ids.push(*pool_id);
            subtree.pool_names.push(pool.name.clone());
            subtree.pg_current += u64::from(pool.pg_num_target) * u64::from(pool.size);

            let target_ratio = pool.options.target_size_ratio;
            if target_ratio > 0.0 {
                subtree.total_target_ratio += target_ratio;
            } else if pool.options.target_size_bytes > 0 {
                subtree.total_target_bytes +=
                    pool.options.target_size_bytes as f64 * pool.raw_used_rate();
            }
        }

        for subtree in &mut map.subtrees {
            subtree.osd_count = subtree.osds.len();
            subtree.pool_count = subtree.pool_ids.len();
            subtree.pg_target = subtree.osd_count as u32 * mon_target_pg_per_osd;
            subtree.pg_left = i64::from(subtree.pg_target);
            subtree.capacity = snapshot
                .osd_stats
                .iter()
                .filter(|s| subtree.osds.contains(&s.osd))
                .map(|s| s.kb * 1024)
                .sum();
            debug!(
                root_ids = ?subtree.root_ids,
                pools = ?subtree.pool_ids,
                osd_count = subtree.osd_count,
                pg_target = subtree.pg_target,
                "aggregated subtree"
            );
        }

        map
    }

    pub fn get(&self, root_id: i64) -> Option<&SubtreeResourceStatus> {
        self.by_root.get(&root_id).map(|&i| &self.subtrees[i])
    }

    pub fn get_mut(&mut self, root_id: i64) -> Option<&mut SubtreeResourceStatus> {
        let index = *self.by_root.get(&root_id)?;
        Some(&mut self.subtrees[index])
    }

    pub fn is_overlapped(&self, root_id: i64) -> bool {
        self.overlapped_roots.contains(&root_id)
    }

    pub fn overlapped_roots(&self) -> &BTreeSet<i64> {
        &self.overlapped_roots
    }

    pub fn subtrees(&self) -> &[SubtreeResourceStatus] {
        &self.subtrees
    }
}
