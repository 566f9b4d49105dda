use crate::cluster::crush::CrushMap;
use crate::cluster::pool::Pool;
use crate::error::{Result, ScalerError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Cluster software release, ordered oldest to newest. Clusters older than
/// [`ClusterRelease::MIN_SUPPORTED`] are not autoscaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterRelease {
    Luminous,
    Mimic,
    Nautilus,
    Octopus,
    Pacific,
}

impl ClusterRelease {
    pub const MIN_SUPPORTED: ClusterRelease = ClusterRelease::Nautilus;
}

/// Per-pool usage statistics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PoolStats {
    /// Logical bytes stored in the pool
    pub stored: u64,
}

/// Per-device statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OsdStats {
    pub osd: u32,
    /// Raw physical capacity in KiB. Device reweighting is deliberately not
    /// reflected here; sizing works from physical capacity.
    pub kb: u64,
}

/// Point-in-time view of everything the autoscaler reads. Fetched once per
/// iteration and treated as immutable for its duration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    /// Pool table keyed by pool id; ordered so iteration is deterministic
    pub pools: BTreeMap<u64, Pool>,
    pub crush: CrushMap,
    pub require_osd_release: ClusterRelease,
    pub pool_stats: BTreeMap<u64, PoolStats>,
    pub osd_stats: Vec<OsdStats>,
}

impl Default for ClusterRelease {
    fn default() -> Self {
        ClusterRelease::Nautilus
    }
}

impl ClusterSnapshot {
    /// Check snapshot invariants once, so the scaler can trust the data.
    pub fn validate(&self) -> Result<()> {
        for (id, pool) in &self.pools {
            if *id != pool.id {
                return Err(ScalerError::Cluster(format!(
                    "pool table key {} does not match pool id {}",
                    id, pool.id
                )));
            }
            pool.validate()?;
        }
        Ok(())
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let snapshot: ClusterSnapshot = serde_json::from_str(data)?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

/// Source of cluster snapshots, one per loop iteration.
pub trait ClusterProvider {
    fn fetch(&self) -> Result<ClusterSnapshot>;
}

/// Transport for pool mutations. Setting `pg_num` asks the cluster to step
/// `pg_num_target` toward the new value.
pub trait ClusterCommands {
    fn set_pool_pg_num(&self, pool_name: &str, pg_num: u32) -> Result<()>;
}

/// Snapshot provider backed by a swappable in-memory snapshot. Used by the
/// status binary and by tests; clones share the same snapshot slot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClusterProvider {
    snapshot: Arc<RwLock<ClusterSnapshot>>,
}

impl InMemoryClusterProvider {
    pub fn new(snapshot: ClusterSnapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Replace the snapshot served to the next `fetch`.
    pub fn set_snapshot(&self, snapshot: ClusterSnapshot) {
        *self.snapshot.write() = snapshot;
    }
}

impl ClusterProvider for InMemoryClusterProvider {
    fn fetch(&self) -> Result<ClusterSnapshot> {
        Ok(self.snapshot.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::pool::{AutoscaleMode, PoolScaleOptions};

    fn snapshot() -> ClusterSnapshot {
        let pool = Pool {
            id: 3,
            name: "rbd".to_string(),
            size: 3,
            raw_used_rate: 3.0,
            pg_num: 32,
            pg_num_target: 32,
            crush_rule: 0,
            pg_autoscale_mode: AutoscaleMode::On,
            options: PoolScaleOptions::default(),
        };
        ClusterSnapshot {
            pools: BTreeMap::from([(3, pool)]),
            require_osd_release: ClusterRelease::Octopus,
            pool_stats: BTreeMap::from([(3, PoolStats { stored: 1 << 30 })]),
            osd_stats: vec![OsdStats { osd: 0, kb: 1 << 30 }],
            ..Default::default()
        }
    }

    #[test]
    fn test_release_ordering() {
        assert!(ClusterRelease::Mimic < ClusterRelease::MIN_SUPPORTED);
        assert!(ClusterRelease::Octopus >= ClusterRelease::MIN_SUPPORTED);
    }

    #[test]
    fn test_json_round_trip() {
        let snap = snapshot();
        let data = serde_json::to_string(&snap).unwrap();
        let back = ClusterSnapshot::from_json(&data).unwrap();
        assert_eq!(back.pools.len(), 1);
        assert_eq!(back.pools[&3].name, "rbd");
        assert_eq!(back.pool_stats[&3].stored, 1 << 30);
    }

    #[test]
    fn test_validate_rejects_mismatched_key() {
        let mut snap = snapshot();
        let pool = snap.pools.remove(&3).unwrap();
        snap.pools.insert(7, pool);
        assert!(snap.validate().is_err());
    }

    #[test]
    fn test_in_memory_provider_swaps() {
        let provider = InMemoryClusterProvider::new(snapshot());
        let handle = provider.clone();
        let mut snap = snapshot();
        snap.pools.get_mut(&3).unwrap().pg_num = 64;
        handle.set_snapshot(snap);
        assert_eq!(provider.fetch().unwrap().pools[&3].pg_num, 64);
    }
}
