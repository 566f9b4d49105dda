/// Cluster Snapshot Model
///
/// Read-only view of the cluster consumed by the autoscaler: the pool table,
/// the CRUSH placement hierarchy, usage statistics, and the collaborator
/// traits through which snapshots are fetched and pool mutations issued.

pub mod crush;
pub mod pool;
pub mod snapshot;

pub use crush::{CrushMap, CrushRule};
pub use pool::{AutoscaleMode, Pool, PoolScaleOptions, PG_NUM_MIN};
pub use snapshot::{
    ClusterCommands, ClusterProvider, ClusterRelease, ClusterSnapshot, InMemoryClusterProvider,
    OsdStats, PoolStats,
};
