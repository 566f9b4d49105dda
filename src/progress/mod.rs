/// PG Adjustment Progress
///
/// Tracks every pool the autoscaler is actively driving toward a new PG
/// count and publishes per-pool progress events. The table is owned by the
/// control task alone; nothing else writes it.

use crate::cluster::Pool;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Publisher for progress events.
pub trait ProgressSink {
    /// Update (or create) the event; `progress` is in [0, 1].
    fn update(&self, ev_id: &str, message: String, progress: f64, pool_id: u64);
    fn complete(&self, ev_id: &str);
}

/// One in-flight PG count change: where the pool started and where it is
/// headed.
#[derive(Debug, Clone)]
pub struct PgAdjustmentProgress {
    ev_id: String,
    pool_id: u64,
    pg_num: u32,
    pg_num_target: u32,
}

impl PgAdjustmentProgress {
    pub fn new(pool_id: u64, pg_num: u32, pg_num_target: u32) -> Self {
        Self {
            ev_id: Uuid::new_v4().to_string(),
            pool_id,
            pg_num,
            pg_num_target,
        }
    }

    /// Re-point the event at a new transition, keeping its identity.
    pub fn reset(&mut self, pg_num: u32, pg_num_target: u32) {
        self.pg_num = pg_num;
        self.pg_num_target = pg_num_target;
    }

    pub fn ev_id(&self) -> &str {
        &self.ev_id
    }

    pub fn source(&self) -> u32 {
        self.pg_num
    }

    pub fn destination(&self) -> u32 {
        self.pg_num_target
    }

    pub fn publish(&self, sink: &impl ProgressSink, progress: f64) {
        let direction = if self.pg_num < self.pg_num_target {
            "increasing"
        } else {
            "decreasing"
        };
        sink.update(
            &self.ev_id,
            format!(
                "PG autoscaler {} pool {} PGs from {} to {}",
                direction, self.pool_id, self.pg_num, self.pg_num_target
            ),
            progress,
            self.pool_id,
        );
    }
}

/// The per-pool event table, keyed by pool id.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    events: BTreeMap<u64, PgAdjustmentProgress>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly issued adjustment: create the pool's event, or reset
    /// it if the destination moved mid-flight, then publish at zero.
    pub fn record_adjustment(
        &mut self,
        pool_id: u64,
        pg_num: u32,
        pg_num_target: u32,
        sink: &impl ProgressSink,
    ) {
        let event = self
            .events
            .entry(pool_id)
            .and_modify(|ev| ev.reset(pg_num, pg_num_target))
            .or_insert_with(|| PgAdjustmentProgress::new(pool_id, pg_num, pg_num_target));
        event.publish(sink, 0.0);
    }

    /// Advance every tracked event against the live pool table. Events whose
    /// pool is gone, whose pool reached its target, or which never had any
    /// distance to cover are completed and dropped.
    pub fn sweep(&mut self, pools: &BTreeMap<u64, Pool>, sink: &impl ProgressSink) {
        let tracked: Vec<u64> = self.events.keys().copied().collect();
        for pool_id in tracked {
            let event = &self.events[&pool_id];
            let finished = match pools.get(&pool_id) {
                None => true,
                Some(pool) => {
                    pool.pg_num == pool.pg_num_target || event.pg_num == event.pg_num_target
                }
            };
            if finished {
                sink.complete(&event.ev_id);
                self.events.remove(&pool_id);
                continue;
            }
            let pool = &pools[&pool_id];
            let covered = i64::from(event.pg_num) - i64::from(pool.pg_num);
            let distance = i64::from(event.pg_num) - i64::from(event.pg_num_target);
            event.publish(sink, covered as f64 / distance as f64);
        }
    }

    pub fn get(&self, pool_id: u64) -> Option<&PgAdjustmentProgress> {
        self.events.get(&pool_id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{AutoscaleMode, PoolScaleOptions};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        updates: Mutex<Vec<(String, String, f64)>>,
        completed: Mutex<Vec<String>>,
    }

    impl ProgressSink for RecordingSink {
        fn update(&self, ev_id: &str, message: String, progress: f64, _pool_id: u64) {
            self.updates
                .lock()
                .push((ev_id.to_string(), message, progress));
        }

        fn complete(&self, ev_id: &str) {
            self.completed.lock().push(ev_id.to_string());
        }
    }

    fn pool(id: u64, pg_num: u32, pg_num_target: u32) -> Pool {
        Pool {
            id,
            name: format!("pool-{}", id),
            size: 3,
            raw_used_rate: 3.0,
            pg_num,
            pg_num_target,
            crush_rule: 0,
            pg_autoscale_mode: AutoscaleMode::On,
            options: PoolScaleOptions::default(),
        }
    }

    #[test]
    fn test_record_publishes_zero_progress() {
        let sink = RecordingSink::default();
        let mut tracker = ProgressTracker::new();
        tracker.record_adjustment(1, 32, 128, &sink);

        assert_eq!(tracker.len(), 1);
        let updates = sink.updates.lock();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].2, 0.0);
        assert!(updates[0].1.contains("increasing pool 1 PGs from 32 to 128"));
    }

    #[test]
    fn test_reset_keeps_event_identity() {
        let sink = RecordingSink::default();
        let mut tracker = ProgressTracker::new();
        tracker.record_adjustment(1, 32, 128, &sink);
        let ev_id = tracker.get(1).unwrap().ev_id().to_string();

        tracker.record_adjustment(1, 64, 256, &sink);
        assert_eq!(tracker.get(1).unwrap().ev_id(), ev_id);
        assert_eq!(tracker.get(1).unwrap().destination(), 256);
    }

    #[test]
    fn test_sweep_reports_fractional_progress() {
        let sink = RecordingSink::default();
        let mut tracker = ProgressTracker::new();
        tracker.record_adjustment(1, 256, 32, &sink);

        // Shrinking: halfway from 256 down to 32.
        let pools = BTreeMap::from([(1, pool(1, 144, 32))]);
        tracker.sweep(&pools, &sink);
        let updates = sink.updates.lock();
        let last = updates.last().unwrap();
        assert!((last.2 - 0.5).abs() < 1e-12);
        assert!(last.1.contains("decreasing"));
        drop(updates);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_sweep_growing_pool_stays_in_unit_range() {
        let sink = RecordingSink::default();
        let mut tracker = ProgressTracker::new();
        tracker.record_adjustment(1, 32, 128, &sink);

        let pools = BTreeMap::from([(1, pool(1, 80, 128))]);
        tracker.sweep(&pools, &sink);
        let updates = sink.updates.lock();
        let progress = updates.last().unwrap().2;
        assert!((0.0..=1.0).contains(&progress));
        assert!((progress - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_sweep_completes_on_target_reached() {
        let sink = RecordingSink::default();
        let mut tracker = ProgressTracker::new();
        tracker.record_adjustment(1, 32, 128, &sink);
        let ev_id = tracker.get(1).unwrap().ev_id().to_string();

        let pools = BTreeMap::from([(1, pool(1, 128, 128))]);
        tracker.sweep(&pools, &sink);
        assert!(tracker.is_empty());
        assert_eq!(sink.completed.lock().as_slice(), &[ev_id]);
    }

    #[test]
    fn test_sweep_completes_on_pool_gone() {
        let sink = RecordingSink::default();
        let mut tracker = ProgressTracker::new();
        tracker.record_adjustment(1, 32, 128, &sink);

        tracker.sweep(&BTreeMap::new(), &sink);
        assert!(tracker.is_empty());
        assert_eq!(sink.completed.lock().len(), 1);
    }

    #[test]
    fn test_sweep_completes_stationary_event() {
        let sink = RecordingSink::default();
        let mut tracker = ProgressTracker::new();
        tracker.record_adjustment(1, 64, 64, &sink);

        let pools = BTreeMap::from([(1, pool(1, 48, 64))]);
        tracker.sweep(&pools, &sink);
        assert!(tracker.is_empty());
    }
}
