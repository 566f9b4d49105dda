/// Autoscaler Control Loop
///
/// Periodically sizes every pool against a fresh cluster snapshot, applies
/// adjustments to pools in automatic mode, publishes health warnings and
/// per-pool progress, and sleeps until the next pass or shutdown.

use crate::cluster::{AutoscaleMode, ClusterCommands, ClusterProvider, ClusterRelease};
use crate::config::ScalerConfig;
use crate::error::Result;
use crate::health::{self, HealthSink};
use crate::progress::{ProgressSink, ProgressTracker};
use crate::scaler::{self, PoolScaleResult, ScaleProfile};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// The autoscaler engine, generic over its four collaborators: the snapshot
/// provider, the mutation transport, the progress bus, and the health bus.
pub struct Autoscaler<C, T, P, H>
where
    C: ClusterProvider,
    T: ClusterCommands,
    P: ProgressSink,
    H: HealthSink,
{
    provider: C,
    commands: T,
    progress: P,
    health: H,
    config: RwLock<ScalerConfig>,
    tracker: ProgressTracker,
}

impl<C, T, P, H> Autoscaler<C, T, P, H>
where
    C: ClusterProvider,
    T: ClusterCommands,
    P: ProgressSink,
    H: HealthSink,
{
    pub fn new(provider: C, commands: T, progress: P, health: H, config: ScalerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            provider,
            commands,
            progress,
            health,
            config: RwLock::new(config),
            tracker: ProgressTracker::new(),
        })
    }

    /// Active configuration (copy).
    pub fn config(&self) -> ScalerConfig {
        self.config.read().clone()
    }

    /// Switch the sizing profile; idempotent. Returns whether the active
    /// profile changed.
    pub fn set_profile(&self, profile: ScaleProfile) -> bool {
        let mut config = self.config.write();
        if config.profile == profile {
            false
        } else {
            info!(%profile, "switching autoscale profile");
            config.profile = profile;
            true
        }
    }

    /// Size every pool against a fresh snapshot without acting on the
    /// result. Backs the read-only status report.
    pub fn evaluate(&self) -> Result<Vec<PoolScaleResult>> {
        let snapshot = self.provider.fetch()?;
        let config = self.config();
        let (results, _) = scaler::pool_status(&snapshot, &config)?;
        Ok(results)
    }

    /// One full pass: size, mutate, publish health.
    pub fn maybe_adjust(&mut self) -> Result<()> {
        let snapshot = self.provider.fetch()?;
        if snapshot.require_osd_release < ClusterRelease::MIN_SUPPORTED {
            debug!(
                release = ?snapshot.require_osd_release,
                "cluster release below minimum supported, skipping pass"
            );
            return Ok(());
        }

        let config = self.config();
        let (results, subtrees) = scaler::pool_status(&snapshot, &config)?;

        // All sizing decisions are final before the first mutation goes out.
        for r in results.iter().filter(|r| r.would_adjust) {
            if r.pg_autoscale_mode != AutoscaleMode::On {
                continue;
            }
            let Some(pool) = snapshot.pools.get(&r.pool_id) else {
                continue;
            };
            let outcome = self.commands.set_pool_pg_num(&r.pool_name, r.pg_num_final);
            self.tracker
                .record_adjustment(r.pool_id, pool.pg_num, r.pg_num_final, &self.progress);
            if let Err(e) = outcome {
                error!(
                    pool = %r.pool_name,
                    pg_num = r.pg_num_final,
                    error = %e,
                    "pg_num adjustment failed"
                );
            }
        }

        let report = health::build_health_report(&results, &snapshot.pools, &subtrees);
        self.health.publish(report);
        Ok(())
    }

    /// Advance progress events against the live pool table. Runs on a fresh
    /// snapshot so mutations issued this pass are visible.
    pub fn update_progress_events(&mut self) -> Result<()> {
        let snapshot = self.provider.fetch()?;
        self.tracker.sweep(&snapshot.pools, &self.progress);
        Ok(())
    }

    /// One loop iteration; provider errors are logged, never fatal.
    pub fn run_once(&mut self) {
        if let Err(e) = self.maybe_adjust() {
            error!(error = %e, "autoscale pass failed");
        }
        if let Err(e) = self.update_progress_events() {
            error!(error = %e, "progress pass failed");
        }
    }

    /// Pools currently being driven toward a new PG count.
    pub fn tracked_pools(&self) -> usize {
        self.tracker.len()
    }

    /// Run until the shutdown channel signals. The in-flight iteration
    /// always completes; only the sleep is interruptible.
    pub async fn serve(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!("starting pg autoscaler");
        loop {
            if *shutdown.borrow() {
                break;
            }
            self.run_once();
            let interval = self.config.read().sleep_interval();
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    break;
                }
            }
        }
        info!("stopping pg autoscaler");
    }
}
