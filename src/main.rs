// # PG Autoscaler status tool
//
// Loads a cluster snapshot from a JSON file and reports the per-pool PG
// sizing recommendation, the same evaluation the control loop acts on.
// With --serve, keeps evaluating the snapshot file on the loop interval
// until interrupted.

use pg_autoscaler::cluster::ClusterSnapshot;
use pg_autoscaler::commands::{render_status, StatusFormat};
use pg_autoscaler::config::ScalerConfig;
use pg_autoscaler::control::Autoscaler;
use pg_autoscaler::error::{Result, ScalerError};
use pg_autoscaler::health::{HealthReport, HealthSink};
use pg_autoscaler::progress::ProgressSink;
use pg_autoscaler::scaler::ScaleProfile;
use pg_autoscaler::InMemoryClusterProvider;
use tracing::{error, info, warn};

struct CliArgs {
    snapshot_path: String,
    format: StatusFormat,
    profile: Option<ScaleProfile>,
    serve: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut snapshot_path = None;
    let mut format = StatusFormat::Plain;
    let mut profile = None;
    let mut serve = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--format" => {
                let value = args.next().ok_or_else(|| {
                    ScalerError::InvalidInput("--format requires a value".into())
                })?;
                format = value.parse()?;
            }
            "--profile" => {
                let value = args.next().ok_or_else(|| {
                    ScalerError::InvalidInput("--profile requires a value".into())
                })?;
                profile = Some(value.parse()?);
            }
            "--serve" => serve = true,
            "--help" | "-h" => {
                println!(
                    "usage: pg-autoscaler <snapshot.json> [--format plain|json] \
                     [--profile scale-up|scale-down] [--serve]"
                );
                std::process::exit(0);
            }
            other if snapshot_path.is_none() => snapshot_path = Some(other.to_string()),
            other => {
                return Err(ScalerError::InvalidInput(format!(
                    "unexpected argument '{}'",
                    other
                )))
            }
        }
    }

    Ok(CliArgs {
        snapshot_path: snapshot_path
            .ok_or_else(|| ScalerError::InvalidInput("missing snapshot file path".into()))?,
        format,
        profile,
        serve,
    })
}

/// Progress bus that reports through the log.
struct LogProgress;

impl ProgressSink for LogProgress {
    fn update(&self, ev_id: &str, message: String, progress: f64, pool_id: u64) {
        info!(ev_id, pool_id, progress, "{}", message);
    }

    fn complete(&self, ev_id: &str) {
        info!(ev_id, "adjustment complete");
    }
}

/// Health bus that reports through the log.
struct LogHealth;

impl HealthSink for LogHealth {
    fn publish(&self, report: HealthReport) {
        for (code, check) in &report {
            warn!(code = %code, count = check.count, "{}", check.summary);
        }
    }
}

/// Mutation transport that only records intent; a snapshot file has no
/// cluster behind it to mutate.
struct LogCommands;

impl pg_autoscaler::ClusterCommands for LogCommands {
    fn set_pool_pg_num(&self, pool_name: &str, pg_num: u32) -> Result<()> {
        info!(pool = pool_name, pg_num, "would set pg_num");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = parse_args()?;
    let data = std::fs::read_to_string(&args.snapshot_path)?;
    let snapshot = ClusterSnapshot::from_json(&data)?;
    info!(
        pools = snapshot.pools.len(),
        osds = snapshot.osd_stats.len(),
        "loaded cluster snapshot"
    );

    let mut config = ScalerConfig::default();
    if let Some(profile) = args.profile {
        config.profile = profile;
    }
    config.validate()?;

    let provider = InMemoryClusterProvider::new(snapshot);
    let mut engine = Autoscaler::new(provider, LogCommands, LogProgress, LogHealth, config)?;

    let results = engine.evaluate()?;
    print!("{}", render_status(&results, args.format)?);

    if args.serve {
        let (tx, rx) = tokio::sync::watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(true);
            } else {
                error!("failed to install ctrl-c handler");
            }
        });
        engine.serve(rx).await;
    }

    Ok(())
}
