// PG Autoscaler - placement-group sizing for distributed object storage
// Core library module

pub mod cluster;
pub mod commands;
pub mod config;
pub mod control;
pub mod error;
pub mod health;
pub mod progress;
pub mod scaler;

pub use cluster::{ClusterCommands, ClusterProvider, ClusterSnapshot, InMemoryClusterProvider};
pub use config::ScalerConfig;
pub use control::Autoscaler;
pub use error::{Result, ScalerError};
pub use health::HealthSink;
pub use progress::ProgressSink;
pub use scaler::{PoolScaleResult, ScaleProfile};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
