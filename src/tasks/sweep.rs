//! Record Sweep Task
//!
//! Background task that periodically removes expired records from the
//! durable local store, independent of any request traffic.

use std::path::PathBuf;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::sweep_expired;

/// Spawns a background task that periodically sweeps a record directory.
///
/// The task runs in an infinite loop, sleeping for `interval` between runs.
/// It only touches the filesystem, so reads and writes for other keys are
/// never blocked by it.
///
/// # Returns
/// A JoinHandle for the spawned task. The owning backend aborts it on
/// shutdown.
pub fn spawn_sweep_task(dir: PathBuf, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            dir = %dir.display(),
            interval_ms = interval.as_millis() as u64,
            "Starting cache sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            match sweep_expired(&dir).await {
                Ok(0) => debug!("Cache sweep: no expired records found"),
                Ok(removed) => info!("Cache sweep: removed {} expired records", removed),
                Err(e) => error!(dir = %dir.display(), error = %e, "Cache sweep failed"),
            }
        }
    })
}
