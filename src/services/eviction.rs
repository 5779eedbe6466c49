//! Idle-room eviction: periodic sweep requests to the hub.
//!
//! The task only enqueues `Sweep` commands; the hub evicts rooms on its own
//! task so eviction is ordered with every other mutation. It exits once the
//! hub stops accepting commands.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::hub::HubHandle;

/// Spawn the background sweep task. Returns a handle for shutdown.
pub fn spawn_sweep_task(hub: HubHandle, interval: Duration, ttl: Duration) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), ttl_secs = ttl.as_secs(), "idle room eviction configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = hub.sweep(ttl).await {
                warn!(error = %e, "idle sweep stopped");
                break;
            }
        }
    })
}

#[cfg(test)]
#[path = "eviction_test.rs"]
mod tests;
