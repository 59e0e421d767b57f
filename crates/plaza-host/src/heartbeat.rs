//! Periodic heartbeat for the local identity.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use plaza_core::types::Identity;
use plaza_presence::PresenceEngine;

/// A running heartbeat loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct HeartbeatTask {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl HeartbeatTask {
    /// Touch `identity` every `period`, starting one period from now.
    pub fn spawn(engine: PresenceEngine, identity: Identity, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_heartbeat(engine, identity, period, cancel.clone()));
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Whether the loop is still scheduled.
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop the loop without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop the loop and wait for it to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for HeartbeatTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_heartbeat(
    engine: PresenceEngine,
    identity: Identity,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        // A failed beat is retried on the next tick.
        if let Err(e) = engine.touch(&identity).await {
            warn!(%identity, error = %e, "Heartbeat failed");
        }
    }

    debug!(%identity, "Heartbeat loop ended");
}
