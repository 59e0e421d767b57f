//! Background task that turns store changes into roster emissions.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use plaza_core::events::StoreEvent;
use plaza_entity::presence::Roster;

use crate::engine::PresenceEngine;
use crate::subscription::handle::CallbackGate;

/// Callback receiving every roster emission.
pub type RosterCallback = Arc<dyn Fn(Roster) + Send + Sync + 'static>;

/// Recompute and emit the roster after every store change until
/// cancelled.
///
/// Rosters are always rebuilt from the latest persisted snapshot, so a
/// lagged receiver loses nothing but intermediate emissions.
pub(crate) async fn run(
    engine: PresenceEngine,
    mut events: broadcast::Receiver<StoreEvent>,
    on_change: RosterCallback,
    gate: Arc<CallbackGate>,
    cancel: CancellationToken,
    subscription_id: u64,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => event,
        };

        match event {
            Ok(event) => {
                debug!(
                    subscription = subscription_id,
                    collection = %event.collection,
                    identity = %event.identity,
                    "Store changed"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(subscription = subscription_id, skipped, "Roster listener lagged");
            }
            Err(RecvError::Closed) => break,
        }

        match engine.roster().await {
            Ok(roster) => {
                gate.deliver(subscription_id, || on_change(roster));
            }
            Err(e) => {
                warn!(subscription = subscription_id, error = %e, "Failed to recompute roster");
            }
        }
    }

    debug!(subscription = subscription_id, "Roster listener ended");
}
