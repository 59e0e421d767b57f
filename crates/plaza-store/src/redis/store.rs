//! Redis-backed presence store.
//!
//! Documents live under `{prefix}{collection}:{identity}` as JSON
//! strings. A sorted set per collection remembers first-insertion order,
//! and every write is announced on `{prefix}changes` so that all hosts
//! sharing the server see it.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use redis::AsyncCommands;
use redis::aio::PubSub;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use plaza_core::error::{AppError, ErrorKind};
use plaza_core::events::StoreEvent;
use plaza_core::result::AppResult;
use plaza_core::traits::store::{DocumentWrite, PresenceStore};
use plaza_core::types::{Collection, Identity};

use super::client::RedisClient;
use crate::keys;

/// First delay before re-subscribing after the change stream drops.
const RECONNECT_INITIAL: Duration = Duration::from_millis(500);
/// Upper bound for the reconnect delay.
const RECONNECT_MAX: Duration = Duration::from_secs(30);

/// Redis-backed store.
#[derive(Debug)]
pub struct RedisStore {
    /// Redis client.
    client: RedisClient,
    /// Local fan-out of change events received over pub/sub.
    events: broadcast::Sender<StoreEvent>,
    /// Pub/sub listener task, started by `initialize`.
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl RedisStore {
    /// Create a new Redis store.
    pub fn new(client: RedisClient, buffer_size: usize) -> Self {
        let (events, _) = broadcast::channel(buffer_size.max(1));
        Self {
            client,
            events,
            listener: Mutex::new(None),
        }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Backend, format!("Redis error: {e}"), e)
    }

    fn listener_running(&self) -> bool {
        let guard = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().is_some_and(|h| !h.is_finished())
    }
}

#[async_trait]
impl PresenceStore for RedisStore {
    async fn initialize(&self) -> AppResult<()> {
        if self.listener_running() {
            return Ok(());
        }

        let channel = keys::changes_channel(self.client.prefix());
        let client = self.client.client().clone();
        let pubsub = subscribe(&client, &channel)
            .await
            .map_err(Self::map_err)?;
        info!(channel = %channel, "Listening for presence changes");

        let handle = tokio::spawn(listen(client, channel, pubsub, self.events.clone()));

        let mut guard = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(handle);
        Ok(())
    }

    async fn get(&self, collection: Collection, identity: &Identity) -> AppResult<Option<String>> {
        let key = keys::document(self.client.prefix(), collection, identity);
        let mut conn = self.client.conn_mut();
        let result: Option<String> = conn.get(&key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn put(
        &self,
        collection: Collection,
        identity: &Identity,
        document: &str,
    ) -> AppResult<()> {
        self.put_many(&[DocumentWrite::new(
            collection,
            identity.clone(),
            document,
        )])
        .await
    }

    async fn put_many(&self, writes: &[DocumentWrite]) -> AppResult<()> {
        if writes.is_empty() {
            return Ok(());
        }

        let prefix = self.client.prefix();
        let channel = keys::changes_channel(prefix);
        let inserted_at = Utc::now().timestamp_millis();

        // Documents, indexes and notifications commit in one MULTI/EXEC.
        let mut pipe = redis::pipe();
        pipe.atomic();
        for write in writes {
            let event = serde_json::to_string(&StoreEvent::new(
                write.collection,
                write.identity.clone(),
            ))?;
            pipe.cmd("SET")
                .arg(keys::document(prefix, write.collection, &write.identity))
                .arg(&write.document)
                .ignore()
                .cmd("ZADD")
                .arg(keys::index(prefix, write.collection))
                .arg("NX")
                .arg(inserted_at)
                .arg(write.identity.as_str())
                .ignore()
                .cmd("PUBLISH")
                .arg(&channel)
                .arg(event)
                .ignore();
        }

        let mut conn = self.client.conn_mut();
        let _: () = pipe.query_async(&mut conn).await.map_err(Self::map_err)?;

        for write in writes {
            debug!(collection = %write.collection, identity = %write.identity, "Document written");
        }
        Ok(())
    }

    async fn list(&self, collection: Collection) -> AppResult<Vec<(Identity, String)>> {
        let prefix = self.client.prefix();
        let mut conn = self.client.conn_mut();

        let ids: Vec<String> = redis::cmd("ZRANGE")
            .arg(keys::index(prefix, collection))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let doc_keys: Vec<String> = ids
            .iter()
            .map(|id| keys::document(prefix, collection, &Identity::from(id.as_str())))
            .collect();

        let docs: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&doc_keys)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(ids
            .into_iter()
            .zip(docs)
            .filter_map(|(id, doc)| doc.map(|d| (Identity::from(id), d)))
            .collect())
    }

    fn watch(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }

    fn provider_name(&self) -> &'static str {
        "redis"
    }
}

impl Drop for RedisStore {
    fn drop(&mut self) {
        let guard = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = guard.as_ref() {
            handle.abort();
        }
    }
}

async fn subscribe(client: &redis::Client, channel: &str) -> redis::RedisResult<PubSub> {
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.subscribe(channel).await?;
    Ok(pubsub)
}

fn next_backoff(current: Duration) -> Duration {
    current.saturating_mul(2).min(RECONNECT_MAX)
}

/// Forward change events into `tx` until the subscription drops.
async fn forward(pubsub: PubSub, tx: &broadcast::Sender<StoreEvent>) {
    let mut messages = pubsub.into_on_message();
    while let Some(msg) = messages.next().await {
        let payload: String = match msg.get_payload() {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Unreadable change notification");
                continue;
            }
        };
        match serde_json::from_str::<StoreEvent>(&payload) {
            Ok(event) => {
                let _ = tx.send(event);
            }
            Err(e) => debug!(error = %e, "Ignoring foreign message on change channel"),
        }
    }
}

/// Pub/sub listener loop. Re-subscribes with exponential backoff whenever
/// the connection drops; runs until the store aborts it.
async fn listen(
    client: redis::Client,
    channel: String,
    mut pubsub: PubSub,
    tx: broadcast::Sender<StoreEvent>,
) {
    loop {
        forward(pubsub, &tx).await;
        warn!(channel = %channel, "Redis change listener disconnected");

        let mut delay = RECONNECT_INITIAL;
        pubsub = loop {
            warn!(
                channel = %channel,
                retry_in_ms = delay.as_millis() as u64,
                "Reconnecting Redis change listener"
            );
            tokio::time::sleep(delay).await;
            match subscribe(&client, &channel).await {
                Ok(pubsub) => {
                    info!(channel = %channel, "Redis change listener reconnected");
                    break pubsub;
                }
                Err(e) => {
                    warn!(error = %e, "Redis change listener reconnect failed");
                    delay = next_backoff(delay);
                }
            }
        };
    }
}
