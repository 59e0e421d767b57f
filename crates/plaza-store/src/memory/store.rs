//! In-memory document tables with broadcast change notification.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use plaza_core::events::StoreEvent;
use plaza_core::result::AppResult;
use plaza_core::traits::store::{DocumentWrite, PresenceStore};
use plaza_core::types::{Collection, Identity};

/// One collection: documents plus their first-insertion order.
#[derive(Debug, Default)]
struct Table {
    order: Vec<Identity>,
    docs: HashMap<Identity, String>,
}

/// In-memory store. Every write publishes a [`StoreEvent`].
#[derive(Debug)]
pub struct MemoryStore {
    /// Collection → table
    tables: RwLock<HashMap<Collection, Table>>,
    /// Change notifications
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    /// Create an empty store whose change channel buffers `buffer_size`
    /// events per subscriber.
    pub fn new(buffer_size: usize) -> Self {
        let (events, _) = broadcast::channel(buffer_size.max(1));
        Self {
            tables: RwLock::new(HashMap::new()),
            events,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl PresenceStore for MemoryStore {
    async fn initialize(&self) -> AppResult<()> {
        Ok(())
    }

    async fn get(&self, collection: Collection, identity: &Identity) -> AppResult<Option<String>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&collection)
            .and_then(|t| t.docs.get(identity))
            .cloned())
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
        {
            let mut tables = self.tables.write().await;
            for write in writes {
                let table = tables.entry(write.collection).or_default();
                if table
                    .docs
                    .insert(write.identity.clone(), write.document.clone())
                    .is_none()
                {
                    table.order.push(write.identity.clone());
                }
            }
        }

        for write in writes {
            let receivers = self
                .events
                .send(StoreEvent::new(write.collection, write.identity.clone()))
                .unwrap_or(0);
            debug!(collection = %write.collection, identity = %write.identity, receivers, "Document written");
        }
        Ok(())
    }

    async fn list(&self, collection: Collection) -> AppResult<Vec<(Identity, String)>> {
        let tables = self.tables.read().await;
        let Some(table) = tables.get(&collection) else {
            return Ok(Vec::new());
        };
        Ok(table
            .order
            .iter()
            .filter_map(|id| table.docs.get(id).map(|doc| (id.clone(), doc.clone())))
            .collect())
    }

    fn watch(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
