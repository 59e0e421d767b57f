//! Store manager that dispatches to the configured provider.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{info, warn};

use plaza_core::config::store::StoreConfig;
use plaza_core::error::AppError;
use plaza_core::events::StoreEvent;
use plaza_core::result::AppResult;
use plaza_core::traits::store::{DocumentWrite, PresenceStore};
use plaza_core::types::{Collection, Identity};

use crate::memory::MemoryStore;

/// Store manager that wraps the configured store.
///
/// The store is selected and initialized once at construction time and
/// never switches afterwards.
#[derive(Debug, Clone)]
pub struct StoreManager {
    /// The inner store.
    inner: Arc<dyn PresenceStore>,
}

impl StoreManager {
    /// Create a new store manager from configuration.
    ///
    /// When the live store cannot be reached and `fallback_to_memory` is
    /// set, the manager logs a warning and continues with an in-memory
    /// store.
    pub async fn new(config: &StoreConfig, buffer_size: usize) -> AppResult<Self> {
        let inner: Arc<dyn PresenceStore> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis presence store");
                match Self::connect_redis(config, buffer_size).await {
                    Ok(store) => store,
                    Err(e) if config.fallback_to_memory => {
                        warn!(
                            error = %e,
                            "Failed to initialize Redis store, falling back to in-memory store"
                        );
                        Arc::new(MemoryStore::new(buffer_size))
                    }
                    Err(e) => return Err(e),
                }
            }
            "memory" => {
                info!("Initializing in-memory presence store");
                Arc::new(MemoryStore::new(buffer_size))
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        inner.initialize().await?;
        Ok(Self { inner })
    }

    #[cfg(feature = "redis-backend")]
    async fn connect_redis(
        config: &StoreConfig,
        buffer_size: usize,
    ) -> AppResult<Arc<dyn PresenceStore>> {
        let client = crate::redis::RedisClient::connect(&config.redis).await?;
        let store = crate::redis::RedisStore::new(client, buffer_size);
        store.initialize().await?;
        Ok(Arc::new(store))
    }

    /// Create a store manager from an existing store (for testing).
    pub fn from_store(store: Arc<dyn PresenceStore>) -> Self {
        Self { inner: store }
    }

    /// An in-memory store manager.
    pub fn in_memory(buffer_size: usize) -> Self {
        Self::from_store(Arc::new(MemoryStore::new(buffer_size)))
    }

    /// Get a reference to the inner store.
    pub fn store(&self) -> &dyn PresenceStore {
        self.inner.as_ref()
    }
}

#[async_trait]
impl PresenceStore for StoreManager {
    async fn initialize(&self) -> AppResult<()> {
        self.inner.initialize().await
    }

    async fn get(&self, collection: Collection, identity: &Identity) -> AppResult<Option<String>> {
        self.inner.get(collection, identity).await
    }

    async fn put(
        &self,
        collection: Collection,
        identity: &Identity,
        document: &str,
    ) -> AppResult<()> {
        self.inner.put(collection, identity, document).await
    }

    async fn put_many(&self, writes: &[DocumentWrite]) -> AppResult<()> {
        self.inner.put_many(writes).await
    }

    async fn list(&self, collection: Collection) -> AppResult<Vec<(Identity, String)>> {
        self.inner.list(collection).await
    }

    fn watch(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.watch()
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}
