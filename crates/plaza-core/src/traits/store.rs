//! Document store trait for pluggable presence backends.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::events::StoreEvent;
use crate::result::AppResult;
use crate::types::{Collection, Identity};

/// One document replacement inside a [`PresenceStore::put_many`] batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentWrite {
    pub collection: Collection,
    pub identity: Identity,
    pub document: String,
}

impl DocumentWrite {
    pub fn new(collection: Collection, identity: Identity, document: impl Into<String>) -> Self {
        Self {
            collection,
            identity,
            document: document.into(),
        }
    }

    /// Serialize `value` into a write for `identity` in `collection`.
    pub fn json<T: serde::Serialize>(
        collection: Collection,
        identity: &Identity,
        value: &T,
    ) -> AppResult<Self> {
        Ok(Self::new(collection, identity.clone(), serde_json::to_string(value)?))
    }
}

/// A small document store with per-key writes and change notification.
///
/// Documents are JSON strings. Each `put` replaces one whole document
/// atomically. `put_many` applies several replacements as one unit:
/// either every write lands or none does.
#[async_trait]
pub trait PresenceStore: Send + Sync + std::fmt::Debug + 'static {
    /// Prepare the store for use (connect, start change listeners).
    async fn initialize(&self) -> AppResult<()>;

    /// Read one document. `None` if it was never written.
    async fn get(&self, collection: Collection, identity: &Identity) -> AppResult<Option<String>>;

    /// Create or replace one document.
    async fn put(&self, collection: Collection, identity: &Identity, document: &str)
    -> AppResult<()>;

    /// Create or replace several documents all-or-nothing.
    ///
    /// Change events are emitted only after the whole batch is stored.
    async fn put_many(&self, writes: &[DocumentWrite]) -> AppResult<()>;

    /// All documents of a collection, in first-insertion order.
    async fn list(&self, collection: Collection) -> AppResult<Vec<(Identity, String)>>;

    /// Subscribe to change events for every collection.
    fn watch(&self) -> broadcast::Receiver<StoreEvent>;

    /// Check that the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Short provider name for logs (`"memory"`, `"redis"`).
    fn provider_name(&self) -> &'static str;

    /// Read and deserialize a document.
    async fn get_json<T: serde::de::DeserializeOwned + Send>(
        &self,
        collection: Collection,
        identity: &Identity,
    ) -> AppResult<Option<T>>
    where
        Self: Sized,
    {
        match self.get(collection, identity).await? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    /// Serialize and write a document.
    async fn put_json<T: serde::Serialize + Send + Sync>(
        &self,
        collection: Collection,
        identity: &Identity,
        value: &T,
    ) -> AppResult<()>
    where
        Self: Sized,
    {
        let json = serde_json::to_string(value)?;
        self.put(collection, identity, &json).await
    }
}
