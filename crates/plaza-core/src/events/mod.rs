//! Change events emitted by the backing store.
//!
//! Events only say *that* something changed; subscribers always
//! recompute from the latest persisted snapshot.

use serde::{Deserialize, Serialize};

use crate::types::{Collection, Identity};

/// A single document write observed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEvent {
    /// Collection that was written.
    pub collection: Collection,
    /// Document key.
    pub identity: Identity,
}

impl StoreEvent {
    /// Create a new event.
    pub fn new(collection: Collection, identity: Identity) -> Self {
        Self {
            collection,
            identity,
        }
    }
}
