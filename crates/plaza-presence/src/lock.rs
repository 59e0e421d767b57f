//! Per-identity write serialization.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use plaza_core::types::Identity;

/// One async mutex per identity.
///
/// Every read-modify-write of an identity's documents runs under its
/// lock, so a greeting's membership check and its writes cannot
/// interleave with another greeting or heartbeat from the same host.
#[derive(Debug, Default)]
pub struct IdentityLocks {
    /// Identity → lock
    locks: DashMap<Identity, Arc<Mutex<()>>>,
}

impl IdentityLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lock of `identity`.
    pub async fn acquire(&self, identity: &Identity) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(identity.clone()).or_default().clone();
        lock.lock_owned().await
    }

    /// Number of identities seen so far.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no identity has been locked yet.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
