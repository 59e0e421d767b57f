//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::{broadcast, mpsc};

use plaza_core::config::presence::PresenceConfig;
use plaza_core::error::AppError;
use plaza_core::events::StoreEvent;
use plaza_core::result::AppResult;
use plaza_core::traits::store::{DocumentWrite, PresenceStore};
use plaza_core::types::{Collection, Identity, ManualClock};
use plaza_entity::presence::Roster;
use plaza_entity::profile::Profile;
use plaza_presence::{PresenceEngine, Subscription};
use plaza_store::{MemoryStore, StoreManager};

/// In-memory store that can be switched offline to simulate a backend
/// outage, or made to fail only reads or only profile writes.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    offline: AtomicBool,
    failing_reads: AtomicBool,
    failing_user_writes: AtomicBool,
}

impl FlakyStore {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail `get` and `list` while writes keep working
    pub fn set_failing_reads(&self, failing: bool) {
        self.failing_reads.store(failing, Ordering::SeqCst);
    }

    /// Reject any write that touches the users collection
    pub fn set_failing_user_writes(&self, failing: bool) {
        self.failing_user_writes.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(AppError::backend("store offline"))
        } else {
            Ok(())
        }
    }

    fn check_read(&self) -> AppResult<()> {
        self.check()?;
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(AppError::backend("read failed"));
        }
        Ok(())
    }

    fn check_write(&self, collections: impl IntoIterator<Item = Collection>) -> AppResult<()> {
        self.check()?;
        if self.failing_user_writes.load(Ordering::SeqCst)
            && collections.into_iter().any(|c| c == Collection::Users)
        {
            return Err(AppError::backend("users write failed"));
        }
        Ok(())
    }
}

#[async_trait]
impl PresenceStore for FlakyStore {
    async fn initialize(&self) -> AppResult<()> {
        self.check()
    }

    async fn get(&self, collection: Collection, identity: &Identity) -> AppResult<Option<String>> {
        self.check_read()?;
        self.inner.get(collection, identity).await
    }

    async fn put(
        &self,
        collection: Collection,
        identity: &Identity,
        document: &str,
    ) -> AppResult<()> {
        self.check_write([collection])?;
        self.inner.put(collection, identity, document).await
    }

    async fn put_many(&self, writes: &[DocumentWrite]) -> AppResult<()> {
        self.check_write(writes.iter().map(|w| w.collection))?;
        self.inner.put_many(writes).await
    }

    async fn list(&self, collection: Collection) -> AppResult<Vec<(Identity, String)>> {
        self.check_read()?;
        self.inner.list(collection).await
    }

    fn watch(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.watch()
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(!self.offline.load(Ordering::SeqCst))
    }

    fn provider_name(&self) -> &'static str {
        "flaky"
    }
}

/// Test application context
pub struct TestApp {
    /// Engine under test
    pub engine: PresenceEngine,
    /// Clock driving the engine
    pub clock: Arc<ManualClock>,
    /// Backing store, switchable offline
    pub store: Arc<FlakyStore>,
}

impl TestApp {
    /// Create a new test application at [`t0`]
    pub fn new() -> Self {
        let store = Arc::new(FlakyStore::default());
        let clock = Arc::new(ManualClock::new(t0()));
        let engine = PresenceEngine::new(
            StoreManager::from_store(store.clone()),
            clock.clone(),
            &PresenceConfig::default(),
        );
        Self {
            engine,
            clock,
            store,
        }
    }

    /// Move the clock forward
    pub fn advance_minutes(&self, minutes: i64) {
        self.clock.advance(Duration::minutes(minutes));
    }

    /// Save a fresh profile for `uid`
    pub async fn join(&self, uid: &str, name: &str) -> Identity {
        let identity = Identity::from(uid);
        self.engine
            .save(&identity, &profile(name))
            .await
            .expect("save profile");
        identity
    }

    /// Subscribe and collect emissions into a channel
    pub async fn watch(&self) -> (Subscription, RosterStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self
            .engine
            .subscribe(move |roster| {
                let _ = tx.send(roster);
            })
            .await
            .expect("subscribe");
        (subscription, RosterStream { rx })
    }
}

/// Roster emissions received by one subscriber
pub struct RosterStream {
    rx: mpsc::UnboundedReceiver<Roster>,
}

impl RosterStream {
    /// Next emission, failing the test after two seconds
    pub async fn next(&mut self) -> Roster {
        tokio::time::timeout(StdDuration::from_secs(2), self.rx.recv())
            .await
            .expect("timed out waiting for roster")
            .expect("subscription closed")
    }

    /// Wait for an emission matching `pred`
    pub async fn next_matching(&mut self, pred: impl Fn(&Roster) -> bool) -> Roster {
        loop {
            let roster = self.next().await;
            if pred(&roster) {
                return roster;
            }
        }
    }

    /// Whether anything arrives within `ms` milliseconds
    pub async fn is_quiet_for(&mut self, ms: u64) -> bool {
        tokio::time::timeout(StdDuration::from_millis(ms), self.rx.recv())
            .await
            .is_err()
    }
}

/// Fixed start instant: 2024-05-01 09:00 UTC
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

/// A level-1 profile with the `cat` avatar
pub fn profile(name: &str) -> Profile {
    Profile {
        name: name.to_string(),
        avatar_code: "cat".to_string(),
        message: None,
        exp: 0,
        level: 1,
    }
}
