//! Presence engine: applies the presence rules against a store.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use plaza_core::config::AppConfig;
use plaza_core::config::presence::PresenceConfig;
use plaza_core::result::AppResult;
use plaza_core::traits::store::{DocumentWrite, PresenceStore};
use plaza_core::types::{Clock, Collection, DayKey, Identity, SystemClock};
use plaza_entity::GreetingResult;
use plaza_entity::presence::Roster;
use plaza_entity::profile::{Profile, ProfileDocument};
use plaza_entity::session::{Session, SessionDocument};
use plaza_store::StoreManager;

use crate::lock::IdentityLocks;
use crate::rules::greeting::{GreetingOutcome, apply_greeting};
use crate::rules::leveling::LevelingRules;
use crate::rules::liveness::LivenessPolicy;
use crate::rules::rollover::ensure_current_day;
use crate::rules::roster::compose;
use crate::subscription::handle::{CallbackGate, Subscription};
use crate::subscription::listener::{self, RosterCallback};

/// The presence/leveling engine.
///
/// Cheap to clone; clones share the store, clock and identity locks.
#[derive(Debug, Clone)]
pub struct PresenceEngine {
    inner: Arc<EngineInner>,
}

#[derive(Debug)]
struct EngineInner {
    store: StoreManager,
    clock: Arc<dyn Clock>,
    policy: LivenessPolicy,
    rules: LevelingRules,
    locks: IdentityLocks,
}

impl PresenceEngine {
    /// Create an engine over an already initialized store.
    pub fn new(store: StoreManager, clock: Arc<dyn Clock>, config: &PresenceConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                clock,
                policy: LivenessPolicy::from_config(config),
                rules: LevelingRules::from_config(config),
                locks: IdentityLocks::new(),
            }),
        }
    }

    /// Select and initialize the store from configuration and build an
    /// engine on the system clock.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let store =
            StoreManager::new(&config.store, config.presence.channel_buffer_size).await?;
        info!(provider = store.provider_name(), "Presence engine ready");
        Ok(Self::new(store, Arc::new(SystemClock), &config.presence))
    }

    /// The underlying store.
    pub fn store(&self) -> &StoreManager {
        &self.inner.store
    }

    /// Current instant according to the engine clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    /// Liveness thresholds in effect.
    pub fn policy(&self) -> &LivenessPolicy {
        &self.inner.policy
    }

    /// Leveling rules in effect.
    pub fn rules(&self) -> &LevelingRules {
        &self.inner.rules
    }

    /// Check that the backing store is reachable.
    pub async fn health_check(&self) -> AppResult<bool> {
        self.inner.store.health_check().await
    }

    // ── Profiles ──────────────────────────────────────────────

    /// Load a profile. `None` on first run.
    pub async fn load(&self, identity: &Identity) -> AppResult<Option<Profile>> {
        let doc: Option<ProfileDocument> = self
            .inner
            .store
            .get_json(Collection::Users, identity)
            .await?;
        Ok(doc.map(Profile::from))
    }

    /// Upsert a profile and make the identity visible right away.
    pub async fn save(&self, identity: &Identity, profile: &Profile) -> AppResult<()> {
        self.save_at(identity, profile, self.now()).await
    }

    /// [`save`](Self::save) at an explicit instant.
    ///
    /// Besides writing the profile this creates the session if it does not
    /// exist and refreshes its heartbeat if it does.
    pub async fn save_at(
        &self,
        identity: &Identity,
        profile: &Profile,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let _guard = self.inner.locks.acquire(identity).await;
        self.write_profile(identity, profile).await?;
        self.heartbeat_locked(identity, now).await?;
        info!(%identity, name = %profile.name, "Profile saved");
        Ok(())
    }

    // ── Sessions ──────────────────────────────────────────────

    /// Load a session as of now. `None` if the identity never sent a
    /// heartbeat.
    pub async fn session(&self, identity: &Identity) -> AppResult<Option<Session>> {
        self.session_at(identity, self.now()).await
    }

    /// Load a session with its greeted-set valid for the day of `now`.
    ///
    /// A greeted-set recorded on an earlier day reads back empty; the
    /// stored document is left untouched.
    pub async fn session_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        let mut session = self.read_session(identity).await?;
        if let Some(session) = session.as_mut() {
            ensure_current_day(session, DayKey::of(now));
        }
        Ok(session)
    }

    /// Record a heartbeat now.
    pub async fn touch(&self, identity: &Identity) -> AppResult<()> {
        self.touch_at(identity, self.now()).await
    }

    /// Record a heartbeat at `now`, creating the session if needed and
    /// rolling the greeted-set over to today's date.
    pub async fn touch_at(&self, identity: &Identity, now: DateTime<Utc>) -> AppResult<()> {
        let _guard = self.inner.locks.acquire(identity).await;
        self.heartbeat_locked(identity, now).await
    }

    /// Clear today's greeted-set now. No-op without a session.
    pub async fn reset_greetings(&self, identity: &Identity) -> AppResult<()> {
        self.reset_greetings_at(identity, self.now()).await
    }

    /// [`reset_greetings`](Self::reset_greetings) at an explicit instant.
    pub async fn reset_greetings_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let _guard = self.inner.locks.acquire(identity).await;
        let Some(mut session) = self.read_session(identity).await? else {
            return Ok(());
        };
        session.greeted_today.clear();
        session.greeted_date = Some(DayKey::of(now));
        self.write_session(&session).await?;
        debug!(%identity, "Greeted list reset");
        Ok(())
    }

    // ── Greetings ─────────────────────────────────────────────

    /// Greet `greeted` on behalf of `greeter` now.
    pub async fn greet(
        &self,
        greeter: &Identity,
        greeted: &Identity,
    ) -> AppResult<Option<GreetingResult>> {
        self.greet_at(greeter, greeted, self.now()).await
    }

    /// Greet at an explicit instant.
    ///
    /// Returns the new progression when experience was awarded, and
    /// `None` when the greeter has no session, greets themselves, already
    /// greeted `greeted` today, or has no profile. An award stores the
    /// session and the profile in one batch, so a failed write leaves
    /// both untouched and the greeting can be retried.
    pub async fn greet_at(
        &self,
        greeter: &Identity,
        greeted: &Identity,
        now: DateTime<Utc>,
    ) -> AppResult<Option<GreetingResult>> {
        let _guard = self.inner.locks.acquire(greeter).await;

        let Some(mut session) = self.read_session(greeter).await? else {
            debug!(%greeter, "Greeting before joining ignored");
            return Ok(None);
        };
        let mut profile = self.load(greeter).await?;

        let outcome = apply_greeting(
            &mut session,
            profile.as_mut(),
            greeted,
            DayKey::of(now),
            &self.inner.rules,
        );

        match (outcome, profile) {
            (GreetingOutcome::Awarded(result), Some(profile)) => {
                let writes = [
                    DocumentWrite::json(
                        Collection::Sessions,
                        greeter,
                        &SessionDocument::from(&session),
                    )?,
                    DocumentWrite::json(
                        Collection::Users,
                        greeter,
                        &ProfileDocument::from(&profile),
                    )?,
                ];
                self.inner.store.put_many(&writes).await?;
                info!(%greeter, %greeted, exp = result.exp, level = result.level, "Greeting awarded");
                Ok(Some(result))
            }
            (outcome, _) => {
                if outcome.session_changed() {
                    self.write_session(&session).await?;
                }
                debug!(%greeter, %greeted, ?outcome, "Greeting awarded nothing");
                Ok(None)
            }
        }
    }

    // ── Roster ────────────────────────────────────────────────

    /// Compose the roster at the engine's current time.
    pub async fn roster(&self) -> AppResult<Roster> {
        self.roster_at(self.now()).await
    }

    /// Compose the roster from the latest persisted snapshot at `now`.
    pub async fn roster_at(&self, now: DateTime<Utc>) -> AppResult<Roster> {
        let store = &self.inner.store;
        let sessions = store.list(Collection::Sessions).await?;
        let users = store.list(Collection::Users).await?;

        let mut profiles = HashMap::with_capacity(users.len());
        for (identity, raw) in users {
            match serde_json::from_str::<ProfileDocument>(&raw) {
                Ok(doc) => {
                    profiles.insert(identity, Profile::from(doc));
                }
                Err(e) => warn!(%identity, error = %e, "Skipping unreadable profile"),
            }
        }

        let mut parsed = Vec::with_capacity(sessions.len());
        for (identity, raw) in sessions {
            match serde_json::from_str::<SessionDocument>(&raw) {
                Ok(doc) => parsed.push(doc.into_session(identity)),
                Err(e) => warn!(%identity, error = %e, "Skipping unreadable session"),
            }
        }

        Ok(compose(parsed, &profiles, &self.inner.policy, now))
    }

    /// Subscribe to roster changes.
    ///
    /// `on_change` receives the current roster before this returns and
    /// again after every subsequent store change, always recomputed at
    /// emission time. Every subscription gets its own stream.
    pub async fn subscribe<F>(&self, on_change: F) -> AppResult<Subscription>
    where
        F: Fn(Roster) + Send + Sync + 'static,
    {
        let callback: RosterCallback = Arc::new(on_change);

        // Watch before the first snapshot so no change falls in between.
        let events = self.inner.store.watch();
        let initial = self.roster().await?;
        callback(initial);

        let gate = Arc::new(CallbackGate::new());
        let cancel = CancellationToken::new();
        let mut subscription = Subscription::new(Arc::clone(&gate), cancel.clone());

        let task = tokio::spawn(listener::run(
            self.clone(),
            events,
            callback,
            gate,
            cancel,
            subscription.id(),
        ));
        subscription.attach(task);

        debug!(subscription = subscription.id(), "Roster subscription started");
        Ok(subscription)
    }

    // ── Internals ─────────────────────────────────────────────

    /// Heartbeat body; caller holds the identity lock.
    async fn heartbeat_locked(&self, identity: &Identity, now: DateTime<Utc>) -> AppResult<()> {
        let today = DayKey::of(now);
        let session = match self.read_session(identity).await? {
            Some(mut session) => {
                if ensure_current_day(&mut session, today) {
                    debug!(%identity, %today, "Greeted list rolled over");
                }
                session.last_heartbeat = Some(now);
                session
            }
            None => {
                debug!(%identity, "Creating session");
                Session::new(identity.clone(), Some(now), today)
            }
        };
        self.write_session(&session).await
    }

    /// The stored session as written, without day rollover.
    async fn read_session(&self, identity: &Identity) -> AppResult<Option<Session>> {
        let doc: Option<SessionDocument> = self
            .inner
            .store
            .get_json(Collection::Sessions, identity)
            .await?;
        Ok(doc.map(|d| d.into_session(identity.clone())))
    }

    async fn write_session(&self, session: &Session) -> AppResult<()> {
        self.inner
            .store
            .put_json(
                Collection::Sessions,
                &session.identity,
                &SessionDocument::from(session),
            )
            .await
    }

    async fn write_profile(&self, identity: &Identity, profile: &Profile) -> AppResult<()> {
        self.inner
            .store
            .put_json(Collection::Users, identity, &ProfileDocument::from(profile))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use plaza_core::types::ManualClock;
    use plaza_entity::presence::LivenessState;
    use tokio::sync::mpsc;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn engine() -> (PresenceEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let engine = PresenceEngine::new(
            StoreManager::in_memory(64),
            clock.clone(),
            &PresenceConfig::default(),
        );
        (engine, clock)
    }

    fn kai() -> Profile {
        Profile {
            name: "Kai".to_string(),
            avatar_code: "cat".to_string(),
            message: None,
            exp: 0,
            level: 1,
        }
    }

    #[tokio::test]
    async fn test_load_absent_is_none() {
        let (engine, _) = engine();
        assert!(engine.load(&Identity::from("nobody")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_creates_visible_session() {
        let (engine, _) = engine();
        let a = Identity::from("a");
        engine.save(&a, &kai()).await.unwrap();

        assert_eq!(engine.load(&a).await.unwrap(), Some(kai()));
        let roster = engine.roster().await.unwrap();
        assert_eq!(roster.get(&a).map(|e| e.state), Some(LivenessState::Active));
    }

    #[tokio::test]
    async fn test_touch_creates_then_refreshes() {
        let (engine, clock) = engine();
        let a = Identity::from("a");
        engine.touch(&a).await.unwrap();
        let created = engine.session(&a).await.unwrap().unwrap();
        assert_eq!(created.last_heartbeat, Some(start()));
        assert_eq!(created.greeted_date, Some(DayKey::of(start())));

        clock.advance(Duration::minutes(5));
        engine.touch(&a).await.unwrap();
        let refreshed = engine.session(&a).await.unwrap().unwrap();
        assert_eq!(refreshed.last_heartbeat, Some(start() + Duration::minutes(5)));
    }

    #[tokio::test]
    async fn test_touch_rolls_greetings_over() {
        let (engine, clock) = engine();
        let (a, b) = (Identity::from("a"), Identity::from("b"));
        engine.save(&a, &kai()).await.unwrap();
        engine.greet(&a, &b).await.unwrap();

        clock.advance(Duration::days(1));
        engine.touch(&a).await.unwrap();
        let session = engine.session(&a).await.unwrap().unwrap();
        assert!(session.greeted_today.is_empty());
        assert_eq!(session.greeted_date, Some(DayKey::of(clock.now())));
    }

    #[tokio::test]
    async fn test_session_reads_back_rolled_over() {
        let (engine, clock) = engine();
        let (a, b) = (Identity::from("a"), Identity::from("b"));
        engine.save(&a, &kai()).await.unwrap();
        engine.greet(&a, &b).await.unwrap();
        assert!(engine.session(&a).await.unwrap().unwrap().has_greeted(&b));

        clock.advance(Duration::days(1));
        let session = engine.session(&a).await.unwrap().unwrap();
        assert!(session.greeted_today.is_empty());
        assert_eq!(session.greeted_date, Some(DayKey::of(clock.now())));
        // Still eligible: reading did not consume the new day.
        assert!(engine.greet(&a, &b).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_greet_without_session_is_noop() {
        let (engine, _) = engine();
        let result = engine
            .greet(&Identity::from("a"), &Identity::from("b"))
            .await
            .unwrap();
        assert_eq!(result, None);
        assert!(engine.session(&Identity::from("a")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_greet_awards_once_per_day() {
        let (engine, clock) = engine();
        let (a, b) = (Identity::from("a"), Identity::from("b"));
        engine.save(&a, &kai()).await.unwrap();

        let first = engine.greet(&a, &b).await.unwrap();
        assert_eq!(first, Some(GreetingResult { exp: 120, level: 1 }));
        assert_eq!(engine.greet(&a, &b).await.unwrap(), None);
        assert_eq!(engine.load(&a).await.unwrap().unwrap().exp, 120);

        clock.advance(Duration::days(1));
        let next = engine.greet(&a, &b).await.unwrap();
        assert_eq!(next, Some(GreetingResult { exp: 240, level: 1 }));
    }

    #[tokio::test]
    async fn test_greet_without_profile_records_membership() {
        let (engine, _) = engine();
        let (a, b) = (Identity::from("a"), Identity::from("b"));
        engine.touch(&a).await.unwrap();

        assert_eq!(engine.greet(&a, &b).await.unwrap(), None);
        let session = engine.session(&a).await.unwrap().unwrap();
        assert!(session.has_greeted(&b));
    }

    #[tokio::test]
    async fn test_concurrent_greets_award_once() {
        let (engine, _) = engine();
        let (a, b) = (Identity::from("a"), Identity::from("b"));
        engine.save(&a, &kai()).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let engine = engine.clone();
            let (a, b) = (a.clone(), b.clone());
            tasks.push(tokio::spawn(async move { engine.greet(&a, &b).await }));
        }
        let mut awarded = 0;
        for task in tasks {
            if task.await.unwrap().unwrap().is_some() {
                awarded += 1;
            }
        }
        assert_eq!(awarded, 1);
        assert_eq!(engine.load(&a).await.unwrap().unwrap().exp, 120);
    }

    #[tokio::test]
    async fn test_roster_skips_unreadable_documents() {
        let (engine, _) = engine();
        let a = Identity::from("a");
        engine.save(&a, &kai()).await.unwrap();
        engine
            .store()
            .put(Collection::Sessions, &Identity::from("z"), "not json")
            .await
            .unwrap();

        let roster = engine.roster().await.unwrap();
        assert_eq!(roster.len(), 1);
        assert!(roster.contains(&a));
    }

    #[tokio::test]
    async fn test_reset_greetings() {
        let (engine, _) = engine();
        let (a, b) = (Identity::from("a"), Identity::from("b"));
        engine.reset_greetings(&a).await.unwrap();
        assert!(engine.session(&a).await.unwrap().is_none());

        engine.save(&a, &kai()).await.unwrap();
        engine.greet(&a, &b).await.unwrap();
        engine.reset_greetings(&a).await.unwrap();
        assert!(engine.greet(&a, &b).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_subscribe_emits_initial_and_changes() {
        let (engine, _) = engine();
        let a = Identity::from("a");
        engine.save(&a, &kai()).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription = engine
            .subscribe(move |roster| {
                let _ = tx.send(roster);
            })
            .await
            .unwrap();

        let initial = rx.recv().await.unwrap();
        assert!(initial.contains(&a));

        engine.touch(&Identity::from("b")).await.unwrap();
        let next = rx.recv().await.unwrap();
        // b has no profile and stays invisible.
        assert_eq!(next.len(), 1);

        subscription.unsubscribe();
        subscription.unsubscribe();
        assert!(!subscription.is_active());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unsubscribe_waits_for_running_callback() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let (engine, _) = engine();
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let (s, f) = (Arc::clone(&started), Arc::clone(&finished));
        let subscription = engine
            .subscribe(move |_| {
                s.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(100));
                f.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        engine.touch(&Identity::from("a")).await.unwrap();
        while started.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        subscription.unsubscribe();
        assert_eq!(finished.load(Ordering::SeqCst), 2);

        engine.touch(&Identity::from("a")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        assert_eq!(started.load(Ordering::SeqCst), 2);
    }
}
