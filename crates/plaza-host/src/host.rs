//! Session host: dispatches UI intents against the presence engine.

use std::collections::HashSet;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use plaza_core::config::host::HostConfig;
use plaza_core::error::{AppError, ErrorKind};
use plaza_core::result::AppResult;
use plaza_core::types::Identity;
use plaza_entity::presence::Roster;
use plaza_entity::profile::{Profile, ProfileDraft};
use plaza_presence::{PresenceEngine, Subscription};

use crate::heartbeat::HeartbeatTask;
use crate::identity::IdentityStore;
use crate::message::{HostInbound, HostOutbound, JoinedPayload, SessionPayload};

const LOAD_PROFILE_FAILED: &str = "Failed to load your profile.";
const SAVE_PROFILE_FAILED: &str = "Failed to save your profile.";
const START_SESSION_FAILED: &str = "Failed to start the session.";
const GREETING_FAILED: &str = "Failed to record the greeting.";

/// Acts on behalf of the local identity.
///
/// Owns the cached profile, the roster subscription and the heartbeat
/// task. Every intent is handled to completion before the next one.
#[derive(Debug)]
pub struct SessionHost {
    engine: PresenceEngine,
    identity: Identity,
    local: IdentityStore,
    outbound: mpsc::Sender<HostOutbound>,
    heartbeat_interval: Duration,
    state: Mutex<HostState>,
}

#[derive(Debug, Default)]
struct HostState {
    profile: Option<Profile>,
    subscription: Option<Subscription>,
    heartbeat: Option<HeartbeatTask>,
}

impl SessionHost {
    /// Build a host for the identity persisted in `local`, generating one
    /// on first run.
    pub async fn new(
        engine: PresenceEngine,
        local: IdentityStore,
        config: &HostConfig,
        outbound: mpsc::Sender<HostOutbound>,
    ) -> AppResult<Self> {
        let identity = local.load_or_create_identity().await?;
        let profile = local.load_profile().await?;
        info!(%identity, cached_profile = profile.is_some(), "Session host ready");

        Ok(Self {
            engine,
            identity,
            local,
            outbound,
            heartbeat_interval: config.heartbeat_interval(),
            state: Mutex::new(HostState {
                profile,
                ..HostState::default()
            }),
        })
    }

    /// The local identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The cached profile.
    pub async fn profile(&self) -> Option<Profile> {
        self.state.lock().await.profile.clone()
    }

    /// Whether a roster subscription is live.
    pub async fn is_session_active(&self) -> bool {
        self.state.lock().await.subscription.is_some()
    }

    /// Handle one intent.
    pub async fn handle(&self, message: HostInbound) {
        debug!(identity = %self.identity, ?message, "Handling intent");
        match message {
            HostInbound::Ready => self.on_ready().await,
            HostInbound::SaveProfile(draft) => self.on_save_profile(draft).await,
            HostInbound::RequestSessions => self.start_session().await,
            HostInbound::Greet(payload) => self.on_greet(&payload.greeted_uid).await,
            HostInbound::Heartbeat => {
                if let Err(e) = self.engine.touch(&self.identity).await {
                    warn!(identity = %self.identity, error = %e, "Heartbeat failed");
                }
            }
            HostInbound::EditProfile => self.stop_session().await,
        }
    }

    /// Cancel the heartbeat and the roster subscription.
    pub async fn stop(&self) {
        self.stop_session().await;
        info!(identity = %self.identity, "Session host stopped");
    }

    async fn on_ready(&self) {
        let profile = {
            let mut state = self.state.lock().await;
            if state.profile.is_none() {
                match self.engine.load(&self.identity).await {
                    Ok(Some(remote)) => {
                        self.cache_locally(&remote).await;
                        state.profile = Some(remote);
                    }
                    Ok(None) => {}
                    Err(e) => self.post_error(LOAD_PROFILE_FAILED, &e).await,
                }
            }
            state.profile.clone()
        };

        let has_profile = profile.is_some();
        self.post(HostOutbound::Profile(profile)).await;
        if has_profile {
            self.start_session().await;
        }
    }

    async fn on_save_profile(&self, draft: ProfileDraft) {
        let submitted = Profile::initial(draft).normalized();
        if let Err(e) = submitted.check() {
            self.post_error(SAVE_PROFILE_FAILED, &e).await;
            return;
        }

        let profile = {
            let mut state = self.state.lock().await;
            let previous = match state.profile.clone() {
                Some(profile) => Some(profile),
                None => match self.engine.load(&self.identity).await {
                    Ok(stored) => stored,
                    Err(e) => {
                        self.post_error(SAVE_PROFILE_FAILED, &e).await;
                        return;
                    }
                },
            };
            let profile = submitted.with_progression_of(previous.as_ref());

            // Local state only changes once the store accepted the write.
            if let Err(e) = self.engine.save(&self.identity, &profile).await {
                self.post_error(SAVE_PROFILE_FAILED, &e).await;
                return;
            }
            state.profile = Some(profile.clone());
            profile
        };
        self.cache_locally(&profile).await;

        self.post(HostOutbound::ProfileSaved(profile.clone())).await;
        self.post(HostOutbound::Profile(Some(profile))).await;
        self.start_session().await;
    }

    async fn on_greet(&self, greeted: &Identity) {
        let result = match self.engine.greet(&self.identity, greeted).await {
            Ok(Some(result)) => result,
            Ok(None) => return,
            Err(e) => {
                self.post_error(GREETING_FAILED, &e).await;
                return;
            }
        };

        let updated = {
            let mut state = self.state.lock().await;
            state.profile.as_mut().map(|profile| {
                profile.exp = result.exp;
                profile.level = result.level;
                profile.clone()
            })
        };
        if let Some(profile) = updated {
            self.cache_locally(&profile).await;
        }
        self.post(HostOutbound::GreetingRecorded(result)).await;
    }

    /// Touch, subscribe once and (re)start the heartbeat. No-op without
    /// a profile.
    async fn start_session(&self) {
        let mut state = self.state.lock().await;
        if state.profile.is_none() {
            debug!(identity = %self.identity, "No profile yet, session not started");
            return;
        }

        if let Err(e) = self.engine.touch(&self.identity).await {
            self.post_error(START_SESSION_FAILED, &e).await;
            return;
        }

        if state.subscription.is_none() {
            let forwarder = RosterForwarder::new(self.identity.clone(), self.outbound.clone());
            match self
                .engine
                .subscribe(move |roster| forwarder.forward(roster))
                .await
            {
                Ok(subscription) => state.subscription = Some(subscription),
                Err(e) => {
                    self.post_error(START_SESSION_FAILED, &e).await;
                    return;
                }
            }
        }

        state.heartbeat = Some(HeartbeatTask::spawn(
            self.engine.clone(),
            self.identity.clone(),
            self.heartbeat_interval,
        ));
        info!(identity = %self.identity, "Session started");
    }

    async fn stop_session(&self) {
        let (heartbeat, subscription) = {
            let mut state = self.state.lock().await;
            (state.heartbeat.take(), state.subscription.take())
        };
        if let Some(heartbeat) = heartbeat {
            heartbeat.stop().await;
        }
        if let Some(subscription) = subscription {
            subscription.close().await;
            debug!(identity = %self.identity, "Session stopped");
        }
    }

    async fn cache_locally(&self, profile: &Profile) {
        if let Err(e) = self.local.save_profile(profile).await {
            warn!(identity = %self.identity, error = %e, "Failed to cache profile locally");
        }
    }

    async fn post_error(&self, context: &str, err: &AppError) {
        error!(identity = %self.identity, error = %err, "{context}");
        let text = match err.kind {
            ErrorKind::Validation => err.user_message(),
            _ => format!("{context} {}", err.user_message()),
        };
        self.post(HostOutbound::Error(text)).await;
    }

    async fn post(&self, message: HostOutbound) {
        if self.outbound.send(message).await.is_err() {
            debug!(identity = %self.identity, "Outbound channel closed");
        }
    }
}

/// Turns roster emissions into `sessions` and `userJoined` messages.
struct RosterForwarder {
    self_uid: Identity,
    outbound: mpsc::Sender<HostOutbound>,
    seen: StdMutex<Option<HashSet<Identity>>>,
}

impl RosterForwarder {
    fn new(self_uid: Identity, outbound: mpsc::Sender<HostOutbound>) -> Self {
        Self {
            self_uid,
            outbound,
            seen: StdMutex::new(None),
        }
    }

    fn forward(&self, roster: Roster) {
        let joined: Vec<JoinedPayload> = {
            let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
            let joined = match seen.as_ref() {
                Some(previous) => roster
                    .entries
                    .iter()
                    .filter(|e| e.identity != self.self_uid && !previous.contains(&e.identity))
                    .map(|e| JoinedPayload {
                        uid: e.identity.clone(),
                        name: e.profile.name.clone(),
                    })
                    .collect(),
                None => Vec::new(),
            };
            *seen = Some(roster.identities().cloned().collect());
            joined
        };

        let payload = SessionPayload::from_roster(self.self_uid.clone(), &roster);
        self.send(HostOutbound::Sessions(payload));
        for user in joined {
            self.send(HostOutbound::UserJoined(user));
        }
    }

    fn send(&self, message: HostOutbound) {
        match self.outbound.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(identity = %self.self_uid, "Outbound buffer full, dropping message");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

impl std::fmt::Debug for RosterForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterForwarder")
            .field("self_uid", &self.self_uid)
            .finish()
    }
}
