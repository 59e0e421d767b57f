//! Messages exchanged with the presentation layer.
//!
//! Both directions are JSON objects tagged by `type` with the body under
//! `payload`, e.g. `{"type":"greet","payload":{"greetedUid":"abc"}}`.

use serde::{Deserialize, Serialize};

use plaza_core::types::Identity;
use plaza_entity::presence::{LivenessState, Roster};
use plaza_entity::profile::{Profile, ProfileDraft};
use plaza_entity::GreetingResult;

/// Intents sent by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum HostInbound {
    /// The UI finished loading.
    Ready,
    /// Create or update the local profile.
    SaveProfile(ProfileDraft),
    /// Start (or keep) the session and roster stream.
    RequestSessions,
    /// Greet another identity.
    Greet(GreetPayload),
    /// Explicit heartbeat.
    Heartbeat,
    /// The user went back to editing the profile.
    EditProfile,
}

/// Body of [`HostInbound::Greet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreetPayload {
    /// Identity being greeted.
    pub greeted_uid: Identity,
}

/// Messages sent to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum HostOutbound {
    /// Current local profile, `null` before the first save.
    Profile(Option<Profile>),
    /// A profile submission was persisted.
    ProfileSaved(Profile),
    /// Roster emission.
    Sessions(SessionPayload),
    /// A greeting awarded experience.
    GreetingRecorded(GreetingResult),
    /// Someone new appeared in the roster.
    UserJoined(JoinedPayload),
    /// User-facing error text.
    Error(String),
}

/// Body of [`HostOutbound::Sessions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    /// The local identity, so the UI can highlight itself.
    pub self_uid: Identity,
    /// Visible sessions.
    pub sessions: Vec<SessionView>,
}

/// One roster entry flattened for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub uid: Identity,
    pub name: String,
    pub avatar_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub level: u32,
    pub exp: u64,
    pub state: LivenessState,
}

/// Body of [`HostOutbound::UserJoined`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedPayload {
    pub uid: Identity,
    pub name: String,
}

impl SessionPayload {
    /// Flatten a roster for display.
    pub fn from_roster(self_uid: Identity, roster: &Roster) -> Self {
        let sessions = roster
            .entries
            .iter()
            .map(|entry| SessionView {
                uid: entry.identity.clone(),
                name: entry.profile.name.clone(),
                avatar_code: entry.profile.avatar_code.clone(),
                message: entry.profile.message.clone(),
                level: entry.profile.level,
                exp: entry.profile.exp,
                state: entry.state,
            })
            .collect();
        Self { self_uid, sessions }
    }
}
