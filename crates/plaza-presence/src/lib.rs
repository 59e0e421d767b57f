//! # plaza-presence
//!
//! The presence and leveling engine for Code Plaza. Provides:
//!
//! - Three-state liveness classification from heartbeat age
//! - Per-day greeted-set rollover
//! - The greeting transaction (dedup, experience award, level recompute)
//! - Roster composition and change subscriptions
//!
//! All rules live in [`rules`] as pure functions; [`PresenceEngine`]
//! applies them against a [`plaza_store::StoreManager`].

pub mod engine;
pub mod lock;
pub mod rules;
pub mod subscription;

pub use engine::PresenceEngine;
pub use rules::leveling::{GREETING_EXP, LevelingRules, level_for_exp};
pub use rules::liveness::{LivenessPolicy, classify};
pub use subscription::Subscription;
