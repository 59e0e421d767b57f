//! # plaza-entity
//!
//! Domain entity models for Code Plaza. Every struct in this crate is
//! either a stored document (profile, session) or a derived value object
//! (roster entry, greeting result). Stored records come in two shapes:
//! the domain model used by the engine and the document shape written
//! to the backing store.

pub mod greeting;
pub mod presence;
pub mod profile;
pub mod session;

pub use greeting::GreetingResult;
pub use presence::{LivenessState, Roster, RosterEntry};
pub use profile::{AvatarOption, Profile, ProfileDraft};
pub use session::Session;
