//! # plaza-core
//!
//! Core crate for Code Plaza. Contains the configuration schema, typed
//! identifiers, the clock abstraction, store change events, the
//! [`PresenceStore`](traits::store::PresenceStore) trait, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other Code Plaza crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
