//! Core traits defined in `plaza-core` and implemented by other crates.

pub mod store;

pub use store::PresenceStore;
