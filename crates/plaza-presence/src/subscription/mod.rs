//! Roster change subscriptions.

pub mod handle;
pub mod listener;

pub use handle::Subscription;
pub use listener::RosterCallback;
