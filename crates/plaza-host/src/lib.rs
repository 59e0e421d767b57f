//! # plaza-host
//!
//! Acts on behalf of one local identity: persists that identity and its
//! last known profile, translates presentation-layer intents into engine
//! calls, keeps the heartbeat running while a profile is active and
//! forwards roster emissions back out.

pub mod heartbeat;
pub mod host;
pub mod identity;
pub mod message;

pub use heartbeat::HeartbeatTask;
pub use host::SessionHost;
pub use identity::IdentityStore;
pub use message::{HostInbound, HostOutbound};
