//! # plaza-store
//!
//! Backing store implementations for Code Plaza. Supports two modes:
//!
//! - **memory**: In-process document tables, for hosts without a
//!   configured backend
//! - **redis**: Redis-backed live store shared by every host, with change
//!   notification over Redis pub/sub
//!
//! The store is selected once at startup based on configuration.

pub mod keys;
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use memory::MemoryStore;
pub use provider::StoreManager;
