//! In-memory store for single-process use.

pub mod store;

pub use store::MemoryStore;
