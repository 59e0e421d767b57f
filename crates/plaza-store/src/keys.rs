//! Key builders for every Redis key the live store touches.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses.

use plaza_core::types::{Collection, Identity};

/// Key of one document.
pub fn document(prefix: &str, collection: Collection, identity: &Identity) -> String {
    format!("{prefix}{collection}:{identity}")
}

/// Sorted set recording first-insertion order of a collection.
pub fn index(prefix: &str, collection: Collection) -> String {
    format!("{prefix}{collection}:index")
}

/// Pub/sub channel carrying change events.
pub fn changes_channel(prefix: &str) -> String {
    format!("{prefix}changes")
}
