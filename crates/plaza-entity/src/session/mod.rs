//! Session domain entities.

pub mod document;
pub mod model;

pub use document::SessionDocument;
pub use model::Session;
