//! Profile domain entities.

pub mod avatar;
pub mod document;
pub mod model;

pub use avatar::AvatarOption;
pub use document::ProfileDocument;
pub use model::{Profile, ProfileDraft};
