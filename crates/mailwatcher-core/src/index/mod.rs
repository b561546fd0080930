//! Durable index of downloaded messages.
//!
//! The index is the single source of truth for whether a message has
//! already been downloaded. Records are only ever inserted: a record is
//! written once every file of its message is on disk and is never updated
//! or removed afterwards.

mod model;
mod repository;

pub use model::IndexRecord;
pub use repository::MailIndex;
