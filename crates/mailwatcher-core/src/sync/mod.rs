//! Incremental sync of remote messages into the local store.

mod engine;
mod message;
mod source;

pub use engine::{Outcome, SyncEngine, SyncReport};
pub use message::{Attachment, RemoteMessage};
pub use source::{MemorySource, MessageSource};
