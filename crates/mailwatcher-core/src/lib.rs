//! # mailwatcher-core
//!
//! Incremental mail download engine for `mailwatcher`.
//!
//! This crate provides:
//! - Sender address normalization for per-sender folders
//! - A durable `SQLite` index of every message already downloaded
//! - Collision-safe materialization of message bodies and attachments
//! - The sync engine tying them together, one message at a time
//!
//! Every message is checked against the index before anything is written,
//! and its index record is committed only after all of its files are on
//! disk. Re-running a sync is therefore always safe: known messages are
//! skipped, and an interrupted run leaves at most an orphaned file behind.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod address;
pub mod config;
mod error;
pub mod index;
pub mod store;
pub mod sync;

pub use address::normalize;
pub use config::{
    DateBound, INBOX_LABEL, INDEX_FILE_NAME, MAX_RESULTS_CAP, SearchQuery, SyncConfig,
    parse_compact_date,
};
pub use error::{Error, Result};
pub use index::{IndexRecord, MailIndex};
pub use store::{
    ATTACHMENT_SEPARATOR, BodyFile, MAX_COLLISION_ATTEMPTS, StorageLayout, attachment_dir,
    reserve_body_file, write_attachments,
};
pub use sync::{
    Attachment, MemorySource, MessageSource, Outcome, RemoteMessage, SyncEngine, SyncReport,
};
