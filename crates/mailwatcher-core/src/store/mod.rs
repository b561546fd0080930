//! On-disk materialization of messages.
//!
//! Layout under the base directory:
//!
//! ```text
//! <base>/<sender>/<YYYYMMDD>/<YYYYMMDD-HHMMSS>.<NNN>      body
//! <base>/<sender>/<YYYYMMDD>/<YYYYMMDD-HHMMSS>.<NNN>.d/   attachments
//! ```
//!
//! `NNN` is a collision counter: body files are created exclusively, so two
//! messages sharing a timestamp never overwrite each other.

mod layout;
mod materializer;

pub use layout::StorageLayout;
pub use materializer::{
    ATTACHMENT_SEPARATOR, BodyFile, MAX_COLLISION_ATTEMPTS, attachment_dir, reserve_body_file,
    write_attachments,
};
