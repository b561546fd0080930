//! Index data models.

use serde::{Deserialize, Serialize};

/// One row of the `mailidx` table, describing a downloaded message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Identifier assigned by the remote source (primary key).
    pub message_id: String,
    /// Identifier of the conversation the message belongs to.
    pub thread_id: String,
    /// Message date as `YYYYMMDD`.
    pub date: String,
    /// Message time of day as `HHMMSS`.
    pub time: String,
    /// Raw sender header, as received.
    pub sender: String,
    /// Message subject.
    pub subject: String,
    /// Path of the body file.
    pub filename: String,
    /// Attachment filenames joined with `;`, empty if there are none.
    pub attachments: String,
}

impl IndexRecord {
    /// Returns the attachment filenames in their original order.
    pub fn attachment_names(&self) -> impl Iterator<Item = &str> {
        self.attachments
            .split(crate::store::ATTACHMENT_SEPARATOR)
            .filter(|name| !name.is_empty())
    }
}
