//! Remote message model.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A message as delivered by a [`MessageSource`](super::MessageSource).
///
/// Owned by the engine while one message is processed and dropped
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMessage {
    /// Stable identifier assigned by the remote service.
    pub id: String,
    /// Identifier of the conversation this message belongs to.
    pub thread_id: String,
    /// When the message was sent, in the sender's offset.
    pub date: DateTime<FixedOffset>,
    /// Raw `From` header.
    pub from: String,
    /// Message subject.
    #[serde(default)]
    pub subject: String,
    /// Labels or folders the message is filed under.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Plain text body.
    #[serde(default)]
    pub body_text: Option<String>,
    /// HTML body.
    #[serde(default)]
    pub body_html: Option<String>,
    /// Attachments, in message order.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl RemoteMessage {
    /// Returns the body to store: plain text if present, otherwise HTML.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body_text.as_deref().or(self.body_html.as_deref())
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Filename as given by the sender.
    pub filename: String,
    /// Raw decoded content.
    pub data: Vec<u8>,
}
