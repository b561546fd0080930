//! Message source backed by a JSON mailbox export.
//!
//! The export is a JSON array of messages in delivery order:
//!
//! ```json
//! [
//!   {
//!     "id": "18c2f6a1b2c3d4e5",
//!     "thread_id": "18c2f6a1b2c3d4e5",
//!     "date": "2024-03-01T08:15:00+01:00",
//!     "from": "Jane Doe <jane@example.com>",
//!     "subject": "Minutes",
//!     "labels": ["INBOX"],
//!     "body_text": "See attached.",
//!     "attachments": [{ "filename": "minutes.pdf", "data": "JVBERi0xLjQK" }]
//!   }
//! ]
//! ```
//!
//! Attachment contents are standard base64.

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, FixedOffset, NaiveDate};
use mailwatcher_core::{
    Attachment, Error, MemorySource, MessageSource, RemoteMessage, Result, SearchQuery,
};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ExportedMessage {
    id: String,
    thread_id: String,
    date: DateTime<FixedOffset>,
    from: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    body_text: Option<String>,
    #[serde(default)]
    body_html: Option<String>,
    #[serde(default)]
    attachments: Vec<ExportedAttachment>,
}

#[derive(Debug, Deserialize)]
struct ExportedAttachment {
    filename: String,
    data: String,
}

impl ExportedMessage {
    fn decode(self) -> Result<RemoteMessage> {
        let attachments = self
            .attachments
            .into_iter()
            .map(|a| {
                let data = STANDARD.decode(a.data.as_bytes()).map_err(|e| {
                    Error::Source(format!(
                        "message {}: attachment {:?} is not valid base64: {e}",
                        self.id, a.filename
                    ))
                })?;
                Ok(Attachment {
                    filename: a.filename,
                    data,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RemoteMessage {
            id: self.id,
            thread_id: self.thread_id,
            date: self.date,
            from: self.from,
            subject: self.subject,
            labels: self.labels,
            body_text: self.body_text,
            body_html: self.body_html,
            attachments,
        })
    }
}

/// Reads messages from an export file each time it is queried.
#[derive(Debug, Clone)]
pub struct ExportSource {
    path: PathBuf,
    today: NaiveDate,
}

impl ExportSource {
    /// Creates a source reading `path`, with relative date filters counted
    /// back from `today`.
    pub fn new(path: impl Into<PathBuf>, today: NaiveDate) -> Self {
        Self {
            path: path.into(),
            today,
        }
    }
}

impl MessageSource for ExportSource {
    async fn fetch(&mut self, query: &SearchQuery) -> Result<Vec<RemoteMessage>> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|source| Error::Filesystem {
                path: self.path.clone(),
                source,
            })?;

        let exported: Vec<ExportedMessage> = serde_json::from_slice(&raw)?;
        debug!(
            path = %self.path.display(),
            messages = exported.len(),
            "Loaded mailbox export"
        );

        let messages = exported
            .into_iter()
            .map(ExportedMessage::decode)
            .collect::<Result<Vec<_>>>()?;

        MemorySource::new(messages, self.today).fetch(query).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const EXPORT: &str = r#"[
        {
            "id": "m1",
            "thread_id": "t1",
            "date": "2024-03-01T08:15:00+01:00",
            "from": "Jane Doe <jane@example.com>",
            "subject": "Minutes",
            "labels": ["INBOX"],
            "body_text": "See attached.",
            "attachments": [{ "filename": "minutes.txt", "data": "aGVsbG8=" }]
        },
        {
            "id": "m2",
            "thread_id": "t2",
            "date": "2024-03-02T09:00:00Z",
            "from": "me@example.com",
            "labels": ["SENT"]
        }
    ]"#;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[tokio::test]
    async fn test_reads_inbox_messages() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("export.json");
        std::fs::write(&path, EXPORT).unwrap();

        let mut source = ExportSource::new(&path, today());
        let messages = source.fetch(&SearchQuery::default()).await.unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "m1");
        assert_eq!(messages[0].body(), Some("See attached."));
        assert_eq!(messages[0].attachments[0].data, b"hello");
    }

    #[tokio::test]
    async fn test_invalid_base64_is_a_source_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("export.json");
        std::fs::write(
            &path,
            r#"[{"id":"m1","thread_id":"t1","date":"2024-03-01T08:15:00Z","from":"a@b.com",
                "labels":["INBOX"],"attachments":[{"filename":"x","data":"***"}]}]"#,
        )
        .unwrap();

        let err = ExportSource::new(&path, today())
            .fetch(&SearchQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Source(_)));
    }

    #[tokio::test]
    async fn test_missing_export_is_a_filesystem_error() {
        let tmp = TempDir::new().unwrap();
        let err = ExportSource::new(tmp.path().join("absent.json"), today())
            .fetch(&SearchQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
    }
}
