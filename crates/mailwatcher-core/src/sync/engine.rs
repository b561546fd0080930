//! The sync engine.
//!
//! Each message moves through `Fetched -> CheckedNew -> Written -> Indexed`,
//! or `Fetched -> Skipped` when the index already knows it. The index check
//! always precedes any write, and the index insert always follows the last
//! write. A crash in between leaves an unindexed file that the next run
//! simply writes again under a new counter.

use std::path::Path;

use tracing::{debug, info, warn};

use super::{MessageSource, RemoteMessage};
use crate::config::SyncConfig;
use crate::index::{IndexRecord, MailIndex};
use crate::store::{StorageLayout, reserve_body_file, write_attachments};
use crate::{Error, Result};

/// What happened to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The message was already indexed; nothing was written.
    Skipped,
    /// The message was written and indexed.
    Indexed(IndexRecord),
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Messages returned by the source.
    pub fetched: usize,
    /// Messages skipped because they were already indexed.
    pub skipped: usize,
    /// Messages written and indexed by this run.
    pub indexed: usize,
}

/// Downloads new messages into the store, one at a time.
///
/// Running two engines against the same base directory at once is not
/// supported: both may see a message as new before either indexes it.
/// Body files never collide, but the slower run then fails with
/// [`Error::DuplicateKey`].
pub struct SyncEngine {
    config: SyncConfig,
    index: MailIndex,
}

impl SyncEngine {
    /// Opens (or creates) the index named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be opened.
    pub async fn new(config: SyncConfig) -> Result<Self> {
        let index = MailIndex::open(&config.index_path).await?;
        Ok(Self::with_index(config, index))
    }

    /// Creates an engine over an already open index.
    #[must_use]
    pub const fn with_index(config: SyncConfig, index: MailIndex) -> Self {
        Self { config, index }
    }

    /// Returns the index.
    #[must_use]
    pub const fn index(&self) -> &MailIndex {
        &self.index
    }

    /// Consumes the engine, returning its index.
    #[must_use]
    pub fn into_index(self) -> MailIndex {
        self.index
    }

    /// Fetches one batch from `source` and processes it in order.
    ///
    /// # Errors
    ///
    /// Stops at the first error, leaving messages already indexed in place.
    pub async fn run<S: MessageSource>(&self, source: &mut S) -> Result<SyncReport> {
        let query = &self.config.query;
        let limit = usize::try_from(query.max_results).unwrap_or(usize::MAX);
        let messages = source.fetch(query).await?;

        let mut report = SyncReport::default();
        for message in messages.iter().take(limit) {
            report.fetched += 1;
            match self.process(message).await? {
                Outcome::Skipped => report.skipped += 1,
                Outcome::Indexed(_) => report.indexed += 1,
            }
        }

        info!(
            fetched = report.fetched,
            skipped = report.skipped,
            indexed = report.indexed,
            "Sync finished"
        );
        Ok(report)
    }

    /// Carries one message through to `Skipped` or `Indexed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be queried, a file cannot be
    /// written, or the record cannot be inserted.
    pub async fn process(&self, message: &RemoteMessage) -> Result<Outcome> {
        if self.index.exists(&message.id).await? {
            debug!(message_id = %message.id, "Already indexed, skipping");
            return Ok(Outcome::Skipped);
        }

        let record = self.materialize(message).await?;
        self.index.insert(&record).await?;
        info!(
            message_id = %record.message_id,
            path = %record.filename,
            "Indexed message"
        );
        Ok(Outcome::Indexed(record))
    }

    /// Writes the body and attachments of a message, without indexing it.
    ///
    /// Returns the record that should be committed once the caller is done.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] if no body filename is free, or
    /// [`Error::Filesystem`] if a write fails. Files already written stay
    /// on disk.
    pub async fn materialize(&self, message: &RemoteMessage) -> Result<IndexRecord> {
        let base = self.config.base_dir();
        let layout = StorageLayout::for_message(base, &message.from, &message.date);
        if layout.is_unsorted(base) {
            warn!(
                message_id = %message.id,
                from = %message.from,
                "No address in sender, storing under base directory"
            );
        }

        let mut body = reserve_body_file(&layout.directory, &layout.tag).await?;
        body.write(message.body().unwrap_or_default().as_bytes()).await?;
        let path = body.into_path();
        debug!(message_id = %message.id, path = %path.display(), "Wrote body");

        let attachments = write_attachments(&path, &message.attachments).await?;

        Ok(IndexRecord {
            message_id: message.id.clone(),
            thread_id: message.thread_id.clone(),
            date: layout.date,
            time: layout.time,
            sender: message.from.clone(),
            subject: message.subject.clone(),
            filename: path_string(&path)?,
            attachments,
        })
    }
}

fn path_string(path: &Path) -> Result<String> {
    path.to_str().map(ToString::to_string).ok_or_else(|| {
        Error::filesystem(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, "path is not valid UTF-8"),
        )
    })
}
