//! `SQLite`-backed message index.

use std::path::Path;

use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::{debug, info};

use super::model::IndexRecord;
use crate::{Error, Result};

/// Repository for the `mailidx` table.
///
/// A run is strictly sequential, so the pool holds a single connection.
pub struct MailIndex {
    pool: SqlitePool,
}

impl MailIndex {
    /// Opens the index stored at `path`.
    ///
    /// A missing database is created together with its schema (and any
    /// missing parent directories). An existing database is opened as-is;
    /// its schema is not checked or migrated.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created, the
    /// database cannot be opened, or schema creation fails.
    pub async fn open(path: &Path) -> Result<Self> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|e| Error::filesystem(path, e))?;

        if !exists && let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::filesystem(parent, e))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(!exists);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let index = Self { pool };
        if exists {
            debug!(path = %path.display(), "Opened existing index");
        } else {
            index.initialize().await?;
            info!(path = %path.display(), "Created new index");
        }
        Ok(index)
    }

    /// Create an in-memory index for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let index = Self { pool };
        index.initialize().await?;
        Ok(index)
    }

    /// Creates the `mailidx` table and its thread lookup index.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE mailidx(
                messageid   CHAR(20) PRIMARY KEY NOT NULL,
                threadid    CHAR(20)             NOT NULL,
                date        CHAR(9)              NOT NULL,
                time        CHAR(10)             NOT NULL,
                sender      TEXT                 NOT NULL,
                subject     TEXT                 NOT NULL,
                filename    TEXT                 NOT NULL,
                attachments TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(r"CREATE INDEX threadidx ON mailidx(threadid)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Returns true if a record for `message_id` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails. A missing record is
    /// not an error.
    pub async fn exists(&self, message_id: &str) -> Result<bool> {
        let row = sqlx::query(r"SELECT messageid FROM mailidx WHERE messageid = ?")
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if the message is already indexed, or
    /// [`Error::Storage`] if the database query fails.
    pub async fn insert(&self, record: &IndexRecord) -> Result<()> {
        sqlx::query(r"INSERT INTO mailidx VALUES (?, ?, ?, ?, ?, ?, ?, ?)")
            .bind(&record.message_id)
            .bind(&record.thread_id)
            .bind(&record.date)
            .bind(&record.time)
            .bind(&record.sender)
            .bind(&record.subject)
            .bind(&record.filename)
            .bind(&record.attachments)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => Error::DuplicateKey {
                    message_id: record.message_id.clone(),
                },
                other => Error::Storage(other),
            })?;

        Ok(())
    }

    /// Get the record for a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, message_id: &str) -> Result<Option<IndexRecord>> {
        let row = sqlx::query(
            r"
            SELECT messageid, threadid, date, time, sender, subject, filename, attachments
            FROM mailidx
            WHERE messageid = ?
            ",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(record_from_row))
    }

    /// Get every record of a thread, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn thread(&self, thread_id: &str) -> Result<Vec<IndexRecord>> {
        let rows = sqlx::query(
            r"
            SELECT messageid, threadid, date, time, sender, subject, filename, attachments
            FROM mailidx
            WHERE threadid = ?
            ORDER BY date ASC, time ASC
            ",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    /// Count indexed messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<u64> {
        let row = sqlx::query(r"SELECT COUNT(*) as count FROM mailidx")
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.get("count");
        Ok(count.unsigned_abs())
    }

    /// Closes the underlying connection, waiting for it to be released.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn record_from_row(row: &SqliteRow) -> IndexRecord {
    IndexRecord {
        message_id: row.get("messageid"),
        thread_id: row.get("threadid"),
        date: row.get("date"),
        time: row.get("time"),
        sender: row.get("sender"),
        subject: row.get("subject"),
        filename: row.get("filename"),
        attachments: row
            .get::<Option<String>, _>("attachments")
            .unwrap_or_default(),
    }
}
