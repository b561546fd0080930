//! Run configuration and message search filters.

use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::sync::RemoteMessage;
use crate::{Error, Result};

/// Upper limit (and default) for the number of messages fetched per run.
pub const MAX_RESULTS_CAP: u32 = 500;

/// Name of the index database created inside the base directory.
pub const INDEX_FILE_NAME: &str = "index.sqlite.db";

/// Label carried by messages delivered to the inbox.
pub const INBOX_LABEL: &str = "INBOX";

/// Configuration for one sync run.
///
/// Built once at startup and handed to the engine; nothing else holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Root of the per-sender directory tree.
    pub base_dir: PathBuf,
    /// Location of the index database.
    pub index_path: PathBuf,
    /// Which messages to ask the source for.
    pub query: SearchQuery,
}

impl SyncConfig {
    /// Creates a configuration with the index stored inside `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, query: SearchQuery) -> Self {
        let base_dir = base_dir.into();
        let index_path = base_dir.join(INDEX_FILE_NAME);
        Self {
            base_dir,
            index_path,
            query,
        }
    }

    /// Overrides the index location.
    #[must_use]
    pub fn with_index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = path.into();
        self
    }

    /// Returns the base directory.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// A date filter bound, either a fixed calendar date or an offset from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateBound {
    /// A fixed calendar date.
    Absolute(NaiveDate),
    /// This many days before today.
    RelativeDays(u32),
}

impl DateBound {
    /// Resolves the bound to a calendar date relative to `today`.
    #[must_use]
    pub fn resolve(self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Absolute(date) => date,
            Self::RelativeDays(days) => today
                .checked_sub_days(Days::new(u64::from(days)))
                .unwrap_or(NaiveDate::MIN),
        }
    }
}

/// Filters describing which messages a [`MessageSource`](crate::MessageSource)
/// should return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Only return messages carrying the inbox label.
    pub inbox_only: bool,
    /// Only return messages dated on or after this bound.
    pub newer_than: Option<DateBound>,
    /// Only return messages dated strictly before this bound.
    pub older_than: Option<DateBound>,
    /// Maximum number of messages to return.
    pub max_results: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            inbox_only: true,
            newer_than: None,
            older_than: None,
            max_results: MAX_RESULTS_CAP,
        }
    }
}

impl SearchQuery {
    /// Sets the lower date bound.
    #[must_use]
    pub const fn newer_than(mut self, bound: DateBound) -> Self {
        self.newer_than = Some(bound);
        self
    }

    /// Sets the upper date bound.
    #[must_use]
    pub const fn older_than(mut self, bound: DateBound) -> Self {
        self.older_than = Some(bound);
        self
    }

    /// Sets the result limit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `max_results` is zero or above
    /// [`MAX_RESULTS_CAP`].
    pub fn with_max_results(mut self, max_results: u32) -> Result<Self> {
        if max_results == 0 || max_results > MAX_RESULTS_CAP {
            return Err(Error::Config(format!(
                "max results must be between 1 and {MAX_RESULTS_CAP}, got {max_results}"
            )));
        }
        self.max_results = max_results;
        Ok(self)
    }

    /// Returns true if `message` passes every filter of this query.
    ///
    /// Sources that cannot filter remotely apply this locally.
    #[must_use]
    pub fn matches(&self, message: &RemoteMessage, today: NaiveDate) -> bool {
        if self.inbox_only && !message.labels.iter().any(|l| l == INBOX_LABEL) {
            return false;
        }

        let date = message.date.date_naive();
        if let Some(bound) = self.newer_than
            && date < bound.resolve(today)
        {
            return false;
        }
        if let Some(bound) = self.older_than
            && date >= bound.resolve(today)
        {
            return false;
        }
        true
    }
}

/// Parses a `YYYYMMDD` calendar date.
///
/// # Errors
///
/// Returns [`Error::Config`] if `value` is not a valid date in that form.
pub fn parse_compact_date(value: &str) -> Result<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Config(format!("expected YYYYMMDD, got {value:?}")));
    }
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .map_err(|e| Error::Config(format!("invalid date {value:?}: {e}")))
}
