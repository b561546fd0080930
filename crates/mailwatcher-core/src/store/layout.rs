//! Storage path derivation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};

use crate::address;

/// Where a message's files go, derived from its sender and date.
///
/// Dates are rendered in the message's own UTC offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    /// Directory holding the body file.
    pub directory: PathBuf,
    /// Body filename stem, `YYYYMMDD-HHMMSS`.
    pub tag: String,
    /// Calendar date, `YYYYMMDD`.
    pub date: String,
    /// Time of day, `HHMMSS`.
    pub time: String,
}

impl StorageLayout {
    /// Computes the layout for a message from `from` sent at `date`.
    ///
    /// A sender without a recognizable address maps to an empty folder
    /// name, placing the date folder directly under `base`.
    #[must_use]
    pub fn for_message(base: &Path, from: &str, date: &DateTime<FixedOffset>) -> Self {
        let day = date.format("%Y%m%d").to_string();
        let time = date.format("%H%M%S").to_string();
        let directory = base.join(address::normalize(from)).join(&day);

        Self {
            directory,
            tag: format!("{day}-{time}"),
            date: day,
            time,
        }
    }

    /// Returns true if the sender did not normalize to an address.
    #[must_use]
    pub fn is_unsorted(&self, base: &Path) -> bool {
        self.directory.parent() == Some(base)
    }
}
