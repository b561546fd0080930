//! Command line arguments.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use mailwatcher_core::{DateBound, MAX_RESULTS_CAP, SearchQuery, SyncConfig, parse_compact_date};

/// Download new inbox messages into `<basedir>/<sender>/<date>/`.
///
/// Use either --start-date/--end-date or --newer-than/--older-than.
#[derive(Debug, Parser)]
#[command(name = "mailwatcher", version)]
pub struct Cli {
    /// Directory to download messages into; created if missing.
    #[arg(long, value_name = "DIR")]
    pub basedir: PathBuf,

    /// Only fetch messages from this date on.
    #[arg(
        long,
        value_name = "YYYYMMDD",
        value_parser = parse_date,
        conflicts_with_all = ["newer_than", "older_than"]
    )]
    pub start_date: Option<NaiveDate>,

    /// Only fetch messages before this date.
    #[arg(
        long,
        value_name = "YYYYMMDD",
        value_parser = parse_date,
        conflicts_with_all = ["newer_than", "older_than"]
    )]
    pub end_date: Option<NaiveDate>,

    /// Only fetch messages newer than N days.
    #[arg(long, value_name = "N")]
    pub newer_than: Option<u32>,

    /// Only fetch messages older than N days.
    #[arg(long, value_name = "N")]
    pub older_than: Option<u32>,

    /// Maximum number of messages to fetch in this run.
    #[arg(
        long,
        value_name = "COUNT",
        default_value_t = MAX_RESULTS_CAP,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_RESULTS_CAP))
    )]
    pub max_results: u32,

    /// Mailbox export (JSON) to read messages from.
    #[arg(long, value_name = "FILE")]
    pub source: PathBuf,

    /// Index database location [default: <basedir>/index.sqlite.db].
    #[arg(long, value_name = "FILE")]
    pub index: Option<PathBuf>,
}

impl Cli {
    /// Builds the search query described by the date and count flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the result limit is out of range.
    pub fn query(&self) -> mailwatcher_core::Result<SearchQuery> {
        let mut query = SearchQuery::default().with_max_results(self.max_results)?;

        if let Some(days) = self.newer_than {
            query = query.newer_than(DateBound::RelativeDays(days));
        }
        if let Some(days) = self.older_than {
            query = query.older_than(DateBound::RelativeDays(days));
        }
        if let Some(date) = self.start_date {
            query = query.newer_than(DateBound::Absolute(date));
        }
        if let Some(date) = self.end_date {
            query = query.older_than(DateBound::Absolute(date));
        }

        Ok(query)
    }

    /// Builds the run configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the query flags are invalid.
    pub fn config(&self) -> mailwatcher_core::Result<SyncConfig> {
        let config = SyncConfig::new(&self.basedir, self.query()?);
        Ok(match &self.index {
            Some(path) => config.with_index_path(path),
            None => config,
        })
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    parse_compact_date(value).map_err(|e| e.to_string())
}
