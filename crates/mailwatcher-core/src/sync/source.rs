//! Message source capability.

use std::future::Future;

use chrono::NaiveDate;

use super::RemoteMessage;
use crate::Result;
use crate::config::SearchQuery;

/// Something that can list messages matching a [`SearchQuery`].
///
/// Implementations return a finite batch, in the order the messages should
/// be processed, holding at most `query.max_results` entries.
pub trait MessageSource {
    /// Fetches the messages matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Source`](crate::Error::Source) or another error if
    /// the messages cannot be retrieved.
    fn fetch(
        &mut self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<RemoteMessage>>> + Send;
}

/// A source serving a fixed list of messages, filtered locally.
#[derive(Debug, Clone)]
pub struct MemorySource {
    messages: Vec<RemoteMessage>,
    today: NaiveDate,
}

impl MemorySource {
    /// Creates a source over `messages`, resolving relative dates against
    /// `today`.
    #[must_use]
    pub const fn new(messages: Vec<RemoteMessage>, today: NaiveDate) -> Self {
        Self { messages, today }
    }
}

impl MessageSource for MemorySource {
    async fn fetch(&mut self, query: &SearchQuery) -> Result<Vec<RemoteMessage>> {
        let limit = usize::try_from(query.max_results).unwrap_or(usize::MAX);
        Ok(self
            .messages
            .iter()
            .filter(|m| query.matches(m, self.today))
            .take(limit)
            .cloned()
            .collect())
    }
}
