use serde_json::Value;

use crate::error::IngestResult;

/// A server-side transaction feed registration.
///
/// The server owns the durable cursor; [`Feed::after`] is the importer's view of it
/// and is only refreshed from acknowledgment responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub id: String,
    pub alias: String,
    pub filter: String,
    pub after: String,
}

/// One page of transactions read from a feed.
#[derive(Debug, Clone, Default)]
pub struct TransactionPage {
    /// Raw transaction payloads, oldest first. May be empty on a long-poll timeout.
    pub transactions: Vec<Value>,
    /// Cursor to acknowledge once every transaction on the page is stored.
    pub next_after: String,
}

/// Client for the upstream feed service.
///
/// Implementations must keep [`update_feed_cursor`](FeedClient::update_feed_cursor)
/// failures side-effect free from the importer's point of view, so a failed
/// acknowledgment can simply be retried with the same cursor.
pub trait FeedClient {
    /// Registers a new feed under `alias`.
    ///
    /// Fails with [`crate::error::ErrorKind::FeedAlreadyExists`] when the alias is
    /// already registered.
    fn create_feed(&self, alias: &str, filter: &str)
    -> impl Future<Output = IngestResult<Feed>> + Send;

    /// Looks up an existing feed by its alias.
    fn get_feed_by_alias(&self, alias: &str) -> impl Future<Output = IngestResult<Feed>> + Send;

    /// Long-polls the next page of transactions after the feed's cursor.
    ///
    /// Fails with [`crate::error::ErrorKind::FeedRequestTimedOut`] when the poll
    /// window elapses without new transactions.
    fn query_transactions(
        &self,
        feed: &Feed,
        timeout_ms: u64,
    ) -> impl Future<Output = IngestResult<TransactionPage>> + Send;

    /// Advances the server-side cursor past a fully imported page and returns the
    /// updated feed.
    fn update_feed_cursor(
        &self,
        feed: &Feed,
        after: &str,
    ) -> impl Future<Output = IngestResult<Feed>> + Send;
}
