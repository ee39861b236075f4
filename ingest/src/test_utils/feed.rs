//! Scripted in-memory feed service for tests.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::feed::{Feed, FeedClient, TransactionPage};

#[derive(Debug, Default)]
struct Inner {
    pages: Vec<Vec<Value>>,
    feeds: HashMap<String, Feed>,
    fail_next_create: bool,
    fail_next_get: bool,
    fail_next_acknowledge: bool,
    acknowledged: Vec<String>,
}

/// [`FeedClient`] serving a scripted sequence of pages.
///
/// Cursors are stringified page indexes starting at `"0"`. Polling past the last
/// scripted page behaves like a long-poll timeout, and acknowledgments can be failed
/// on demand to exercise the stale-cursor path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeedClient {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryFeedClient {
    pub fn new(pages: Vec<Vec<Value>>) -> MemoryFeedClient {
        MemoryFeedClient {
            inner: Arc::new(Mutex::new(Inner {
                pages,
                ..Inner::default()
            })),
        }
    }

    /// Appends one more page to the script.
    pub async fn push_page(&self, page: Vec<Value>) {
        self.inner.lock().await.pages.push(page);
    }

    /// Pre-registers a feed, as if a previous run had created it.
    pub async fn register_feed(&self, alias: &str, after: &str) {
        let mut inner = self.inner.lock().await;
        inner.feeds.insert(
            alias.to_owned(),
            Feed {
                id: format!("feed-{alias}"),
                alias: alias.to_owned(),
                filter: String::new(),
                after: after.to_owned(),
            },
        );
    }

    /// Makes the next feed creation fail; the following one succeeds.
    pub async fn fail_next_create(&self) {
        self.inner.lock().await.fail_next_create = true;
    }

    /// Makes the next alias lookup fail; the following one succeeds.
    pub async fn fail_next_get(&self) {
        self.inner.lock().await.fail_next_get = true;
    }

    /// Makes the next acknowledgment fail; the following one succeeds.
    pub async fn fail_next_acknowledge(&self) {
        self.inner.lock().await.fail_next_acknowledge = true;
    }

    /// Returns every cursor acknowledged so far, in order.
    pub async fn acknowledged(&self) -> Vec<String> {
        self.inner.lock().await.acknowledged.clone()
    }

    /// Returns the server-side cursor of the feed registered under `alias`.
    pub async fn server_cursor(&self, alias: &str) -> Option<String> {
        let inner = self.inner.lock().await;
        inner.feeds.get(alias).map(|feed| feed.after.clone())
    }
}

impl FeedClient for MemoryFeedClient {
    async fn create_feed(&self, alias: &str, filter: &str) -> IngestResult<Feed> {
        let mut inner = self.inner.lock().await;

        if inner.fail_next_create {
            inner.fail_next_create = false;
            bail!(ErrorKind::FeedRequestFailed, "Injected feed creation failure");
        }

        if inner.feeds.contains_key(alias) {
            bail!(
                ErrorKind::FeedAlreadyExists,
                "Feed alias is already registered",
                alias.to_owned()
            );
        }

        let feed = Feed {
            id: format!("feed-{alias}"),
            alias: alias.to_owned(),
            filter: filter.to_owned(),
            after: "0".to_owned(),
        };
        inner.feeds.insert(alias.to_owned(), feed.clone());

        Ok(feed)
    }

    async fn get_feed_by_alias(&self, alias: &str) -> IngestResult<Feed> {
        let mut inner = self.inner.lock().await;

        if inner.fail_next_get {
            inner.fail_next_get = false;
            bail!(ErrorKind::FeedRequestFailed, "Injected feed lookup failure");
        }

        match inner.feeds.get(alias) {
            Some(feed) => Ok(feed.clone()),
            None => bail!(
                ErrorKind::FeedRequestFailed,
                "No feed registered under alias",
                alias.to_owned()
            ),
        }
    }

    async fn query_transactions(&self, feed: &Feed, _timeout_ms: u64) -> IngestResult<TransactionPage> {
        let inner = self.inner.lock().await;

        let index = feed.after.parse::<usize>().map_err(|_| {
            crate::ingest_error!(
                ErrorKind::InvalidData,
                "Feed cursor is not a page index",
                feed.after.clone()
            )
        })?;

        match inner.pages.get(index) {
            Some(page) => Ok(TransactionPage {
                transactions: page.clone(),
                next_after: (index + 1).to_string(),
            }),
            None => bail!(
                ErrorKind::FeedRequestTimedOut,
                "Long-poll window elapsed without new transactions"
            ),
        }
    }

    async fn update_feed_cursor(&self, feed: &Feed, after: &str) -> IngestResult<Feed> {
        let mut inner = self.inner.lock().await;

        if inner.fail_next_acknowledge {
            inner.fail_next_acknowledge = false;
            bail!(
                ErrorKind::FeedRequestFailed,
                "Injected acknowledgment failure"
            );
        }

        let Some(stored) = inner.feeds.get_mut(&feed.alias) else {
            bail!(
                ErrorKind::FeedRequestFailed,
                "No feed registered under alias",
                feed.alias.clone()
            );
        };

        // Optimistic concurrency: the caller's view of the cursor must still match.
        if stored.after != feed.after {
            bail!(
                ErrorKind::FeedRequestFailed,
                "Acknowledgment rejected, cursor has moved",
                format!("server cursor {}, acknowledged from {}", stored.after, feed.after)
            );
        }

        stored.after = after.to_owned();
        let updated = stored.clone();
        inner.acknowledged.push(after.to_owned());

        Ok(updated)
    }
}
