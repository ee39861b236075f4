//! Feed connection and cursor lifecycle.

use config::shared::FeedConfig;
use tracing::info;

use crate::error::{ErrorKind, IngestResult};
use crate::feed::client::{Feed, FeedClient, TransactionPage};
use crate::ingest_error;

/// Owns the importer's view of one feed and the rules for advancing its cursor.
///
/// The cursor is only ever replaced from a successful acknowledgment response, so a
/// failed acknowledgment leaves the manager pointing at the last durably confirmed
/// position and the next poll re-reads the unacknowledged page.
#[derive(Debug)]
pub struct FeedCursorManager<C> {
    client: C,
    feed: Feed,
    page_timeout_ms: u64,
}

impl<C: FeedClient> FeedCursorManager<C> {
    /// Creates the feed if needed, or attaches to the existing registration.
    ///
    /// A feed that already exists under the configured alias is the normal restart
    /// path, not an error.
    pub async fn connect(client: C, config: &FeedConfig) -> IngestResult<FeedCursorManager<C>> {
        let feed = match client.create_feed(&config.alias, &config.filter).await {
            Ok(feed) => {
                info!(alias = %config.alias, feed_id = %feed.id, "created transaction feed");
                feed
            }
            Err(err) if err.kind() == ErrorKind::FeedAlreadyExists => {
                info!(alias = %config.alias, "feed already exists, resuming from its cursor");
                client.get_feed_by_alias(&config.alias).await.map_err(|err| {
                    ingest_error!(
                        ErrorKind::FeedSetupFailed,
                        "Failed to look up the existing feed",
                        source: err
                    )
                })?
            }
            Err(err) => {
                return Err(ingest_error!(
                    ErrorKind::FeedSetupFailed,
                    "Failed to create the transaction feed",
                    source: err
                ));
            }
        };

        Ok(FeedCursorManager {
            client,
            feed,
            page_timeout_ms: config.page_timeout_ms,
        })
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    /// Polls the next page after the last acknowledged cursor.
    pub async fn next_page(&self) -> IngestResult<TransactionPage> {
        self.client
            .query_transactions(&self.feed, self.page_timeout_ms)
            .await
    }

    /// Acknowledges a fully imported page, adopting the server's updated feed.
    pub async fn acknowledge(&mut self, next_after: &str) -> IngestResult<()> {
        self.feed = self.client.update_feed_cursor(&self.feed, next_after).await?;

        Ok(())
    }
}
