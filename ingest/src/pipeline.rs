//! The import loop.
//!
//! Repeatedly pulls one page of transactions from the feed, writes every
//! transaction to the store, and acknowledges the page's cursor only after all of
//! its writes have committed. Any per-page failure skips the acknowledgment, so the
//! next iteration re-reads the same page and duplicate suppression in the store
//! absorbs the partial overlap.

use std::time::Duration;

use config::shared::{CustomColumnsConfig, FeedConfig};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::concurrency::shutdown::ShutdownRx;
use crate::error::{ErrorKind, IngestResult};
use crate::feed::{FeedClient, FeedCursorManager};
use crate::store::{EventStore, EventWrite};
use crate::types::Transaction;

/// Pause before retrying after a failed iteration, so a persistently unavailable
/// dependency does not produce a hot loop.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Drives one feed into one event store.
#[derive(Debug)]
pub struct ImportPipeline<C, S> {
    cursor: FeedCursorManager<C>,
    store: S,
    columns: CustomColumnsConfig,
}

impl<C: FeedClient, S: EventStore> ImportPipeline<C, S> {
    /// Attaches to the configured feed and returns a pipeline ready to run.
    pub async fn connect(
        client: C,
        store: S,
        feed_config: &FeedConfig,
        columns: CustomColumnsConfig,
    ) -> IngestResult<ImportPipeline<C, S>> {
        let cursor = FeedCursorManager::connect(client, feed_config).await?;

        Ok(ImportPipeline {
            cursor,
            store,
            columns,
        })
    }

    /// Runs the import loop until the shutdown signal fires.
    ///
    /// Long-poll timeouts are the idle heartbeat of the loop and are not logged
    /// above debug level. Every other error is logged and retried; none of them
    /// stop the loop.
    pub async fn run(mut self, mut shutdown_rx: ShutdownRx) -> IngestResult<()> {
        info!(
            feed_id = %self.cursor.feed().id,
            after = %self.cursor.feed().after,
            "starting import loop"
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    info!("shutdown signal received, stopping import loop");
                    return Ok(());
                }

                result = self.process_next_page() => {
                    match result {
                        Ok(_) => {}
                        Err(err) if err.kind() == ErrorKind::FeedRequestTimedOut => {
                            debug!("no new transactions within the poll window");
                        }
                        Err(err) => {
                            warn!(error = %err, "page import failed, will retry");
                            tokio::time::sleep(RETRY_DELAY).await;
                        }
                    }
                }
            }
        }
    }

    /// Imports one page end to end: poll, write every transaction, acknowledge.
    ///
    /// Returns the number of newly inserted transactions. Any error leaves the
    /// cursor unacknowledged.
    pub async fn process_next_page(&mut self) -> IngestResult<usize> {
        let page = self.cursor.next_page().await?;

        let span = info_span!(
            "import_page",
            feed_id = %self.cursor.feed().id,
            after = %self.cursor.feed().after,
        );

        async {
            let mut inserted = 0;

            for raw in &page.transactions {
                let transaction = Transaction::from_raw(raw.clone())?;

                match self.store.write_event(&transaction, &self.columns).await? {
                    EventWrite::Inserted => inserted += 1,
                    EventWrite::AlreadyImported => {
                        debug!(transaction_id = %transaction.id, "skipping re-delivered event");
                    }
                }
            }

            self.cursor.acknowledge(&page.next_after).await?;

            info!(
                transactions = page.transactions.len(),
                inserted, "imported page"
            );

            Ok(inserted)
        }
        .instrument(span)
        .await
    }

    pub fn feed(&self) -> &crate::feed::Feed {
        self.cursor.feed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::shutdown::create_shutdown_channel;
    use crate::store::columns::ColumnValue;
    use crate::store::memory::MemoryEventStore;
    use crate::test_utils::{transaction_payload, MemoryFeedClient};
    use config::shared::{ColumnType, CustomColumnConfig};

    fn feed_config() -> FeedConfig {
        FeedConfig {
            url: "http://localhost:1999".to_owned(),
            token: None,
            alias: "analytics".to_owned(),
            filter: String::new(),
            page_timeout_ms: 100,
        }
    }

    async fn pipeline(
        client: MemoryFeedClient,
        store: MemoryEventStore,
        columns: CustomColumnsConfig,
    ) -> ImportPipeline<MemoryFeedClient, MemoryEventStore> {
        ImportPipeline::connect(client, store, &feed_config(), columns)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn imports_pages_and_advances_the_cursor() {
        let client = MemoryFeedClient::new(vec![
            vec![
                transaction_payload("tx-1", 1, 0, &[], &[("out-1", 100)]),
                transaction_payload("tx-2", 1, 1, &[], &[("out-2", 200)]),
            ],
            vec![transaction_payload("tx-3", 2, 0, &[], &[("out-3", 300)])],
        ]);
        let store = MemoryEventStore::new();
        let mut pipeline =
            pipeline(client.clone(), store.clone(), CustomColumnsConfig::default()).await;

        assert_eq!(pipeline.process_next_page().await.unwrap(), 2);
        assert_eq!(pipeline.process_next_page().await.unwrap(), 1);

        assert_eq!(store.transaction_count().await, 3);
        assert_eq!(client.acknowledged().await, vec!["1".to_owned(), "2".to_owned()]);

        // No more scripted pages, so the poll behaves like a long-poll timeout.
        let err = pipeline.process_next_page().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FeedRequestTimedOut);
    }

    #[tokio::test]
    async fn failed_write_skips_acknowledgment_and_the_retry_succeeds() {
        let client = MemoryFeedClient::new(vec![vec![
            transaction_payload("tx-1", 1, 0, &[], &[("out-1", 100)]),
            transaction_payload("tx-2", 1, 1, &[], &[("out-2", 200)]),
        ]]);
        let store = MemoryEventStore::new();
        let mut pipeline =
            pipeline(client.clone(), store.clone(), CustomColumnsConfig::default()).await;

        store.fail_once_on("tx-2").await;

        let err = pipeline.process_next_page().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EventWriteFailed);
        assert!(client.acknowledged().await.is_empty());
        assert_eq!(store.transaction_count().await, 1);

        // Retry re-reads the page; tx-1 is suppressed as a duplicate, tx-2 lands.
        assert_eq!(pipeline.process_next_page().await.unwrap(), 1);
        assert_eq!(store.transaction_count().await, 2);
        assert_eq!(client.acknowledged().await, vec!["1".to_owned()]);
    }

    #[tokio::test]
    async fn failed_acknowledgment_replays_the_page_without_duplicating_rows() {
        let client = MemoryFeedClient::new(vec![vec![transaction_payload(
            "tx-1",
            1,
            0,
            &[],
            &[("out-1", 100)],
        )]]);
        let store = MemoryEventStore::new();
        let mut pipeline =
            pipeline(client.clone(), store.clone(), CustomColumnsConfig::default()).await;

        client.fail_next_acknowledge().await;
        let err = pipeline.process_next_page().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FeedRequestFailed);
        assert_eq!(store.transaction_count().await, 1);

        // Replay inserts nothing new and finally moves the cursor.
        assert_eq!(pipeline.process_next_page().await.unwrap(), 0);
        assert_eq!(store.transaction_count().await, 1);
        assert_eq!(store.outputs_of("tx-1").await.len(), 1);
        assert_eq!(client.acknowledged().await, vec!["1".to_owned()]);
    }

    #[tokio::test]
    async fn spent_flags_propagate_across_pages_and_restarts() {
        let client = MemoryFeedClient::new(vec![
            vec![transaction_payload("tx-1", 1, 0, &[], &[("out-1", 100)])],
            vec![transaction_payload("tx-2", 2, 0, &["out-1"], &[("out-2", 100)])],
        ]);
        let store = MemoryEventStore::new();

        let mut first =
            pipeline(client.clone(), store.clone(), CustomColumnsConfig::default()).await;
        first.process_next_page().await.unwrap();
        assert_eq!(store.output_spent("out-1").await, Some(false));
        drop(first);

        // A fresh pipeline resumes from the server-side cursor.
        let mut second =
            pipeline(client.clone(), store.clone(), CustomColumnsConfig::default()).await;
        assert_eq!(second.feed().after, "1");
        second.process_next_page().await.unwrap();

        assert_eq!(store.output_spent("out-1").await, Some(true));
        assert_eq!(store.output_spent("out-2").await, Some(false));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn run_imports_until_the_shutdown_signal_fires() {
        let client = MemoryFeedClient::new(vec![vec![transaction_payload(
            "tx-1",
            1,
            0,
            &[],
            &[("out-1", 100)],
        )]]);
        let store = MemoryEventStore::new();
        let pipeline =
            pipeline(client.clone(), store.clone(), CustomColumnsConfig::default()).await;

        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let handle = tokio::spawn(pipeline.run(shutdown_rx));

        // The loop keeps polling (and long-poll timing out) until we stop it.
        while client.acknowledged().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(store.transaction_count().await, 1);
        assert_eq!(client.acknowledged().await, vec!["1".to_owned()]);
    }

    #[tokio::test]
    async fn custom_columns_land_in_stored_rows() {
        let client = MemoryFeedClient::new(vec![vec![transaction_payload(
            "tx-1",
            1,
            0,
            &[],
            &[("out-1", 500000)],
        )]]);
        let store = MemoryEventStore::new();
        let columns = CustomColumnsConfig {
            transaction: vec![CustomColumnConfig {
                name: "first_output_amount".to_owned(),
                path: "outputs.0.amount".to_owned(),
                column_type: ColumnType::Integer,
            }],
            input: vec![],
            output: vec![CustomColumnConfig {
                name: "origin".to_owned(),
                path: "reference_data.missing".to_owned(),
                column_type: ColumnType::String,
            }],
        };
        let mut pipeline = pipeline(client, store.clone(), columns).await;

        pipeline.process_next_page().await.unwrap();

        let transaction = store.transaction("tx-1").await.unwrap();
        assert_eq!(
            transaction.get("first_output_amount"),
            Some(&ColumnValue::BigInt(Some(500000)))
        );

        // Unresolvable paths store a typed null instead of failing the event.
        let outputs = store.outputs_of("tx-1").await;
        assert_eq!(outputs[0].get("origin"), Some(&ColumnValue::Text(None)));
    }
}
