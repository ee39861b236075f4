//! In-memory destination used by unit tests.
//!
//! Mirrors the Postgres store's observable behavior: events are written atomically,
//! re-delivered events are reported as already imported and change nothing, and
//! spent flags are flipped on previously written outputs. Writes can be failed on
//! demand to exercise retry paths.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use config::shared::CustomColumnsConfig;
use tokio::sync::Mutex;

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::store::base::{EventStore, EventWrite};
use crate::store::batch::EventBatch;
use crate::store::columns::{ColumnValue, Row};
use crate::types::Transaction;

#[derive(Debug, Default)]
struct Inner {
    transactions: HashMap<String, Row>,
    inputs: Vec<Row>,
    outputs: Vec<Row>,
    fail_once_on: HashSet<String>,
}

/// [`EventStore`] holding rows in memory behind a mutex.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryEventStore {
    pub fn new() -> MemoryEventStore {
        MemoryEventStore::default()
    }

    /// Makes the next write of `transaction_id` fail; the following one succeeds.
    pub async fn fail_once_on(&self, transaction_id: &str) {
        let mut inner = self.inner.lock().await;
        inner.fail_once_on.insert(transaction_id.to_owned());
    }

    pub async fn transaction_count(&self) -> usize {
        self.inner.lock().await.transactions.len()
    }

    pub async fn transaction(&self, id: &str) -> Option<Row> {
        self.inner.lock().await.transactions.get(id).cloned()
    }

    pub async fn inputs_of(&self, transaction_id: &str) -> Vec<Row> {
        let inner = self.inner.lock().await;

        inner
            .inputs
            .iter()
            .filter(|row| has_text(row, "transaction_id", transaction_id))
            .cloned()
            .collect()
    }

    pub async fn outputs_of(&self, transaction_id: &str) -> Vec<Row> {
        let inner = self.inner.lock().await;

        inner
            .outputs
            .iter()
            .filter(|row| has_text(row, "transaction_id", transaction_id))
            .cloned()
            .collect()
    }

    /// Returns the spent flag of the output with the given id, if it exists.
    pub async fn output_spent(&self, output_id: &str) -> Option<bool> {
        let inner = self.inner.lock().await;

        inner
            .outputs
            .iter()
            .find(|row| has_text(row, "output_id", output_id))
            .and_then(|row| match row.get("spent") {
                Some(ColumnValue::Bool(Some(spent))) => Some(*spent),
                _ => None,
            })
    }
}

fn has_text(row: &Row, column: &str, expected: &str) -> bool {
    matches!(row.get(column), Some(ColumnValue::Text(Some(value))) if value == expected)
}

impl EventStore for MemoryEventStore {
    async fn write_event(
        &self,
        transaction: &Transaction,
        columns: &CustomColumnsConfig,
    ) -> IngestResult<EventWrite> {
        let batch = EventBatch::build(transaction, columns);

        let mut inner = self.inner.lock().await;

        if inner.fail_once_on.remove(&transaction.id) {
            bail!(
                ErrorKind::EventWriteFailed,
                "Injected event write failure",
                transaction.id.clone()
            );
        }

        if inner.transactions.contains_key(&transaction.id) {
            return Ok(EventWrite::AlreadyImported);
        }

        inner
            .transactions
            .insert(transaction.id.clone(), batch.transaction);
        inner.inputs.extend(batch.inputs);
        inner.outputs.extend(batch.outputs);

        for output_id in &batch.spent_output_ids {
            for row in &mut inner.outputs {
                if has_text(row, "output_id", output_id) {
                    row.set("spent", ColumnValue::Bool(Some(true)));
                }
            }
        }

        Ok(EventWrite::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transaction(id: &str, spends: Option<&str>, output_id: &str) -> Transaction {
        let inputs = match spends {
            Some(spent) => json!([{ "type": "spend", "amount": 5, "spent_output_id": spent }]),
            None => json!([{ "type": "issue", "amount": 5 }]),
        };

        Transaction::from_raw(json!({
            "id": id,
            "block_height": 1,
            "timestamp": "2018-01-01T00:00:00Z",
            "position": 0,
            "inputs": inputs,
            "outputs": [{ "id": output_id, "type": "control", "amount": 5 }]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_writes_change_nothing() {
        let store = MemoryEventStore::new();
        let columns = CustomColumnsConfig::default();
        let event = transaction("tx-1", None, "out-1");

        assert_eq!(
            store.write_event(&event, &columns).await.unwrap(),
            EventWrite::Inserted
        );
        assert_eq!(
            store.write_event(&event, &columns).await.unwrap(),
            EventWrite::AlreadyImported
        );

        assert_eq!(store.transaction_count().await, 1);
        assert_eq!(store.outputs_of("tx-1").await.len(), 1);
    }

    #[tokio::test]
    async fn spending_input_marks_earlier_output() {
        let store = MemoryEventStore::new();
        let columns = CustomColumnsConfig::default();

        store
            .write_event(&transaction("tx-1", None, "out-1"), &columns)
            .await
            .unwrap();
        assert_eq!(store.output_spent("out-1").await, Some(false));

        store
            .write_event(&transaction("tx-2", Some("out-1"), "out-2"), &columns)
            .await
            .unwrap();

        assert_eq!(store.output_spent("out-1").await, Some(true));
        assert_eq!(store.output_spent("out-2").await, Some(false));
    }

    #[tokio::test]
    async fn injected_failure_fails_exactly_once() {
        let store = MemoryEventStore::new();
        let columns = CustomColumnsConfig::default();
        let event = transaction("tx-1", None, "out-1");

        store.fail_once_on("tx-1").await;

        let err = store.write_event(&event, &columns).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EventWriteFailed);
        assert_eq!(store.transaction_count().await, 0);

        assert_eq!(
            store.write_event(&event, &columns).await.unwrap(),
            EventWrite::Inserted
        );
    }
}
