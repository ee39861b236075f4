//! Postgres destination for imported events.

use config::shared::{CustomColumnsConfig, PgConnectionConfig};
use postgres::ledger::{
    connect_to_database, TRANSACTIONS_TABLE, TRANSACTION_INPUTS_TABLE, TRANSACTION_OUTPUTS_TABLE,
};
use sqlx::PgPool;
use tracing::debug;

use crate::error::{ErrorKind, IngestError, IngestResult};
use crate::ingest_error;
use crate::store::base::{EventStore, EventWrite};
use crate::store::batch::EventBatch;
use crate::store::duplicate::is_duplicate_transaction;
use crate::types::Transaction;

/// Flips the spent flag on an output a newly imported input references.
const MARK_SPENT_QUERY: &str = "update transaction_outputs set spent = true where output_id = $1";

/// [`EventStore`] writing every event in its own database transaction.
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Connects to the database and returns a store backed by a connection pool.
    pub async fn connect(
        config: &PgConnectionConfig,
        max_connections: u32,
    ) -> IngestResult<PostgresEventStore> {
        let pool = connect_to_database(config, 1, max_connections)
            .await
            .map_err(|err| {
                ingest_error!(
                    ErrorKind::DestinationConnectionFailed,
                    "Failed to connect to the destination database",
                    source: err
                )
            })?;

        Ok(PostgresEventStore { pool })
    }

    /// Wraps an existing pool, used by tests that manage their own database.
    pub fn with_pool(pool: PgPool) -> PostgresEventStore {
        PostgresEventStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl EventStore for PostgresEventStore {
    async fn write_event(
        &self,
        transaction: &Transaction,
        columns: &CustomColumnsConfig,
    ) -> IngestResult<EventWrite> {
        let batch = EventBatch::build(transaction, columns);

        let mut db_transaction = self.pool.begin().await.map_err(IngestError::from)?;

        let transaction_insert = batch.transaction.insert_sql(TRANSACTIONS_TABLE);
        let query = batch
            .transaction
            .bind_values(sqlx::query(&transaction_insert));

        if let Err(err) = query.execute(&mut *db_transaction).await {
            if is_duplicate_transaction(&err) {
                // Rolls back on drop; the event was imported by an earlier run.
                debug!(transaction_id = %transaction.id, "event already imported");

                return Ok(EventWrite::AlreadyImported);
            }

            return Err(IngestError::from(err));
        }

        for input in &batch.inputs {
            let input_insert = input.insert_sql(TRANSACTION_INPUTS_TABLE);
            input
                .bind_values(sqlx::query(&input_insert))
                .execute(&mut *db_transaction)
                .await
                .map_err(IngestError::from)?;
        }

        for output in &batch.outputs {
            let output_insert = output.insert_sql(TRANSACTION_OUTPUTS_TABLE);
            output
                .bind_values(sqlx::query(&output_insert))
                .execute(&mut *db_transaction)
                .await
                .map_err(IngestError::from)?;
        }

        for output_id in &batch.spent_output_ids {
            sqlx::query(MARK_SPENT_QUERY)
                .bind(output_id)
                .execute(&mut *db_transaction)
                .await
                .map_err(IngestError::from)?;
        }

        db_transaction.commit().await.map_err(IngestError::from)?;

        Ok(EventWrite::Inserted)
    }
}
