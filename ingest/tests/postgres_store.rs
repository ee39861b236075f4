//! End-to-end store tests against a real Postgres instance.
//!
//! Gated behind the `test-utils` feature because they need a reachable server.
//! Connection parameters come from `TESTS_PG_*` environment variables and default
//! to a local instance; each test run works in its own scratch database.

use config::shared::{ColumnType, CustomColumnConfig, CustomColumnsConfig, PgConnectionConfig, TlsConfig};
use ingest::store::{EventStore, EventWrite};
use ingest::store::postgres::PostgresEventStore;
use ingest::test_utils::transaction_payload;
use ingest::types::Transaction;
use postgres::ledger::{
    add_custom_column, count_rows, get_input_rows, get_output_row_by_id, get_output_rows,
    get_transaction_row, install_ledger_schema, TRANSACTIONS_TABLE, TRANSACTION_OUTPUTS_TABLE,
};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use telemetry::tracing::init_test_tracing;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn base_config(database: &str) -> PgConnectionConfig {
    PgConnectionConfig {
        host: env_or("TESTS_PG_HOST", "localhost"),
        port: env_or("TESTS_PG_PORT", "5432").parse().expect("invalid TESTS_PG_PORT"),
        name: database.to_owned(),
        username: env_or("TESTS_PG_USERNAME", "postgres"),
        password: Some(env_or("TESTS_PG_PASSWORD", "postgres").into()),
        tls: TlsConfig {
            trusted_root_certs: String::new(),
            enabled: false,
        },
    }
}

/// Creates a scratch database and returns a pool connected to it.
async fn scratch_database() -> (PgPool, String) {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| c.to_ascii_lowercase() as char)
        .collect();
    let database = format!("ledger_test_{suffix}");

    let admin_config = base_config("postgres");
    let admin_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(admin_config.with_db())
        .await
        .expect("failed to connect to the admin database");
    sqlx::query(&format!(r#"create database "{database}""#))
        .execute(&admin_pool)
        .await
        .expect("failed to create the scratch database");

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect_with(base_config(&database).with_db())
        .await
        .expect("failed to connect to the scratch database");
    install_ledger_schema(&pool)
        .await
        .expect("failed to install the ledger schema");

    (pool, database)
}

fn decode(raw: serde_json::Value) -> Transaction {
    Transaction::from_raw(raw).expect("payload should decode")
}

#[tokio::test]
async fn writes_are_atomic_and_idempotent() {
    init_test_tracing();
    let (pool, _database) = scratch_database().await;
    let store = PostgresEventStore::with_pool(pool.clone());
    let columns = CustomColumnsConfig::default();

    let event = decode(transaction_payload("tx-1", 1, 0, &[], &[("out-1", 100), ("out-2", 200)]));

    let outcome = store.write_event(&event, &columns).await.unwrap();
    assert_eq!(outcome, EventWrite::Inserted);

    let row = get_transaction_row(&pool, "tx-1").await.unwrap().unwrap();
    assert_eq!(row.block_height, 1);
    assert_eq!(row.raw_payload["id"], "tx-1");
    assert_eq!(get_input_rows(&pool, "tx-1").await.unwrap().len(), 1);
    assert_eq!(get_output_rows(&pool, "tx-1").await.unwrap().len(), 2);

    // Re-delivery is suppressed without touching any table.
    let outcome = store.write_event(&event, &columns).await.unwrap();
    assert_eq!(outcome, EventWrite::AlreadyImported);
    assert_eq!(count_rows(&pool, TRANSACTIONS_TABLE).await.unwrap(), 1);
    assert_eq!(count_rows(&pool, TRANSACTION_OUTPUTS_TABLE).await.unwrap(), 2);
}

#[tokio::test]
async fn spending_inputs_flip_earlier_outputs() {
    init_test_tracing();
    let (pool, _database) = scratch_database().await;
    let store = PostgresEventStore::with_pool(pool.clone());
    let columns = CustomColumnsConfig::default();

    store
        .write_event(&decode(transaction_payload("tx-1", 1, 0, &[], &[("out-1", 100)])), &columns)
        .await
        .unwrap();
    let output = get_output_row_by_id(&pool, "out-1").await.unwrap().unwrap();
    assert!(!output.spent);

    store
        .write_event(
            &decode(transaction_payload("tx-2", 2, 0, &["out-1"], &[("out-2", 100)])),
            &columns,
        )
        .await
        .unwrap();

    let spent = get_output_row_by_id(&pool, "out-1").await.unwrap().unwrap();
    assert!(spent.spent);
    let unspent = get_output_row_by_id(&pool, "out-2").await.unwrap().unwrap();
    assert!(!unspent.spent);
}

#[tokio::test]
async fn custom_columns_are_persisted() {
    init_test_tracing();
    let (pool, _database) = scratch_database().await;
    add_custom_column(&pool, TRANSACTIONS_TABLE, "first_output_amount", ColumnType::Integer)
        .await
        .unwrap();

    let store = PostgresEventStore::with_pool(pool.clone());
    let columns = CustomColumnsConfig {
        transaction: vec![CustomColumnConfig {
            name: "first_output_amount".to_owned(),
            path: "outputs.0.amount".to_owned(),
            column_type: ColumnType::Integer,
        }],
        input: vec![],
        output: vec![],
    };

    store
        .write_event(&decode(transaction_payload("tx-1", 1, 0, &[], &[("out-1", 500000)])), &columns)
        .await
        .unwrap();

    let amount: Option<i64> =
        sqlx::query_scalar("select first_output_amount from transactions where id = $1")
            .bind("tx-1")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(amount, Some(500000));
}

#[tokio::test]
async fn failed_event_leaves_no_partial_rows() {
    init_test_tracing();
    let (pool, _database) = scratch_database().await;
    let store = PostgresEventStore::with_pool(pool.clone());
    let columns = CustomColumnsConfig::default();

    store
        .write_event(&decode(transaction_payload("tx-1", 1, 0, &[], &[("out-1", 100)])), &columns)
        .await
        .unwrap();

    // Reusing an output id violates its unique index mid-event; the whole event
    // must roll back, including the already inserted transaction row.
    let clashing = decode(transaction_payload("tx-2", 2, 0, &[], &[("out-1", 100)]));
    store.write_event(&clashing, &columns).await.unwrap_err();

    assert_eq!(count_rows(&pool, TRANSACTIONS_TABLE).await.unwrap(), 1);
    assert!(get_transaction_row(&pool, "tx-2").await.unwrap().is_none());

    // The event is importable once the clash is gone.
    let fixed = decode(transaction_payload("tx-2", 2, 0, &[], &[("out-2", 100)]));
    assert_eq!(store.write_event(&fixed, &columns).await.unwrap(), EventWrite::Inserted);
}
