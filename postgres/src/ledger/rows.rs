use chrono::{DateTime, Utc};
use sqlx::{PgPool, prelude::FromRow};

/// Fixed columns of a row in the transactions table.
#[derive(Debug, FromRow)]
pub struct TransactionRow {
    pub id: String,
    pub block_height: i64,
    pub committed_at: DateTime<Utc>,
    pub block_position: i32,
    pub is_local: bool,
    pub reference_data: Option<serde_json::Value>,
    pub raw_payload: serde_json::Value,
}

/// Fixed columns of a row in the transaction inputs table.
#[derive(Debug, FromRow)]
pub struct TransactionInputRow {
    pub transaction_id: String,
    pub input_index: i32,
    #[sqlx(rename = "type")]
    pub input_type: Option<String>,
    pub asset_id: Option<String>,
    pub asset_alias: Option<String>,
    pub asset_definition: Option<serde_json::Value>,
    pub asset_tags: Option<serde_json::Value>,
    pub asset_is_local: bool,
    pub amount: i64,
    pub account_id: Option<String>,
    pub account_alias: Option<String>,
    pub account_tags: Option<serde_json::Value>,
    pub issuance_program: Option<String>,
    pub reference_data: Option<serde_json::Value>,
    pub is_local: bool,
    pub spent_output_id: Option<String>,
}

/// Fixed columns of a row in the transaction outputs table.
#[derive(Debug, FromRow)]
pub struct TransactionOutputRow {
    pub transaction_id: String,
    pub output_index: i32,
    pub output_id: String,
    #[sqlx(rename = "type")]
    pub output_type: Option<String>,
    pub purpose: Option<String>,
    pub asset_id: Option<String>,
    pub asset_alias: Option<String>,
    pub asset_definition: Option<serde_json::Value>,
    pub asset_tags: Option<serde_json::Value>,
    pub asset_is_local: bool,
    pub amount: i64,
    pub account_id: Option<String>,
    pub account_alias: Option<String>,
    pub account_tags: Option<serde_json::Value>,
    pub control_program: Option<String>,
    pub reference_data: Option<serde_json::Value>,
    pub is_local: bool,
    pub spent: bool,
}

/// Fetches a transaction row by id.
pub async fn get_transaction_row(
    pool: &PgPool,
    transaction_id: &str,
) -> sqlx::Result<Option<TransactionRow>> {
    sqlx::query_as::<_, TransactionRow>(
        r#"
        select id, block_height, committed_at, block_position, is_local,
               reference_data, raw_payload
        from transactions
        where id = $1
        "#,
    )
    .bind(transaction_id)
    .fetch_optional(pool)
    .await
}

/// Fetches the input rows of a transaction, ordered by input index.
pub async fn get_input_rows(
    pool: &PgPool,
    transaction_id: &str,
) -> sqlx::Result<Vec<TransactionInputRow>> {
    sqlx::query_as::<_, TransactionInputRow>(
        r#"
        select transaction_id, input_index, type, asset_id, asset_alias,
               asset_definition, asset_tags, asset_is_local, amount, account_id,
               account_alias, account_tags, issuance_program, reference_data,
               is_local, spent_output_id
        from transaction_inputs
        where transaction_id = $1
        order by input_index
        "#,
    )
    .bind(transaction_id)
    .fetch_all(pool)
    .await
}

/// Fetches the output rows of a transaction, ordered by output index.
pub async fn get_output_rows(
    pool: &PgPool,
    transaction_id: &str,
) -> sqlx::Result<Vec<TransactionOutputRow>> {
    sqlx::query_as::<_, TransactionOutputRow>(
        r#"
        select transaction_id, output_index, output_id, type, purpose, asset_id,
               asset_alias, asset_definition, asset_tags, asset_is_local, amount,
               account_id, account_alias, account_tags, control_program,
               reference_data, is_local, spent
        from transaction_outputs
        where transaction_id = $1
        order by output_index
        "#,
    )
    .bind(transaction_id)
    .fetch_all(pool)
    .await
}

/// Fetches a single output row by its externally assigned output id.
pub async fn get_output_row_by_id(
    pool: &PgPool,
    output_id: &str,
) -> sqlx::Result<Option<TransactionOutputRow>> {
    sqlx::query_as::<_, TransactionOutputRow>(
        r#"
        select transaction_id, output_index, output_id, type, purpose, asset_id,
               asset_alias, asset_definition, asset_tags, asset_is_local, amount,
               account_id, account_alias, account_tags, control_program,
               reference_data, is_local, spent
        from transaction_outputs
        where output_id = $1
        "#,
    )
    .bind(output_id)
    .fetch_optional(pool)
    .await
}

/// Counts the rows of one of the ledger tables. Intended for tests.
pub async fn count_rows(pool: &PgPool, table: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar(&format!("select count(*) from {table}"))
        .fetch_one(pool)
        .await
}
