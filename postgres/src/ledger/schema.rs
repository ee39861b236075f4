use config::shared::ColumnType;

/// Table holding one row per imported transaction.
pub const TRANSACTIONS_TABLE: &str = "transactions";

/// Table holding the ordered inputs of each transaction.
pub const TRANSACTION_INPUTS_TABLE: &str = "transaction_inputs";

/// Table holding the ordered outputs of each transaction.
pub const TRANSACTION_OUTPUTS_TABLE: &str = "transaction_outputs";

/// Primary-key constraint on the transactions table.
///
/// A unique violation on this constraint is the signal that a transaction was
/// already imported and that the write can be suppressed.
pub const TRANSACTIONS_PKEY: &str = "transactions_pkey";

/// Returns the Postgres type used for a configured custom column.
pub fn sql_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::String => "text",
        ColumnType::Integer => "bigint",
        ColumnType::Boolean => "boolean",
        ColumnType::Timestamp => "timestamptz",
        ColumnType::Json => "jsonb",
    }
}

/// Installs the ledger tables used by integration tests.
///
/// Schema provisioning in production is an operator concern; this helper exists so
/// tests can run against a scratch database.
#[cfg(feature = "test-utils")]
pub async fn install_ledger_schema(pool: &sqlx::PgPool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        create table if not exists transactions (
            id text primary key,
            block_height bigint not null,
            committed_at timestamptz not null,
            block_position integer not null,
            is_local boolean not null,
            reference_data jsonb,
            raw_payload jsonb not null
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        create table if not exists transaction_inputs (
            transaction_id text not null,
            input_index integer not null,
            type text,
            asset_id text,
            asset_alias text,
            asset_definition jsonb,
            asset_tags jsonb,
            asset_is_local boolean not null,
            amount bigint not null,
            account_id text,
            account_alias text,
            account_tags jsonb,
            issuance_program text,
            reference_data jsonb,
            is_local boolean not null,
            spent_output_id text,
            primary key (transaction_id, input_index)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        create table if not exists transaction_outputs (
            transaction_id text not null,
            output_index integer not null,
            output_id text not null,
            type text,
            purpose text,
            asset_id text,
            asset_alias text,
            asset_definition jsonb,
            asset_tags jsonb,
            asset_is_local boolean not null,
            amount bigint not null,
            account_id text,
            account_alias text,
            account_tags jsonb,
            control_program text,
            reference_data jsonb,
            is_local boolean not null,
            spent boolean not null default false,
            primary key (transaction_id, output_index)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "create unique index if not exists transaction_outputs_output_id_key \
         on transaction_outputs (output_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Adds a custom column to one of the ledger tables.
#[cfg(feature = "test-utils")]
pub async fn add_custom_column(
    pool: &sqlx::PgPool,
    table: &str,
    name: &str,
    column_type: ColumnType,
) -> sqlx::Result<()> {
    let ddl = format!(
        "alter table {table} add column if not exists {name} {}",
        sql_type(column_type)
    );
    sqlx::query(&ddl).execute(pool).await?;

    Ok(())
}
