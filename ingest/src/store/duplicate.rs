//! Classification of the duplicate-event signal.
//!
//! Re-delivered events surface as a unique violation on the transactions primary key
//! when their row is inserted. Only that exact violation is treated as "already
//! imported"; every other database error keeps its failure semantics.

use postgres::ledger::TRANSACTIONS_PKEY;

/// Postgres error code for `unique_violation`.
const UNIQUE_VIOLATION_CODE: &str = "23505";

/// Returns true when the given SQLSTATE code and constraint identify a duplicate
/// transaction insert.
pub fn is_unique_violation(code: Option<&str>, constraint: Option<&str>) -> bool {
    code == Some(UNIQUE_VIOLATION_CODE) && constraint == Some(TRANSACTIONS_PKEY)
}

/// Returns true when `error` is the unique violation raised by inserting an already
/// imported transaction.
pub fn is_duplicate_transaction(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(database_error) => is_unique_violation(
            database_error.code().as_deref(),
            database_error.constraint(),
        ),
        _ => false,
    }
}
