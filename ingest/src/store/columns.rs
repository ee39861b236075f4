//! Named, ordered row construction for event writes.
//!
//! Rows pair column names with typed values so insert statements and their bind
//! parameters are always derived from the same ordered list. Custom columns append
//! after the fixed columns of their table and never disturb fixed column positions.

use chrono::{DateTime, Utc};
use config::shared::ColumnType;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

/// A typed value bound to one column of a row.
///
/// This is the closed set of value shapes the store can hold. Every variant carries
/// an option so a typed SQL null can be bound for it.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(Option<String>),
    BigInt(Option<i64>),
    Int(Option<i32>),
    Bool(Option<bool>),
    Timestamp(Option<DateTime<Utc>>),
    Json(Option<Value>),
}

impl ColumnValue {
    /// Returns the null value of the column type used for custom columns.
    pub fn null(column_type: ColumnType) -> ColumnValue {
        match column_type {
            ColumnType::String => ColumnValue::Text(None),
            ColumnType::Integer => ColumnValue::BigInt(None),
            ColumnType::Boolean => ColumnValue::Bool(None),
            ColumnType::Timestamp => ColumnValue::Timestamp(None),
            ColumnType::Json => ColumnValue::Json(None),
        }
    }

    /// Binds this value as the next parameter of `query`.
    pub fn bind_to<'q>(
        self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            ColumnValue::Text(value) => query.bind(value),
            ColumnValue::BigInt(value) => query.bind(value),
            ColumnValue::Int(value) => query.bind(value),
            ColumnValue::Bool(value) => query.bind(value),
            ColumnValue::Timestamp(value) => query.bind(value),
            ColumnValue::Json(value) => query.bind(value),
        }
    }
}

/// An ordered list of named column values destined for one table row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, ColumnValue)>,
}

impl Row {
    pub fn new() -> Row {
        Row::default()
    }

    /// Appends a column after all previously pushed columns.
    pub fn push(&mut self, name: impl Into<String>, value: ColumnValue) {
        self.columns.push((name.into(), value));
    }

    /// Returns the value of the named column, if present.
    pub fn get(&self, name: &str) -> Option<&ColumnValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Replaces the value of the named column, returning whether it was present.
    pub fn set(&mut self, name: &str, value: ColumnValue) -> bool {
        match self.columns.iter_mut().find(|(column, _)| column == name) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates the column names in bind order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Renders the insert statement for this row against `table`, with one
    /// positional placeholder per column.
    pub fn insert_sql(&self, table: &str) -> String {
        let names = self.names().collect::<Vec<_>>().join(", ");
        let placeholders = (1..=self.len())
            .map(|position| format!("${position}"))
            .collect::<Vec<_>>()
            .join(", ");

        format!("insert into {table} ({names}) values ({placeholders})")
    }

    /// Binds every column value onto `query` in the same order `insert_sql` numbered
    /// its placeholders.
    pub fn bind_values<'q>(
        &self,
        mut query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        for (_, value) in &self.columns {
            query = value.clone().bind_to(query);
        }

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_sql_numbers_placeholders_in_push_order() {
        let mut row = Row::new();
        row.push("id", ColumnValue::Text(Some("tx-1".to_owned())));
        row.push("block_height", ColumnValue::BigInt(Some(7)));
        row.push("is_local", ColumnValue::Bool(Some(false)));

        assert_eq!(
            row.insert_sql("transactions"),
            "insert into transactions (id, block_height, is_local) values ($1, $2, $3)"
        );
    }

    #[test]
    fn get_returns_named_value() {
        let mut row = Row::new();
        row.push("spent", ColumnValue::Bool(Some(false)));
        row.push("memo", ColumnValue::Text(None));

        assert_eq!(row.get("spent"), Some(&ColumnValue::Bool(Some(false))));
        assert_eq!(row.get("memo"), Some(&ColumnValue::Text(None)));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn null_matches_column_type() {
        assert_eq!(ColumnValue::null(ColumnType::String), ColumnValue::Text(None));
        assert_eq!(ColumnValue::null(ColumnType::Integer), ColumnValue::BigInt(None));
        assert_eq!(
            ColumnValue::null(ColumnType::Timestamp),
            ColumnValue::Timestamp(None)
        );
    }
}
