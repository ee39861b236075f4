//! Custom column value extraction.
//!
//! Resolves configured dot-separated paths against raw JSON payloads and coerces the
//! resolved values into the closed set of column values the store understands. A path
//! that resolves to nothing, or to a value the target type cannot represent, yields a
//! SQL null so one misconfigured column cannot stall the import loop.

use chrono::{DateTime, Utc};
use config::shared::{ColumnType, CustomColumnConfig};
use serde_json::Value;
use tracing::warn;

use crate::bail;
use crate::error::{ErrorKind, IngestResult};
use crate::store::columns::ColumnValue;

/// Resolves a dot-separated path against a JSON value.
///
/// Each segment descends into an object field; segments that parse as an unsigned
/// integer also index into arrays. Returns `None` as soon as a segment cannot be
/// resolved.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;

    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Coerces a resolved JSON value into the typed value a column of `column_type`
/// stores.
///
/// JSON null always coerces to a null column value. Any other mismatch between the
/// JSON value and the target type is a conversion error.
pub fn try_coerce(value: &Value, column_type: ColumnType) -> IngestResult<ColumnValue> {
    if value.is_null() {
        return Ok(ColumnValue::null(column_type));
    }

    let coerced = match column_type {
        ColumnType::String => value.as_str().map(|text| ColumnValue::Text(Some(text.to_owned()))),
        ColumnType::Integer => value.as_i64().map(|number| ColumnValue::BigInt(Some(number))),
        ColumnType::Boolean => match value {
            Value::Bool(flag) => Some(ColumnValue::Bool(Some(*flag))),
            Value::String(flag) if flag == "yes" => Some(ColumnValue::Bool(Some(true))),
            Value::String(flag) if flag == "no" => Some(ColumnValue::Bool(Some(false))),
            _ => None,
        },
        ColumnType::Timestamp => value
            .as_str()
            .and_then(|text| text.parse::<DateTime<Utc>>().ok())
            .map(|instant| ColumnValue::Timestamp(Some(instant))),
        ColumnType::Json => Some(ColumnValue::Json(Some(value.clone()))),
    };

    match coerced {
        Some(coerced) => Ok(coerced),
        None => bail!(
            ErrorKind::ConversionError,
            "Value not representable as configured column type",
            format!("value `{value}` cannot be stored as {column_type:?}")
        ),
    }
}

/// Extracts the value a configured custom column contributes for one payload.
///
/// Falls back to a typed null, with a warning, when the path does not resolve or the
/// value cannot be coerced.
pub fn extract(payload: &Value, column: &CustomColumnConfig) -> ColumnValue {
    let Some(resolved) = resolve_path(payload, &column.path) else {
        warn!(
            column = %column.name,
            path = %column.path,
            "custom column path did not resolve, storing null"
        );

        return ColumnValue::null(column.column_type);
    };

    match try_coerce(resolved, column.column_type) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                column = %column.name,
                path = %column.path,
                error = %err,
                "custom column value could not be coerced, storing null"
            );

            ColumnValue::null(column.column_type)
        }
    }
}
