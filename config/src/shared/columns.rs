use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Closed set of target types a custom column value can be coerced to.
///
/// Every variant has an explicit conversion in the importer's column extractor;
/// there is no dynamic runtime type dispatch beyond this enum.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Text column.
    String,
    /// 64-bit signed integer column.
    Integer,
    /// Boolean column. Accepts JSON booleans and the feed's `"yes"`/`"no"` flags.
    Boolean,
    /// Timestamp-with-timezone column, parsed from RFC 3339 strings.
    Timestamp,
    /// JSONB column storing the extracted value verbatim.
    Json,
}

/// A single configured custom column.
///
/// The extraction path is evaluated against the entity's JSON payload and the result
/// is coerced to [`CustomColumnConfig::column_type`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomColumnConfig {
    /// Name of the database column the value is written to.
    pub name: String,
    /// Dot-separated extraction path, e.g. `reference_data.department`.
    pub path: String,
    /// Target type for the extracted value.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Custom columns appended after the fixed columns, per entity kind, in list order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CustomColumnsConfig {
    /// Custom columns on the transactions table, extracted against the whole transaction.
    #[serde(default)]
    pub transaction: Vec<CustomColumnConfig>,
    /// Custom columns on the inputs table, extracted against each input.
    #[serde(default)]
    pub input: Vec<CustomColumnConfig>,
    /// Custom columns on the outputs table, extracted against each output.
    #[serde(default)]
    pub output: Vec<CustomColumnConfig>,
}

impl CustomColumnsConfig {
    /// Validates that every configured column has a name and an extraction path.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for column in self
            .transaction
            .iter()
            .chain(self.input.iter())
            .chain(self.output.iter())
        {
            if column.name.is_empty() || column.path.is_empty() {
                return Err(ValidationError::InvalidCustomColumn(column.name.clone()));
            }
        }

        Ok(())
    }
}
