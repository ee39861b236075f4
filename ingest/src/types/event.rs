use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::IngestResult;

/// Deserializes the feed's `"yes"`/`"no"` locality flags into a boolean.
///
/// The wire encodes locality as strings; anything other than `"yes"` (or a literal
/// JSON `true`) is treated as not local.
pub(crate) mod yes_no {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;

        Ok(match value {
            Some(Value::String(flag)) => flag == "yes",
            Some(Value::Bool(flag)) => flag,
            _ => false,
        })
    }
}

/// One ledger transaction ingested from the feed.
///
/// The raw feed payload is kept alongside the decoded fields: it is stored verbatim
/// for audit and is the entity custom-column extraction paths are evaluated against.
#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub block_height: i64,
    pub timestamp: DateTime<Utc>,
    pub position: i32,
    #[serde(default, deserialize_with = "yes_no::deserialize")]
    pub is_local: bool,
    pub reference_data: Option<Value>,
    #[serde(default)]
    pub inputs: Vec<TransactionInput>,
    #[serde(default)]
    pub outputs: Vec<TransactionOutput>,
    #[serde(skip)]
    pub raw: Value,
}

impl Transaction {
    /// Decodes a transaction from its raw feed payload, keeping the payload.
    pub fn from_raw(raw: Value) -> IngestResult<Transaction> {
        let mut transaction: Transaction = serde_json::from_value(raw.clone())?;
        transaction.raw = raw;

        Ok(transaction)
    }

    /// Returns the raw JSON of the input at `index`, or JSON null when absent.
    pub fn raw_input(&self, index: usize) -> &Value {
        self.raw
            .get("inputs")
            .and_then(|inputs| inputs.get(index))
            .unwrap_or(&Value::Null)
    }

    /// Returns the raw JSON of the output at `index`, or JSON null when absent.
    pub fn raw_output(&self, index: usize) -> &Value {
        self.raw
            .get("outputs")
            .and_then(|outputs| outputs.get(index))
            .unwrap_or(&Value::Null)
    }
}

/// An ordered child input of a transaction.
///
/// An input may reference an output written by an earlier transaction through
/// [`TransactionInput::spent_output_id`].
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionInput {
    #[serde(rename = "type")]
    pub input_type: Option<String>,
    pub asset_id: Option<String>,
    pub asset_alias: Option<String>,
    pub asset_definition: Option<Value>,
    pub asset_tags: Option<Value>,
    #[serde(default, deserialize_with = "yes_no::deserialize")]
    pub asset_is_local: bool,
    #[serde(default)]
    pub amount: i64,
    pub account_id: Option<String>,
    pub account_alias: Option<String>,
    pub account_tags: Option<Value>,
    pub issuance_program: Option<String>,
    pub reference_data: Option<Value>,
    #[serde(default, deserialize_with = "yes_no::deserialize")]
    pub is_local: bool,
    pub spent_output_id: Option<String>,
}

impl TransactionInput {
    /// Returns the referenced spent output id, treating the empty string as absent.
    pub fn spent_output_id(&self) -> Option<&str> {
        self.spent_output_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// An ordered child output of a transaction.
///
/// Outputs carry an externally assigned identity distinct from their index; a later
/// transaction's input may mark them spent through that identity.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionOutput {
    pub id: String,
    #[serde(rename = "type")]
    pub output_type: Option<String>,
    pub purpose: Option<String>,
    pub asset_id: Option<String>,
    pub asset_alias: Option<String>,
    pub asset_definition: Option<Value>,
    pub asset_tags: Option<Value>,
    #[serde(default, deserialize_with = "yes_no::deserialize")]
    pub asset_is_local: bool,
    #[serde(default)]
    pub amount: i64,
    pub account_id: Option<String>,
    pub account_alias: Option<String>,
    pub account_tags: Option<Value>,
    pub control_program: Option<String>,
    pub reference_data: Option<Value>,
    #[serde(default, deserialize_with = "yes_no::deserialize")]
    pub is_local: bool,
}
