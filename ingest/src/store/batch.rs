//! Converts a decoded transaction into the rows one event write persists.
//!
//! The batch carries one transaction row, one row per input and output, and the ids
//! of previously stored outputs this transaction spends. Fixed columns always come
//! first in a row; configured custom columns append after them, each extracted from
//! the raw payload of its own entity.

use config::shared::CustomColumnsConfig;
use serde_json::Value;

use crate::extract::extract;
use crate::store::columns::{ColumnValue, Row};
use crate::types::{Transaction, TransactionInput, TransactionOutput};

fn text(value: &Option<String>) -> ColumnValue {
    ColumnValue::Text(value.clone())
}

fn json(value: &Option<Value>) -> ColumnValue {
    ColumnValue::Json(value.clone())
}

/// All rows produced by one feed event, ready to be written atomically.
#[derive(Debug, Clone)]
pub struct EventBatch {
    pub transaction: Row,
    pub inputs: Vec<Row>,
    pub outputs: Vec<Row>,
    /// Output ids this event's inputs spend, in input order, empty ids dropped.
    pub spent_output_ids: Vec<String>,
}

impl EventBatch {
    /// Builds the batch for one transaction.
    ///
    /// Building never fails: custom columns that cannot be extracted contribute a
    /// typed null instead.
    pub fn build(transaction: &Transaction, columns: &CustomColumnsConfig) -> EventBatch {
        let transaction_row = build_transaction_row(transaction, columns);

        let inputs = transaction
            .inputs
            .iter()
            .enumerate()
            .map(|(index, input)| build_input_row(transaction, index, input, columns))
            .collect();

        let outputs = transaction
            .outputs
            .iter()
            .enumerate()
            .map(|(index, output)| build_output_row(transaction, index, output, columns))
            .collect();

        let spent_output_ids = transaction
            .inputs
            .iter()
            .filter_map(|input| input.spent_output_id())
            .map(str::to_owned)
            .collect();

        EventBatch {
            transaction: transaction_row,
            inputs,
            outputs,
            spent_output_ids,
        }
    }
}

fn build_transaction_row(transaction: &Transaction, columns: &CustomColumnsConfig) -> Row {
    let mut row = Row::new();

    row.push("id", ColumnValue::Text(Some(transaction.id.clone())));
    row.push(
        "block_height",
        ColumnValue::BigInt(Some(transaction.block_height)),
    );
    row.push(
        "committed_at",
        ColumnValue::Timestamp(Some(transaction.timestamp)),
    );
    row.push("block_position", ColumnValue::Int(Some(transaction.position)));
    row.push("is_local", ColumnValue::Bool(Some(transaction.is_local)));
    row.push("reference_data", json(&transaction.reference_data));
    row.push("raw_payload", ColumnValue::Json(Some(transaction.raw.clone())));

    for column in &columns.transaction {
        row.push(column.name.clone(), extract(&transaction.raw, column));
    }

    row
}

fn build_input_row(
    transaction: &Transaction,
    index: usize,
    input: &TransactionInput,
    columns: &CustomColumnsConfig,
) -> Row {
    let mut row = Row::new();

    row.push(
        "transaction_id",
        ColumnValue::Text(Some(transaction.id.clone())),
    );
    row.push("input_index", ColumnValue::Int(Some(index as i32)));
    row.push("type", text(&input.input_type));
    row.push("asset_id", text(&input.asset_id));
    row.push("asset_alias", text(&input.asset_alias));
    row.push("asset_definition", json(&input.asset_definition));
    row.push("asset_tags", json(&input.asset_tags));
    row.push("asset_is_local", ColumnValue::Bool(Some(input.asset_is_local)));
    row.push("amount", ColumnValue::BigInt(Some(input.amount)));
    row.push("account_id", text(&input.account_id));
    row.push("account_alias", text(&input.account_alias));
    row.push("account_tags", json(&input.account_tags));
    row.push("issuance_program", text(&input.issuance_program));
    row.push("reference_data", json(&input.reference_data));
    row.push("is_local", ColumnValue::Bool(Some(input.is_local)));
    row.push("spent_output_id", text(&input.spent_output_id));

    let payload = transaction.raw_input(index);
    for column in &columns.input {
        row.push(column.name.clone(), extract(payload, column));
    }

    row
}

fn build_output_row(
    transaction: &Transaction,
    index: usize,
    output: &TransactionOutput,
    columns: &CustomColumnsConfig,
) -> Row {
    let mut row = Row::new();

    row.push(
        "transaction_id",
        ColumnValue::Text(Some(transaction.id.clone())),
    );
    row.push("output_index", ColumnValue::Int(Some(index as i32)));
    row.push("output_id", ColumnValue::Text(Some(output.id.clone())));
    row.push("type", text(&output.output_type));
    row.push("purpose", text(&output.purpose));
    row.push("asset_id", text(&output.asset_id));
    row.push("asset_alias", text(&output.asset_alias));
    row.push("asset_definition", json(&output.asset_definition));
    row.push("asset_tags", json(&output.asset_tags));
    row.push("asset_is_local", ColumnValue::Bool(Some(output.asset_is_local)));
    row.push("amount", ColumnValue::BigInt(Some(output.amount)));
    row.push("account_id", text(&output.account_id));
    row.push("account_alias", text(&output.account_alias));
    row.push("account_tags", json(&output.account_tags));
    row.push("control_program", text(&output.control_program));
    row.push("reference_data", json(&output.reference_data));
    row.push("is_local", ColumnValue::Bool(Some(output.is_local)));
    // New outputs always start unspent; a later event flips the flag.
    row.push("spent", ColumnValue::Bool(Some(false)));

    let payload = transaction.raw_output(index);
    for column in &columns.output {
        row.push(column.name.clone(), extract(payload, column));
    }

    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::shared::{ColumnType, CustomColumnConfig};
    use serde_json::json;

    fn custom(name: &str, path: &str, column_type: ColumnType) -> CustomColumnConfig {
        CustomColumnConfig {
            name: name.to_owned(),
            path: path.to_owned(),
            column_type,
        }
    }

    fn sample_transaction() -> Transaction {
        Transaction::from_raw(json!({
            "id": "tx-1",
            "block_height": 10,
            "timestamp": "2018-06-01T12:00:00Z",
            "position": 2,
            "is_local": "yes",
            "reference_data": { "memo": "tx memo" },
            "inputs": [
                {
                    "type": "spend",
                    "asset_id": "asset-a",
                    "amount": 500000,
                    "spent_output_id": "out-prev",
                    "reference_data": { "tag": "in memo" }
                },
                { "type": "issue", "amount": 1, "spent_output_id": "" }
            ],
            "outputs": [
                {
                    "id": "out-1",
                    "type": "control",
                    "asset_id": "asset-a",
                    "amount": 500000,
                    "reference_data": { "tag": "out memo" }
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn fixed_columns_precede_custom_columns() {
        let transaction = sample_transaction();
        let columns = CustomColumnsConfig {
            transaction: vec![custom("memo", "reference_data.memo", ColumnType::String)],
            input: vec![],
            output: vec![],
        };

        let batch = EventBatch::build(&transaction, &columns);

        let names = batch.transaction.names().collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "id",
                "block_height",
                "committed_at",
                "block_position",
                "is_local",
                "reference_data",
                "raw_payload",
                "memo"
            ]
        );
        assert_eq!(
            batch.transaction.get("memo"),
            Some(&ColumnValue::Text(Some("tx memo".to_owned())))
        );
    }

    #[test]
    fn input_and_output_custom_columns_read_their_own_payload() {
        let transaction = sample_transaction();
        let columns = CustomColumnsConfig {
            transaction: vec![],
            input: vec![custom("in_tag", "reference_data.tag", ColumnType::String)],
            output: vec![custom("out_amount", "amount", ColumnType::Integer)],
        };

        let batch = EventBatch::build(&transaction, &columns);

        assert_eq!(
            batch.inputs[0].get("in_tag"),
            Some(&ColumnValue::Text(Some("in memo".to_owned())))
        );
        // Second input has no reference data, so its custom column is null.
        assert_eq!(batch.inputs[1].get("in_tag"), Some(&ColumnValue::Text(None)));
        assert_eq!(
            batch.outputs[0].get("out_amount"),
            Some(&ColumnValue::BigInt(Some(500000)))
        );
        // No custom column leaked into the transaction row.
        assert_eq!(batch.transaction.get("in_tag"), None);
        assert_eq!(batch.transaction.get("out_amount"), None);
    }

    #[test]
    fn spent_output_ids_drop_empty_references() {
        let transaction = sample_transaction();

        let batch = EventBatch::build(&transaction, &CustomColumnsConfig::default());

        assert_eq!(batch.spent_output_ids, vec!["out-prev".to_owned()]);
    }

    #[test]
    fn outputs_are_written_unspent() {
        let transaction = sample_transaction();

        let batch = EventBatch::build(&transaction, &CustomColumnsConfig::default());

        assert_eq!(
            batch.outputs[0].get("spent"),
            Some(&ColumnValue::Bool(Some(false)))
        );
        assert_eq!(
            batch.outputs[0].get("output_id"),
            Some(&ColumnValue::Text(Some("out-1".to_owned())))
        );
    }
}
