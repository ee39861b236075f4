//! Builders for raw transaction payloads shaped like feed responses.

use serde_json::{json, Value};

/// Builds one raw transaction payload with a spend input per entry of `spends` and
/// one control output per `(output_id, amount)` pair.
pub fn transaction_payload(
    id: &str,
    block_height: i64,
    position: i32,
    spends: &[&str],
    outputs: &[(&str, i64)],
) -> Value {
    let inputs = if spends.is_empty() {
        json!([{ "type": "issue", "amount": outputs.iter().map(|(_, amount)| amount).sum::<i64>() }])
    } else {
        Value::Array(
            spends
                .iter()
                .map(|spent_output_id| {
                    json!({
                        "type": "spend",
                        "amount": 1,
                        "spent_output_id": spent_output_id
                    })
                })
                .collect(),
        )
    };

    let outputs = Value::Array(
        outputs
            .iter()
            .map(|(output_id, amount)| {
                json!({
                    "id": output_id,
                    "type": "control",
                    "amount": amount,
                    "is_local": "no"
                })
            })
            .collect(),
    );

    json!({
        "id": id,
        "block_height": block_height,
        "timestamp": "2018-06-01T12:00:00Z",
        "position": position,
        "is_local": "no",
        "reference_data": { "source": "test" },
        "inputs": inputs,
        "outputs": outputs
    })
}
