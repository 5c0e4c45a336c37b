//! Payload trees for each operation. The service's payloads are positional
//! arrays, so these stay generic JSON values rather than typed structs.

use serde_json::{json, Value as JsonValue};

/// Turns a completed upload into a library item.
pub fn enable_uploaded_item(upload_token: &str, file_name: &str, modified_ms: i64) -> JsonValue {
    json!([[[upload_token, file_name, modified_ms]]])
}

pub fn list_collections() -> JsonValue {
    json!([null, null, null, null, 1])
}

/// Creates a collection and attaches `item_ids` in the same round trip.
pub fn create_collection(name: &str, item_ids: &[&str]) -> JsonValue {
    let items: Vec<JsonValue> = item_ids.iter().map(|id| json!([[id]])).collect();
    json!([name, null, 2, items])
}

pub fn add_to_collection(collection_id: &str, item_id: &str) -> JsonValue {
    json!([[item_id], collection_id])
}

pub fn add_to_shared_collection(collection_id: &str, share_key: &str, item_id: &str) -> JsonValue {
    json!([
        [collection_id],
        [2, null, [[[item_id]]], null, null, [], [1], null, null, null, []],
        share_key,
        [null, null, null, null, [null, []]]
    ])
}

pub fn remove_from_collection(item_id: &str) -> JsonValue {
    json!([[item_id], []])
}
