use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::command::{CommandSpec, EnvelopeKind};

/// `{ "<id>": payload }`. The service keys the payload by the decimal id.
fn keyed(id: u64, payload: JsonValue) -> JsonValue {
    let mut map = JsonMap::new();
    map.insert(id.to_string(), payload);
    JsonValue::Object(map)
}

/// `[[[id, [{ "<id>": payload }], null, null, 0]]]`
pub fn encode_query(id: u64, payload: JsonValue) -> String {
    json!([[[id, [keyed(id, payload)], null, null, 0]]]).to_string()
}

/// `["af.maf", [["af.add", id, [{ "<id>": payload }]]]]`
pub fn encode_mutate(id: u64, payload: JsonValue) -> String {
    json!(["af.maf", [["af.add", id, [keyed(id, payload)]]]]).to_string()
}

/// `[[[rpcId, "<payload json>", null, "generic"]]]`
pub fn encode_batch(rpc_id: &str, payload: &JsonValue) -> String {
    json!([[[rpc_id, payload.to_string(), null, "generic"]]]).to_string()
}

/// Encodes `payload` for `spec` in the requested wrapper.
///
/// Operations without a batch rpc id fall back to their own numeric kind.
pub fn encode(spec: &CommandSpec, kind: EnvelopeKind, payload: JsonValue) -> String {
    let kind = match kind {
        EnvelopeKind::Batch if !spec.supports_batch() => spec.kind,
        other => other,
    };
    match kind {
        EnvelopeKind::Query => encode_query(spec.id, payload),
        EnvelopeKind::Mutate => encode_mutate(spec.id, payload),
        EnvelopeKind::Batch => encode_batch(spec.rpc_id, &payload),
    }
}
