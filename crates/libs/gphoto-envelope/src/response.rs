//! Response handling: prefix stripping, frame extraction and the typed
//! decoders built on the operation table's result paths.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::command::{field, CommandSpec, Operation, ResultShape};
use crate::error::{DecodeError, ShapeFault};
use crate::path::{as_array, kind, Path};

/// Anti-XSSI guard the service puts in front of every RPC response.
pub const XSSI_MAGIC: &[u8] = b")]}'";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledItem {
    pub id: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    Ack,
    /// One value per path of [`ResultShape::Scalars`], in table order.
    Fields(Vec<String>),
    /// One row per list entry, one value per path of [`ResultShape::List`].
    Rows(Vec<Vec<String>>),
}

/// Removes the guard and the line breaks that follow it.
pub fn strip_prefix(body: &[u8]) -> Result<&[u8], DecodeError> {
    let rest = body.strip_prefix(XSSI_MAGIC).ok_or(DecodeError::MissingPrefix)?;
    let start = rest.iter().position(|byte| !byte.is_ascii_whitespace()).unwrap_or(rest.len());
    Ok(&rest[start..])
}

/// Reads the first JSON array of a stripped body.
///
/// Chunked responses interleave decimal length markers with the arrays; the
/// markers parse as numbers and are skipped.
pub fn parse_frame(body: &[u8]) -> Result<JsonValue, DecodeError> {
    let stream = serde_json::Deserializer::from_slice(body).into_iter::<JsonValue>();
    for value in stream {
        match value {
            Ok(JsonValue::Number(_)) => continue,
            Ok(value @ JsonValue::Array(_)) => return Ok(value),
            Ok(other) => {
                return Err(DecodeError::NoFrame {
                    message: format!("unexpected leading {}", kind(&other)),
                })
            }
            Err(err) => return Err(DecodeError::NoFrame { message: err.to_string() }),
        }
    }
    Err(DecodeError::NoFrame { message: "empty body".to_owned() })
}

/// Picks the `["wrb.fr", "<rpcId>", …]` row answering `spec` from every
/// array in the body and returns it as a one-row frame.
///
/// A body without any `wrb.fr` row yields its first array unchanged, so the
/// result paths report where the shape diverged.
pub fn rpc_frame(spec: &CommandSpec, body: &[u8]) -> Result<JsonValue, DecodeError> {
    let first = parse_frame(body)?;
    let mut answered = None;
    for value in serde_json::Deserializer::from_slice(body).into_iter::<JsonValue>() {
        let Ok(JsonValue::Array(rows)) = value else {
            continue;
        };
        for row in rows {
            let Some(id) = rpc_row_id(&row) else {
                continue;
            };
            if id == spec.rpc_id {
                return Ok(JsonValue::Array(vec![row]));
            }
            answered.get_or_insert_with(|| id.to_owned());
        }
    }
    match answered {
        Some(found) => Err(DecodeError::shape(
            field::RPC_FRAME,
            0,
            ShapeFault::WrongRpc { expected: spec.rpc_id, found },
        )),
        None => Ok(first),
    }
}

fn rpc_row_id(row: &JsonValue) -> Option<&str> {
    let row = row.as_array()?;
    match (row.first()?.as_str()?, row.get(1)?.as_str()?) {
        ("wrb.fr", id) => Some(id),
        _ => None,
    }
}

/// Decodes a stripped body according to `spec`'s result shape.
pub fn decode(spec: &CommandSpec, body: &[u8]) -> Result<Decoded, DecodeError> {
    match spec.result {
        ResultShape::Ack => Ok(Decoded::Ack),
        ResultShape::Scalars(paths) => {
            let frame = rpc_frame(spec, body)?;
            let values = paths.iter().map(|path| path.string(&frame)).collect::<Result<_, _>>()?;
            Ok(Decoded::Fields(values))
        }
        ResultShape::List { root, fields } => {
            let frame = rpc_frame(spec, body)?;
            decode_rows(&root, fields, &frame).map(Decoded::Rows)
        }
    }
}

fn decode_rows(
    root: &Path,
    fields: &[Path],
    frame: &JsonValue,
) -> Result<Vec<Vec<String>>, DecodeError> {
    let document = root.walk(frame)?;
    let depth = root.steps.len();
    let outer = as_array(&document).map_err(|fault| DecodeError::shape(root.field, depth, fault))?;

    // An absent or empty first element is how the service says "no entries".
    let entries = match outer.first() {
        None | Some(JsonValue::Null) => return Ok(Vec::new()),
        Some(JsonValue::Array(entries)) => entries,
        Some(other) => {
            return Err(DecodeError::shape(
                root.field,
                depth,
                ShapeFault::NotArray { found: kind(other) },
            ))
        }
    };

    entries
        .iter()
        .map(|entry| fields.iter().map(|path| path.string(entry)).collect::<Result<Vec<_>, _>>())
        .collect()
}

pub fn decode_enabled_item(body: &[u8]) -> Result<EnabledItem, DecodeError> {
    let spec = Operation::EnableUploadedItem.spec();
    let mut fields = expect_fields(spec, body)?.into_iter();
    match (fields.next(), fields.next()) {
        (Some(id), Some(url)) => Ok(EnabledItem { id, url }),
        _ => Err(DecodeError::NoResult { operation: spec.label }),
    }
}

pub fn decode_collections(body: &[u8]) -> Result<Vec<Collection>, DecodeError> {
    let spec = Operation::ListCollections.spec();
    let Decoded::Rows(rows) = decode(spec, body)? else {
        return Err(DecodeError::NoResult { operation: spec.label });
    };
    rows.into_iter()
        .map(|row| {
            let mut values = row.into_iter();
            match (values.next(), values.next()) {
                (Some(id), Some(name)) => Ok(Collection { id, name }),
                _ => Err(DecodeError::NoResult { operation: field::COLLECTION_LIST }),
            }
        })
        .collect()
}

pub fn decode_created_collection(body: &[u8]) -> Result<String, DecodeError> {
    let spec = Operation::CreateCollection.spec();
    expect_fields(spec, body)?
        .into_iter()
        .next()
        .ok_or(DecodeError::NoResult { operation: spec.label })
}

fn expect_fields(spec: &CommandSpec, body: &[u8]) -> Result<Vec<String>, DecodeError> {
    match decode(spec, body)? {
        Decoded::Fields(values) => Ok(values),
        _ => Err(DecodeError::NoResult { operation: spec.label }),
    }
}
