//! Positional extraction from untyped response trees.
//!
//! The service never names list elements, so every field is reached through a
//! fixed sequence of [`Step`]s. A walk stops at the first step that does not
//! fit and reports the step index together with the logical field name.

use std::borrow::Cow;

use serde_json::Value as JsonValue;

use crate::error::{DecodeError, ShapeFault};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Element `n` of the current array.
    Index(usize),
    /// Member `key` of the current object.
    Key(&'static str),
    /// The current value is a string holding JSON; continue inside it.
    Reparse,
    /// Member `key` of the first object element of the current array that has it.
    ObjectWithKey(&'static str),
}

/// A named step sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Path {
    pub field: &'static str,
    pub steps: &'static [Step],
}

impl Path {
    pub const fn new(field: &'static str, steps: &'static [Step]) -> Self {
        Self { field, steps }
    }

    pub fn walk<'a>(&self, root: &'a JsonValue) -> Result<Cow<'a, JsonValue>, DecodeError> {
        let mut current = Cow::Borrowed(root);
        for (index, step) in self.steps.iter().enumerate() {
            current = match current {
                Cow::Borrowed(value) => apply(value, *step),
                Cow::Owned(value) => apply(&value, *step).map(|next| Cow::Owned(next.into_owned())),
            }
            .map_err(|fault| DecodeError::shape(self.field, index, fault))?;
        }
        Ok(current)
    }

    pub fn string(&self, root: &JsonValue) -> Result<String, DecodeError> {
        match self.walk(root)?.as_ref() {
            JsonValue::String(text) => Ok(text.clone()),
            other => Err(DecodeError::shape(
                self.field,
                self.steps.len(),
                ShapeFault::NotString { found: kind(other) },
            )),
        }
    }
}

fn apply(value: &JsonValue, step: Step) -> Result<Cow<'_, JsonValue>, ShapeFault> {
    match step {
        Step::Index(index) => {
            let items = as_array(value)?;
            items
                .get(index)
                .map(Cow::Borrowed)
                .ok_or(ShapeFault::IndexOutOfRange { index, len: items.len() })
        }
        Step::Key(key) => {
            let JsonValue::Object(map) = value else {
                return Err(ShapeFault::NotObject { found: kind(value) });
            };
            map.get(key)
                .map(Cow::Borrowed)
                .ok_or_else(|| ShapeFault::MissingKey { key: key.to_owned() })
        }
        Step::Reparse => {
            let JsonValue::String(text) = value else {
                return Err(ShapeFault::NotString { found: kind(value) });
            };
            serde_json::from_str(text)
                .map(Cow::Owned)
                .map_err(|err| ShapeFault::InvalidJson { message: err.to_string() })
        }
        Step::ObjectWithKey(key) => as_array(value)?
            .iter()
            .find_map(|item| item.as_object().and_then(|map| map.get(key)))
            .map(Cow::Borrowed)
            .ok_or_else(|| ShapeFault::NoObjectWithKey { key: key.to_owned() }),
    }
}

pub(crate) fn as_array(value: &JsonValue) -> Result<&Vec<JsonValue>, ShapeFault> {
    value.as_array().ok_or(ShapeFault::NotArray { found: kind(value) })
}

pub(crate) fn kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
