/// What went wrong at a single step of a positional walk.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ShapeFault {
    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("expected array, found {found}")]
    NotArray { found: &'static str },

    #[error("expected object, found {found}")]
    NotObject { found: &'static str },

    #[error("expected string, found {found}")]
    NotString { found: &'static str },

    #[error("missing key '{key}'")]
    MissingKey { key: String },

    #[error("no object element carries key '{key}'")]
    NoObjectWithKey { key: String },

    #[error("embedded JSON is invalid: {message}")]
    InvalidJson { message: String },

    #[error("frame answers rpc '{found}', expected '{expected}'")]
    WrongRpc { expected: &'static str, found: String },
}

/// A response did not have the shape the decoder expected.
///
/// Every variant names the logical extraction that failed so a change in the
/// service's undocumented format can be traced to one decode path.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("response is missing the anti-XSSI prefix")]
    MissingPrefix,

    #[error("response body holds no JSON array: {message}")]
    NoFrame { message: String },

    #[error("cannot extract {field}: step {step}: {fault}")]
    Shape { field: &'static str, step: usize, fault: ShapeFault },

    #[error("operation {operation} has no decodable result")]
    NoResult { operation: &'static str },
}

impl DecodeError {
    pub fn shape(field: &'static str, step: usize, fault: ShapeFault) -> Self {
        Self::Shape { field, step, fault }
    }

    /// The logical field whose extraction failed, if the failure was a path fault.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Shape { field, .. } => Some(field),
            _ => None,
        }
    }
}
