use gphoto_envelope::DecodeError;

/// Coarse failure classes callers branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    TokenUnavailable,
    TransportFailure,
    ProtocolShapeMismatch,
    ShortWrite,
    CopyFailure,
    ResourceNotFound,
    Config,
    Io,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClientError {
    #[error("session token unavailable: {reason}")]
    TokenUnavailable { reason: String },

    #[error("transport error: {url}: {message}")]
    Transport { url: String, message: String },

    #[error("http status {status} from {url}")]
    Status { url: String, status: u16, body: String },

    #[error("protocol shape mismatch: {0}")]
    ProtocolShapeMismatch(#[from] DecodeError),

    #[error("short write: {written} of {expected} bytes accepted")]
    ShortWrite { written: usize, expected: usize },

    #[error("upload copy failed: {message}")]
    CopyFailure { message: String },

    #[error("collection '{name}' not found and could not be created: {source}")]
    ResourceNotFound {
        name: String,
        #[source]
        source: Box<ClientError>,
    },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TokenUnavailable { .. } => ErrorKind::TokenUnavailable,
            Self::Transport { .. } | Self::Status { .. } => ErrorKind::TransportFailure,
            Self::ProtocolShapeMismatch(_) => ErrorKind::ProtocolShapeMismatch,
            Self::ShortWrite { .. } => ErrorKind::ShortWrite,
            Self::CopyFailure { .. } => ErrorKind::CopyFailure,
            Self::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::Config { .. } => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns `true` for transient errors that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn token_unavailable(reason: impl Into<String>) -> Self {
        Self::TokenUnavailable { reason: reason.into() }
    }

    pub fn copy_failure(message: impl Into<String>) -> Self {
        Self::CopyFailure { message: message.into() }
    }

    pub(crate) fn transport(url: &str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => Self::Status {
                url: url.to_owned(),
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => {
                Self::Transport { url: url.to_owned(), message: transport.to_string() }
            }
        }
    }
}
