//! Client for the photo service's browser-facing upload and RPC endpoints.
//!
//! [`Client`] drives the full upload: it obtains a session token, opens an
//! upload session, streams the bytes through a bounded pipe with progress
//! reporting, finalizes the upload into an [`Item`] and files it under a named
//! collection, creating the collection when it does not exist yet.

pub mod client;
pub mod collections;
pub mod config;
pub mod error;
pub mod http;
pub mod pipe;
pub mod resolver;
pub mod session;
pub mod token;
pub mod transport;
pub mod types;
pub mod upload;

pub use client::Client;
pub use config::{ClientConfig, Endpoints, WireFormat};
pub use error::{ClientError, ErrorKind};
pub use http::HttpContext;
pub use resolver::{CollectionBackend, Resolver};
pub use session::SessionContext;
pub use token::{PageTokenSource, SessionToken, StaticToken, TokenSource};
pub use transport::{copy_with_progress, Progress, TransferResponse, Uploader};
pub use types::{Collection, Item};
pub use upload::{UploadHandle, UploadSession};
