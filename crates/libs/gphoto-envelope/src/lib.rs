//! Wire codec for the photo service's internal RPC protocol.
//!
//! The protocol is positional and schema-less: requests wrap a generic JSON
//! payload in one of a few fixed envelopes, and answers sit at hard-coded
//! paths inside nested arrays, often behind JSON embedded in strings. This
//! crate does no I/O.
//!
//! - [`command`]: the operation table (magic ids, envelope kinds, result paths)
//! - [`envelope`]: request encoding
//! - [`payload`]: payload trees per operation
//! - [`path`]: the positional walker
//! - [`response`]: prefix stripping, framing and typed decoders

pub mod command;
pub mod envelope;
pub mod error;
pub mod path;
pub mod payload;
pub mod response;

pub use command::{CommandSpec, EnvelopeKind, Operation, ResultShape, COMMANDS};
pub use envelope::{encode, encode_batch, encode_mutate, encode_query};
pub use error::{DecodeError, ShapeFault};
pub use path::{Path, Step};
pub use response::{
    decode, decode_collections, decode_created_collection, decode_enabled_item, parse_frame,
    rpc_frame, strip_prefix, Collection, Decoded, EnabledItem,
};
