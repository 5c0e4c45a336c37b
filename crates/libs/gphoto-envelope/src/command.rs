//! The operation table: magic command ids, batch rpc ids, envelope kinds and
//! result paths for every remote operation the client issues.

use serde::{Deserialize, Serialize};

use crate::path::{Path, Step};

pub const ENABLE_UPLOADED_ITEM: u64 = 137_530_650;
pub const LIST_COLLECTIONS: u64 = 72_930_366;
pub const CREATE_COLLECTION: u64 = 79_956_622;
/// The service reuses the create id for adding items to an existing collection.
pub const ADD_TO_COLLECTION: u64 = 79_956_622;
pub const ADD_TO_SHARED_COLLECTION: u64 = 99_484_733;
pub const REMOVE_FROM_COLLECTION: u64 = 85_381_832;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    EnableUploadedItem,
    ListCollections,
    CreateCollection,
    AddToCollection,
    AddToSharedCollection,
    RemoveFromCollection,
}

/// Wrapper structure of one encoded command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Query,
    Mutate,
    /// `[[[rpcId, "<payload json>", null, "generic"]]]`
    Batch,
}

/// How the answer to an operation is laid out in the response tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultShape {
    /// The service answers with an acknowledgement only.
    Ack,
    /// One or more scalar strings, each behind its own path.
    Scalars(&'static [Path]),
    /// A possibly empty list reached through `root`; each entry then yields
    /// the fields behind `fields`.
    List { root: Path, fields: &'static [Path] },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub operation: Operation,
    pub id: u64,
    pub rpc_id: &'static str,
    pub kind: EnvelopeKind,
    pub label: &'static str,
    pub result: ResultShape,
}

/// Extraction labels, also used as the `field` of decode errors.
pub mod field {
    pub const ENABLED_ITEM_ID: &str = "enabled item id";
    pub const ENABLED_ITEM_URL: &str = "enabled item URL";
    pub const COLLECTION_LIST: &str = "collection list";
    pub const COLLECTION_ID: &str = "collection id";
    pub const COLLECTION_NAME: &str = "collection name";
    pub const CREATED_COLLECTION_ID: &str = "created collection id";
    pub const RPC_FRAME: &str = "rpc frame";
}

const ENABLE_FIELDS: &[Path] = &[
    Path::new(field::ENABLED_ITEM_ID, &[
        Step::Index(0),
        Step::Index(2),
        Step::Reparse,
        Step::Index(0),
        Step::Index(0),
        Step::Index(1),
        Step::Index(0),
    ]),
    Path::new(field::ENABLED_ITEM_URL, &[
        Step::Index(0),
        Step::Index(2),
        Step::Reparse,
        Step::Index(0),
        Step::Index(0),
        Step::Index(1),
        Step::Index(1),
        Step::Index(0),
    ]),
];

const COLLECTION_FIELDS: &[Path] = &[
    Path::new(field::COLLECTION_ID, &[Step::Index(0)]),
    Path::new(field::COLLECTION_NAME, &[
        Step::ObjectWithKey("72930366"),
        Step::Index(1),
    ]),
];

const CREATED_FIELDS: &[Path] = &[Path::new(field::CREATED_COLLECTION_ID, &[
    Step::Index(0),
    Step::Index(2),
    Step::Reparse,
    Step::Index(0),
    Step::Index(0),
])];

/// The single immutable lookup table, one row per operation.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        operation: Operation::EnableUploadedItem,
        id: ENABLE_UPLOADED_ITEM,
        rpc_id: "mdpdU",
        kind: EnvelopeKind::Query,
        label: "enable uploaded item",
        result: ResultShape::Scalars(ENABLE_FIELDS),
    },
    CommandSpec {
        operation: Operation::ListCollections,
        id: LIST_COLLECTIONS,
        rpc_id: "Z5xsfc",
        kind: EnvelopeKind::Query,
        label: "list collections",
        result: ResultShape::List {
            root: Path::new(field::COLLECTION_LIST, &[Step::Index(0), Step::Index(2), Step::Reparse]),
            fields: COLLECTION_FIELDS,
        },
    },
    CommandSpec {
        operation: Operation::CreateCollection,
        id: CREATE_COLLECTION,
        rpc_id: "OXvT9d",
        kind: EnvelopeKind::Mutate,
        label: "create collection",
        result: ResultShape::Scalars(CREATED_FIELDS),
    },
    CommandSpec {
        operation: Operation::AddToCollection,
        id: ADD_TO_COLLECTION,
        rpc_id: "E1Cajb",
        kind: EnvelopeKind::Mutate,
        label: "add item to collection",
        result: ResultShape::Ack,
    },
    CommandSpec {
        operation: Operation::AddToSharedCollection,
        id: ADD_TO_SHARED_COLLECTION,
        rpc_id: "C2V01c",
        kind: EnvelopeKind::Mutate,
        label: "add item to shared collection",
        result: ResultShape::Ack,
    },
    CommandSpec {
        operation: Operation::RemoveFromCollection,
        id: REMOVE_FROM_COLLECTION,
        rpc_id: "",
        kind: EnvelopeKind::Mutate,
        label: "remove item from collection",
        result: ResultShape::Ack,
    },
];

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::EnableUploadedItem,
        Operation::ListCollections,
        Operation::CreateCollection,
        Operation::AddToCollection,
        Operation::AddToSharedCollection,
        Operation::RemoveFromCollection,
    ];

    pub fn spec(self) -> &'static CommandSpec {
        // Rows are declared in `Operation::ALL` order.
        &COMMANDS[self as usize]
    }

    pub fn id(self) -> u64 {
        self.spec().id
    }
}

impl CommandSpec {
    /// Whether the batch wrapper can carry this operation.
    pub fn supports_batch(&self) -> bool {
        !self.rpc_id.is_empty()
    }
}
