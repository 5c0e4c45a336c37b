use serde::{Deserialize, Serialize};

pub use gphoto_envelope::Collection;

/// A finalized upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    /// Set once the item is attached to a collection.
    pub collection_id: Option<String>,
    pub display_name: String,
    pub access_url: String,
}

impl Item {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, access_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            collection_id: None,
            display_name: display_name.into(),
            access_url: access_url.into(),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.collection_id.is_some()
    }
}
