//! Find-or-create over named collections, then attach.

use crate::error::ClientError;
use crate::types::{Collection, Item};

/// The remote operations the resolver drives.
pub trait CollectionBackend {
    fn list_collections(&mut self) -> Result<Vec<Collection>, ClientError>;

    /// Creates `name`, attaching `item_ids` in the same round trip. Returns
    /// the new collection's id.
    fn create_collection(&mut self, name: &str, item_ids: &[&str]) -> Result<String, ClientError>;

    fn attach(&mut self, collection_id: &str, item_id: &str) -> Result<(), ClientError>;

    /// The collection's share key, or `None` when it is not shared.
    fn share_key(&mut self, collection_id: &str) -> Result<Option<String>, ClientError>;

    fn attach_shared(
        &mut self,
        collection_id: &str,
        share_key: &str,
        item_id: &str,
    ) -> Result<(), ClientError>;
}

pub struct Resolver<'a, B: CollectionBackend + ?Sized> {
    backend: &'a mut B,
}

impl<'a, B: CollectionBackend + ?Sized> Resolver<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self { backend }
    }

    /// First collection called `name`, if any.
    pub fn find(&mut self, name: &str) -> Result<Option<Collection>, ClientError> {
        let collections = self.backend.list_collections()?;
        log::debug!("{} collections listed", collections.len());
        Ok(collections.into_iter().find(|collection| collection.name == name))
    }

    /// Returns the collection called `name`, creating an empty one if needed.
    pub fn find_or_create(&mut self, name: &str) -> Result<Collection, ClientError> {
        if let Some(existing) = self.find(name)? {
            return Ok(existing);
        }
        log::info!("creating collection {name}");
        let id = self.create(name, &[])?;
        Ok(Collection { id, name: name.to_owned() })
    }

    /// Attaches `item` to the collection called `name`.
    ///
    /// A missing collection is created with the item already in it. An
    /// existing one gets a separate attach; if that fails and the collection
    /// is shared, the shared attach is tried once.
    pub fn assign(&mut self, item: &mut Item, name: &str) -> Result<(), ClientError> {
        let collection_id = match self.find(name)? {
            Some(existing) => {
                log::info!("attaching item {} to collection {}", item.id, existing.id);
                self.attach_with_fallback(&existing.id, &item.id)?;
                existing.id
            }
            None => {
                log::info!("creating collection {name} with item {}", item.id);
                self.create(name, &[item.id.as_str()])?
            }
        };
        item.collection_id = Some(collection_id);
        Ok(())
    }

    fn create(&mut self, name: &str, item_ids: &[&str]) -> Result<String, ClientError> {
        self.backend.create_collection(name, item_ids).map_err(|source| {
            ClientError::ResourceNotFound { name: name.to_owned(), source: Box::new(source) }
        })
    }

    fn attach_with_fallback(&mut self, collection_id: &str, item_id: &str) -> Result<(), ClientError> {
        let first = match self.backend.attach(collection_id, item_id) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        match self.backend.share_key(collection_id) {
            Ok(Some(key)) => {
                log::warn!("attach to {collection_id} failed ({first}); retrying as shared");
                self.backend.attach_shared(collection_id, &key, item_id)
            }
            Ok(None) => Err(first),
            Err(lookup) => {
                log::debug!("share key lookup for {collection_id} failed: {lookup}");
                Err(first)
            }
        }
    }
}
