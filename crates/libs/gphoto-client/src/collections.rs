//! The remote side of the resolver: collection commands executed through a
//! session.

use gphoto_envelope::{
    decode_collections, decode_created_collection, encode, payload, strip_prefix, EnvelopeKind,
    Operation,
};
use serde_json::Value as JsonValue;

use crate::config::WireFormat;
use crate::error::ClientError;
use crate::resolver::CollectionBackend;
use crate::session::SessionContext;
use crate::types::Collection;

pub struct RemoteCollections<'a> {
    session: &'a mut SessionContext,
    wire: WireFormat,
}

impl<'a> RemoteCollections<'a> {
    pub fn new(session: &'a mut SessionContext, wire: WireFormat) -> Self {
        Self { session, wire }
    }

    /// Envelope kind `operation` travels in under the configured wire format.
    pub fn envelope_kind(&self, operation: Operation) -> EnvelopeKind {
        let spec = operation.spec();
        match self.wire {
            WireFormat::Batch if spec.supports_batch() => EnvelopeKind::Batch,
            _ => spec.kind,
        }
    }

    /// Encodes and executes one command, returning the raw body.
    pub fn call(&mut self, operation: Operation, payload: JsonValue) -> Result<Vec<u8>, ClientError> {
        let spec = operation.spec();
        let kind = self.envelope_kind(operation);
        let envelope = encode(spec, kind, payload);
        let endpoint = self.session.endpoints().for_envelope(kind, spec.rpc_id);
        log::debug!("{} as {kind:?} envelope", spec.label);
        self.session.execute(&endpoint, &envelope)
    }

    pub fn remove(&mut self, item_id: &str) -> Result<(), ClientError> {
        log::info!("removing item {item_id} from its collection");
        self.call(Operation::RemoveFromCollection, payload::remove_from_collection(item_id))?;
        Ok(())
    }
}

impl CollectionBackend for RemoteCollections<'_> {
    fn list_collections(&mut self) -> Result<Vec<Collection>, ClientError> {
        log::info!("listing collections");
        let body = self.call(Operation::ListCollections, payload::list_collections())?;
        Ok(decode_collections(strip_prefix(&body)?)?)
    }

    fn create_collection(&mut self, name: &str, item_ids: &[&str]) -> Result<String, ClientError> {
        let body =
            self.call(Operation::CreateCollection, payload::create_collection(name, item_ids))?;
        let id = decode_created_collection(strip_prefix(&body)?)?;
        log::debug!("created collection {name} as {id}");
        Ok(id)
    }

    fn attach(&mut self, collection_id: &str, item_id: &str) -> Result<(), ClientError> {
        self.call(Operation::AddToCollection, payload::add_to_collection(collection_id, item_id))?;
        Ok(())
    }

    fn share_key(&mut self, collection_id: &str) -> Result<Option<String>, ClientError> {
        let url = self.session.endpoints().album(collection_id);
        let page = self.session.http().get_text(&url)?;
        Ok(share_key_from_page(&page))
    }

    fn attach_shared(
        &mut self,
        collection_id: &str,
        share_key: &str,
        item_id: &str,
    ) -> Result<(), ClientError> {
        self.call(
            Operation::AddToSharedCollection,
            payload::add_to_shared_collection(collection_id, share_key, item_id),
        )?;
        Ok(())
    }
}

/// Reads the `key` query parameter from an album page's
/// `<meta http-equiv="refresh">` redirect.
pub fn share_key_from_page(page: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets, so matches index into `page`.
    let lower = page.to_ascii_lowercase();
    lower.match_indices("<meta").find_map(|(start, _)| {
        let end = start + lower[start..].find('>')?;
        let attributes = parse_attributes(&page[start + "<meta".len()..end]);
        let refresh = attributes.iter().any(|(name, value)| {
            name.eq_ignore_ascii_case("http-equiv") && value.eq_ignore_ascii_case("refresh")
        });
        if !refresh {
            return None;
        }
        attributes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content"))
            .and_then(|(_, content)| key_from_refresh(content))
    })
}

/// Quoted `name="value"` pairs of one tag body. Unquoted values are skipped.
fn parse_attributes(tag: &str) -> Vec<(&str, &str)> {
    let mut attributes = Vec::new();
    let mut rest = tag;
    while let Some(eq) = rest.find('=') {
        let name = rest[..eq].split_whitespace().last().unwrap_or_default();
        let after = rest[eq + 1..].trim_start();
        let Some(quote) = after.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            rest = &rest[eq + 1..];
            continue;
        };
        let Some(close) = after[1..].find(quote) else {
            break;
        };
        attributes.push((name, &after[1..1 + close]));
        rest = &after[close + 2..];
    }
    attributes
}

fn key_from_refresh(content: &str) -> Option<String> {
    let content = content.replace("&amp;", "&");
    let (_, target) = content.split_once(';')?;
    let (_, query) = target.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == "key")
        .map(|(_, value)| value.to_owned())
        .filter(|value| !value.is_empty())
}
