use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::UNIX_EPOCH;

use gphoto_envelope::{decode_enabled_item, payload, strip_prefix, Operation};

use crate::collections::RemoteCollections;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::HttpContext;
use crate::resolver::{CollectionBackend, Resolver};
use crate::session::SessionContext;
use crate::token::{PageTokenSource, TokenSource};
use crate::transport::{Progress, Uploader};
use crate::types::{Collection, Item};
use crate::upload::{self, UploadHandle, UploadSession};

/// Upload and collection operations against one account.
///
/// Every operation takes `&mut self`: a client runs one top-level operation
/// at a time. Use separate clients for concurrent work.
#[derive(Debug)]
pub struct Client {
    config: ClientConfig,
    session: SessionContext,
}

impl Client {
    pub fn new(config: ClientConfig, source: Box<dyn TokenSource>) -> Result<Self, ClientError> {
        let http = HttpContext::new(&config);
        Self::with_http(config, http, source)
    }

    pub fn with_http(
        config: ClientConfig,
        http: HttpContext,
        source: Box<dyn TokenSource>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let session = SessionContext::new(http, config.endpoints.clone(), source);
        Ok(Self { config, session })
    }

    /// A client that reads its token from the home page using `cookie_header`.
    pub fn from_cookies(config: ClientConfig, cookie_header: &str) -> Result<Self, ClientError> {
        let http = HttpContext::new(&config).with_cookie_header(cookie_header);
        let source = PageTokenSource::new(config.endpoints.home.clone());
        Self::with_http(config, http, Box::new(source))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Discards the cached session token and acquires a fresh one.
    pub fn refresh_token(&mut self) -> Result<(), ClientError> {
        self.session.refresh_token().map(|_| ())
    }

    fn collections(&mut self) -> RemoteCollections<'_> {
        RemoteCollections::new(&mut self.session, self.config.wire)
    }

    pub fn list_collections(&mut self) -> Result<Vec<Collection>, ClientError> {
        self.collections().list_collections()
    }

    /// Creates `name` unconditionally, even if a collection by that name exists.
    pub fn create_collection(&mut self, name: &str) -> Result<Collection, ClientError> {
        log::info!("creating collection {name}");
        let id = self.collections().create_collection(name, &[])?;
        Ok(Collection { id, name: name.to_owned() })
    }

    pub fn find_or_create_collection(&mut self, name: &str) -> Result<Collection, ClientError> {
        Resolver::new(&mut self.collections()).find_or_create(name)
    }

    pub fn add_to_collection(&mut self, collection_id: &str, item_id: &str) -> Result<(), ClientError> {
        log::info!("adding item {item_id} to collection {collection_id}");
        self.collections().attach(collection_id, item_id)
    }

    pub fn remove_from_collection(&mut self, item_id: &str) -> Result<(), ClientError> {
        self.collections().remove(item_id)
    }

    /// Uploads the file at `path` and files it under `collection`.
    ///
    /// `display_name` defaults to the file's base name and `collection` to
    /// the configured default collection.
    pub fn upload(
        &mut self,
        path: &Path,
        display_name: Option<&str>,
        collection: Option<&str>,
        progress: Option<Progress<'_>>,
    ) -> Result<Item, ClientError> {
        log::info!("uploading {}", path.display());
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        let modified_ms = metadata
            .modified()
            .ok()
            .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
            .map(|since| i64::try_from(since.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or_default();
        let name = match display_name {
            Some(name) => name.to_owned(),
            None => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("{} has no file name", path.display()),
                    )
                })?,
        };
        self.upload_reader(file, metadata.len(), &name, modified_ms, collection, progress)
    }

    /// Uploads exactly `size` bytes from `reader`.
    ///
    /// Fails as a whole on the first failing step. Bytes already on the
    /// server are not cleaned up.
    pub fn upload_reader<R: Read + Send>(
        &mut self,
        reader: R,
        size: u64,
        display_name: &str,
        modified_ms: i64,
        collection: Option<&str>,
        progress: Option<Progress<'_>>,
    ) -> Result<Item, ClientError> {
        let collection = collection.unwrap_or(self.config.default_collection.as_str()).to_owned();

        logged("session token", self.session.ensure_token().map(|_| ()))?;
        let session = logged("upload session", self.create_upload_session(display_name, size))?;
        let handle = logged("byte transfer", self.transfer(&session, reader, progress))?;
        let mut item = logged("finalize", self.finalize(&handle, display_name, modified_ms))?;
        logged("collection assignment", self.assign(&mut item, &collection))?;

        log::info!("uploaded {display_name} as {} in collection {collection}", item.id);
        Ok(item)
    }

    pub fn create_upload_session(&mut self, file_name: &str, size: u64) -> Result<UploadSession, ClientError> {
        log::info!("creating upload session for {file_name} ({size} bytes)");
        let url = self.session.endpoints().upload_session.clone();
        let session = upload::create_session(self.session.http(), &url, file_name, size)?;
        log::debug!("upload session put URL {}", session.put_url);
        Ok(session)
    }

    /// Streams the bytes of one upload session and returns its completion
    /// handle.
    pub fn transfer<R: Read + Send>(
        &self,
        session: &UploadSession,
        reader: R,
        progress: Option<Progress<'_>>,
    ) -> Result<UploadHandle, ClientError> {
        log::info!("transferring {} bytes", session.size_bytes);
        let uploader =
            Uploader::new(self.session.http(), self.config.chunk_size, self.config.pipe_capacity);
        let response = uploader.transfer(&session.put_url, reader, session.size_bytes, progress)?;
        upload::handle_from_body(&session.put_url, &response.body)
    }

    /// Turns a transferred upload into a library item.
    pub fn finalize(
        &mut self,
        handle: &UploadHandle,
        display_name: &str,
        modified_ms: i64,
    ) -> Result<Item, ClientError> {
        log::info!("finalizing upload of {display_name}");
        let body = self.collections().call(
            Operation::EnableUploadedItem,
            payload::enable_uploaded_item(handle.as_str(), display_name, modified_ms),
        )?;
        let enabled = decode_enabled_item(strip_prefix(&body)?)?;
        log::debug!("enabled item {} at {}", enabled.id, enabled.url);
        Ok(Item::new(enabled.id, display_name, enabled.url))
    }

    /// Attaches `item` to the collection called `name`, creating it if absent.
    pub fn assign(&mut self, item: &mut Item, name: &str) -> Result<(), ClientError> {
        Resolver::new(&mut self.collections()).assign(item, name)
    }
}

fn logged<T>(step: &str, result: Result<T, ClientError>) -> Result<T, ClientError> {
    result.map_err(|err| {
        log::error!("upload failed at {step}: {err}");
        err
    })
}
