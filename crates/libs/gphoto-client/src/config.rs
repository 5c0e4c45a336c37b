use std::fs;
use std::path::Path;
use std::time::Duration;

use gphoto_envelope::EnvelopeKind;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.100 Safari/537.36";
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;
pub const DEFAULT_PIPE_CAPACITY: usize = 8;
pub const DEFAULT_COLLECTION: &str = "DefaultAlbum";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub home: String,
    pub upload_session: String,
    pub batch: String,
    pub query: String,
    pub mutate: String,
    pub album_page: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            home: "https://photos.google.com".into(),
            upload_session:
                "https://photos.google.com/_/upload/uploadmedia/rupio/interactive?authuser=0".into(),
            batch: "https://photos.google.com/_/PhotosUi/data/batchexecute?f.sid=0&bl=boq_photosuiserver_20180711.03_p0&hl=en&soc-app=165&soc-platform=1&soc-device=1&_reqid=785335&rt=c".into(),
            query: "https://photos.google.com/_/PhotosUi/data".into(),
            mutate: "https://photos.google.com/_/PhotosUi/mutate".into(),
            album_page: "https://photos.google.com/u/0/album".into(),
        }
    }
}

impl Endpoints {
    /// Points every endpoint at `base`, keeping the service's paths.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            home: base.to_owned(),
            upload_session: format!("{base}/_/upload/uploadmedia/rupio/interactive?authuser=0"),
            batch: format!("{base}/_/PhotosUi/data/batchexecute?rt=c"),
            query: format!("{base}/_/PhotosUi/data"),
            mutate: format!("{base}/_/PhotosUi/mutate"),
            album_page: format!("{base}/u/0/album"),
        }
    }

    pub fn for_envelope(&self, kind: EnvelopeKind, rpc_id: &str) -> String {
        match kind {
            EnvelopeKind::Query => self.query.clone(),
            EnvelopeKind::Mutate => self.mutate.clone(),
            EnvelopeKind::Batch => format!("{}&rpcids={rpc_id}", self.batch),
        }
    }

    pub fn album(&self, collection_id: &str) -> String {
        format!("{}/{collection_id}", self.album_page.trim_end_matches('/'))
    }
}

/// Which request wrapper the client speaks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// Numeric query/mutate envelopes.
    Numeric,
    /// `batchexecute` envelopes keyed by rpc id. Remove always goes out as
    /// a mutate envelope.
    #[default]
    Batch,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    pub user_agent: String,
    pub chunk_size: usize,
    pub pipe_capacity: usize,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub default_collection: String,
    pub wire: WireFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            user_agent: DEFAULT_USER_AGENT.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
            connect_timeout_secs: 10,
            read_timeout_secs: 60,
            write_timeout_secs: 60,
            default_collection: DEFAULT_COLLECTION.into(),
            wire: WireFormat::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml(input: &str) -> Result<Self, ClientError> {
        let config: Self =
            toml::from_str(input).map_err(|err| ClientError::Config { message: err.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.chunk_size == 0 {
            return Err(ClientError::Config { message: "chunk_size must be positive".into() });
        }
        if self.pipe_capacity == 0 {
            return Err(ClientError::Config { message: "pipe_capacity must be positive".into() });
        }
        if self.default_collection.trim().is_empty() {
            return Err(ClientError::Config {
                message: "default_collection must not be empty".into(),
            });
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}
