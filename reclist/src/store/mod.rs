//! Artifact stores: where reports and plots of a run are persisted.

pub mod local;
pub mod s3;

use crate::config::{BackendConfig, ConfigError, StoreKind};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub use local::LocalStore;
pub use s3::{AwsCredentials, S3Store};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Object store returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("Request signing failed: {0}")]
    Signing(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Content handed to a store.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// Bytes written as-is
    Raw(Vec<u8>),
    /// JSON data; each store picks its own encoding
    Structured(serde_json::Value),
}

impl Artifact {
    pub fn text(text: impl Into<String>) -> Self {
        Artifact::Raw(text.into().into_bytes())
    }
}

pub trait ArtifactStore: Send + Sync {
    fn kind(&self) -> StoreKind;

    /// Root under which run folders are created.
    fn resolve_root(&self, metadata_folder: &Path) -> PathBuf;

    /// Create the sub-folders of a run, if the store needs them.
    fn prepare_run(&self, run_path: &Path) -> StorageResult<()>;

    fn write_file(&self, path: &Path, artifact: &Artifact) -> StorageResult<()>;
}

/// Sub-folders of every run.
pub const RUN_FOLDERS: [&str; 3] = ["artifacts", "results", "plots"];

/// Instantiate the store registered under `kind`.
pub fn store_factory(
    kind: StoreKind,
    settings: &BackendConfig,
) -> StorageResult<Box<dyn ArtifactStore>> {
    info!("Using {} artifact store", kind);
    match kind {
        StoreKind::Local => Ok(Box::new(LocalStore::new())),
        StoreKind::S3 => Ok(Box::new(S3Store::from_settings(settings)?)),
    }
}
