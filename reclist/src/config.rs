use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable overriding the metadata folder.
pub const META_DATA_FOLDER_ENV: &str = "RECLIST_META_DATA_FOLDER";

pub const DEFAULT_META_DATA_FOLDER: &str = ".reclist";

/// Setting holding the bucket used by the S3 artifact store.
pub const S3_BUCKET: &str = "S3_BUCKET";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing setting {key}: pass it explicitly or set the {key} environment variable")]
    MissingSetting { key: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Unknown backend label: {label}")]
    UnknownBackend { label: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Experiment-tracking backend receiving live results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LoggerKind {
    /// Print results to the console
    #[default]
    Local,
    Comet,
    Neptune,
}

/// Backend persisting reports and plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Local filesystem
    #[default]
    Local,
    S3,
}

impl fmt::Display for LoggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerKind::Local => write!(f, "local"),
            LoggerKind::Comet => write!(f, "comet"),
            LoggerKind::Neptune => write!(f, "neptune"),
        }
    }
}

impl FromStr for LoggerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(LoggerKind::Local),
            "comet" => Ok(LoggerKind::Comet),
            "neptune" => Ok(LoggerKind::Neptune),
            _ => Err(ConfigError::UnknownBackend {
                label: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Local => write!(f, "local"),
            StoreKind::S3 => write!(f, "s3"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(StoreKind::Local),
            "s3" => Ok(StoreKind::S3),
            _ => Err(ConfigError::UnknownBackend {
                label: s.to_string(),
            }),
        }
    }
}

/// Free-form backend settings (credentials, project names, buckets).
///
/// Lookups try the explicit value first and fall back on the environment
/// variable of the same name. Empty values count as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendConfig {
    values: BTreeMap<String, String>,
}

impl BackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// The explicitly supplied value, ignoring the environment.
    pub fn explicit(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.explicit(key).map(str::to_string).or_else(|| {
            std::env::var(key)
                .ok()
                .filter(|value| !value.is_empty())
        })
    }

    pub fn require(&self, key: &str) -> ConfigResult<String> {
        self.get(key).ok_or_else(|| ConfigError::MissingSetting {
            key: key.to_string(),
        })
    }

    pub fn get_bool(&self, key: &str, default: bool) -> ConfigResult<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: format!("expected a boolean, got '{}'", value),
                }),
            },
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }
}

/// How a suite run is wired: backends, storage folder, verbosity, settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecListConfig {
    pub logger: LoggerKind,
    pub metadata_store: StoreKind,
    /// Root folder of run outputs, relative to the store root
    pub metadata_folder: PathBuf,
    /// Print the summary table after the tests ran
    pub verbose: bool,
    pub settings: BackendConfig,
}

impl Default for RecListConfig {
    fn default() -> Self {
        Self {
            logger: LoggerKind::default(),
            metadata_store: StoreKind::default(),
            metadata_folder: default_metadata_folder(),
            verbose: true,
            settings: BackendConfig::default(),
        }
    }
}

fn default_metadata_folder() -> PathBuf {
    std::env::var(META_DATA_FOLDER_ENV)
        .ok()
        .filter(|folder| !folder.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_META_DATA_FOLDER))
}

impl RecListConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger(mut self, logger: LoggerKind) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_metadata_store(mut self, metadata_store: StoreKind) -> Self {
        self.metadata_store = metadata_store;
        self
    }

    pub fn with_metadata_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.metadata_folder = folder.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.set(key, value);
        self
    }

    pub fn with_bucket(self, bucket: impl Into<String>) -> Self {
        self.with_setting(S3_BUCKET, bucket)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.metadata_folder.as_os_str().is_empty() {
            return Err("Metadata folder cannot be empty".to_string());
        }

        if self.metadata_folder.is_absolute() && self.metadata_store == StoreKind::S3 {
            return Err("Metadata folder must be relative when storing on S3".to_string());
        }

        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }
}
