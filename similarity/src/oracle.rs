use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimilarityError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Similarity API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed completion: {message}")]
    MalformedResponse { message: String },

    #[error("Unknown item: {key}")]
    UnknownItem { key: String },

    #[error("{model} does not support {operation}")]
    Unsupported {
        model: &'static str,
        operation: &'static str,
    },
}

pub type SimilarityResult<T> = Result<T, SimilarityError>;

/// Judges how close two catalog records are.
///
/// Records are free-form JSON: a bare identifier, or an object of product
/// attributes. Implementations decide which part of the record they read.
pub trait SimilarityModel: Send + Sync {
    /// Whether `target` is similar enough to stand in for `query`.
    fn similarity_binary(&self, query: &Value, target: &Value) -> SimilarityResult<bool>;

    /// Continuous similarity score, higher is closer.
    fn similarity_gradient(&self, query: &Value, target: &Value) -> SimilarityResult<f64>;

    fn model_name(&self) -> &'static str;
}
