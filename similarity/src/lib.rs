pub mod config;
pub mod gpt;
pub mod oracle;
pub mod record;
pub mod skipgram;

pub use config::{GptSimilarityConfig, DEFAULT_SIMILARITY_PROMPT, OPENAI_API_KEY_ENV};
pub use gpt::GptSimilarity;
pub use oracle::{SimilarityError, SimilarityModel, SimilarityResult};
pub use record::{describe_record, record_key};
pub use skipgram::{SkipGramSimilarity, DEFAULT_SIMILARITY_THRESHOLD};

pub mod prelude {
    pub use crate::config::*;
    pub use crate::gpt::*;
    pub use crate::oracle::*;
    pub use crate::skipgram::*;
}
