use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const DEFAULT_SIMILARITY_PROMPT: &str = "
    Imagine you are shopping for fashion products in a fashion store.
    Your best friend tells you to buy something as close as possible to this item:

    {}.

    The shopping assistant proposes the following alternative:

    {}.

    Is this second product similar enough to the one suggested by your friend? Provide a yes/no answer.
";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GptSimilarityConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub similarity_prompt: String,
    pub timeout: Duration,
}

impl Default for GptSimilarityConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/completions".to_string(),
            api_key: None,
            model: "text-davinci-002".to_string(),
            temperature: 0.0,
            max_tokens: 10,
            similarity_prompt: DEFAULT_SIMILARITY_PROMPT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl GptSimilarityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_similarity_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.similarity_prompt = prompt.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Explicit key first, then `OPENAI_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| {
                std::env::var(OPENAI_API_KEY_ENV)
                    .ok()
                    .filter(|key| !key.is_empty())
            })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.is_empty() {
            return Err("API URL cannot be empty".to_string());
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err("API URL must start with http:// or https://".to_string());
        }

        if self.model.is_empty() {
            return Err("Model cannot be empty".to_string());
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("Temperature must be between 0.0 and 2.0".to_string());
        }

        if self.max_tokens == 0 {
            return Err("Max tokens must be greater than 0".to_string());
        }

        if self.similarity_prompt.matches("{}").count() != 2 {
            return Err("Similarity prompt must contain exactly two {} placeholders".to_string());
        }

        if self.timeout.is_zero() {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}
