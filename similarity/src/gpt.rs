use crate::config::GptSimilarityConfig;
use crate::oracle::{SimilarityError, SimilarityModel, SimilarityResult};
use crate::record::describe_record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// OpenAI-compatible completion request
#[derive(Debug, Clone, Serialize)]
struct CompletionRequest {
    model: String,
    prompt: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// Asks a completion model whether two products are interchangeable.
///
/// Only a yes/no judgement is available; there is no continuous score.
pub struct GptSimilarity {
    client: reqwest::blocking::Client,
    api_key: String,
    config: GptSimilarityConfig,
    verbose: bool,
}

impl GptSimilarity {
    pub fn new(config: GptSimilarityConfig) -> SimilarityResult<Self> {
        config
            .validate()
            .map_err(|message| SimilarityError::InvalidConfig { message })?;

        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| SimilarityError::InvalidConfig {
                message: format!(
                    "missing API key: pass one explicitly or set {}",
                    crate::config::OPENAI_API_KEY_ENV
                ),
            })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            config,
            verbose: false,
        })
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn config(&self) -> &GptSimilarityConfig {
        &self.config
    }

    fn build_prompt(&self, query: &Value, target: &Value) -> String {
        fill_prompt(
            &self.config.similarity_prompt,
            &describe_record(query),
            &describe_record(target),
        )
    }

    fn build_request_body(&self, prompt: String) -> CompletionRequest {
        CompletionRequest {
            model: self.config.model.clone(),
            prompt,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

/// Substitute the two `{}` slots of `template` in order, then trim.
fn fill_prompt(template: &str, first: &str, second: &str) -> String {
    let mut parts = template.splitn(3, "{}");
    let head = parts.next().unwrap_or_default();
    let middle = parts.next().unwrap_or_default();
    let tail = parts.next().unwrap_or_default();
    format!("{}{}{}{}{}", head, first, middle, second, tail)
        .trim()
        .to_string()
}

/// A completion counts as a match when the text before its first space,
/// once trimmed and lowercased, is exactly "yes". Trailing punctuation or a
/// line break glued to the word makes it a different word.
fn is_affirmative(completion: &str) -> bool {
    completion
        .trim()
        .split(' ')
        .next()
        .map(|word| word.to_lowercase() == "yes")
        .unwrap_or(false)
}

impl SimilarityModel for GptSimilarity {
    fn similarity_binary(&self, query: &Value, target: &Value) -> SimilarityResult<bool> {
        let prompt = self.build_prompt(query, target);
        let body = self.build_request_body(prompt.clone());

        debug!("Requesting similarity judgement from {}", self.config.model);

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SimilarityError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json()?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| SimilarityError::MalformedResponse {
                message: "completion has no choices".to_string(),
            })?;

        if self.verbose {
            info!("Query: {}", describe_record(query));
            info!("Target: {}", describe_record(target));
            info!("Prompt: {}", prompt);
            info!("Completion: {}", text);
        }

        Ok(is_affirmative(&text))
    }

    fn similarity_gradient(&self, _query: &Value, _target: &Value) -> SimilarityResult<f64> {
        Err(SimilarityError::Unsupported {
            model: "gpt",
            operation: "similarity_gradient",
        })
    }

    fn model_name(&self) -> &'static str {
        "gpt"
    }
}
