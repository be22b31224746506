use super::{
    chart_tempfile, check_response, TelemetryError, TelemetryResult, TelemetrySink,
};
use crate::chart::Chart;
use crate::config::{BackendConfig, ConfigError, ConfigResult};
use crate::record::TestOutcome;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

const SERVICE: &str = "neptune";

/// Payload carried (base64 encoded) inside a Neptune API token.
#[derive(Debug, Deserialize)]
struct TokenPayload {
    api_address: String,
}

#[derive(Clone)]
pub struct NeptuneConfig {
    pub api_token: String,
    /// `workspace/project`
    pub project: String,
    /// Server address decoded from the token
    pub api_address: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for NeptuneConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeptuneConfig")
            .field("project", &self.project)
            .field("api_address", &self.api_address)
            .finish_non_exhaustive()
    }
}

impl NeptuneConfig {
    /// Read `NEPTUNE_KEY` and `NEPTUNE_PROJECT_NAME`.
    pub fn from_settings(settings: &BackendConfig) -> ConfigResult<Self> {
        let api_token = settings.require("NEPTUNE_KEY")?;
        let project = settings.require("NEPTUNE_PROJECT_NAME")?;
        let api_address = decode_api_address(&api_token)?;

        Ok(Self {
            api_token,
            project,
            api_address,
            timeout: Duration::from_secs(30),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_address, path)
    }
}

fn decode_api_address(token: &str) -> ConfigResult<String> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        key: "NEPTUNE_KEY".to_string(),
        reason,
    };

    let bytes = STANDARD
        .decode(token.trim())
        .map_err(|e| invalid(format!("not base64: {}", e)))?;
    let payload: TokenPayload = serde_json::from_slice(&bytes)
        .map_err(|e| invalid(format!("unexpected token payload: {}", e)))?;

    Ok(payload.api_address.trim_end_matches('/').to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRunRequest<'a> {
    project_identifier: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    custom_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateRunResponse {
    id: String,
}

fn assign_float(path: &str, value: f64) -> serde_json::Value {
    json!([{ "path": path, "assignFloat": { "value": value } }])
}

/// Logs scalars and charts to a Neptune run created at construction.
pub struct NeptuneSink {
    client: reqwest::blocking::Client,
    config: NeptuneConfig,
    access_token: String,
    run_id: String,
}

impl NeptuneSink {
    pub fn new(config: NeptuneConfig) -> TelemetryResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let response = client
            .get(config.url("/api/backend/v1/authorization/oauth-token"))
            .header("X-Neptune-Api-Token", &config.api_token)
            .send()?;
        let token: AccessTokenResponse = check_response(SERVICE, response)?.json()?;

        let response = client
            .post(config.url("/api/leaderboard/v1/experiments"))
            .bearer_auth(&token.access_token)
            .json(&CreateRunRequest {
                project_identifier: &config.project,
                kind: "run",
                custom_id: uuid::Uuid::new_v4().to_string(),
            })
            .send()?;
        let run: CreateRunResponse = check_response(SERVICE, response)?.json()?;

        if run.id.is_empty() {
            return Err(TelemetryError::MalformedResponse {
                service: SERVICE,
                message: "run created without an id".to_string(),
            });
        }

        info!("Created Neptune run {} in {}", run.id, config.project);

        Ok(Self {
            client,
            config,
            access_token: token.access_token,
            run_id: run.id,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

impl TelemetrySink for NeptuneSink {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn write(&self, label: &str, value: &TestOutcome) -> TelemetryResult<()> {
        let Some(value) = value.as_scalar() else {
            debug!("Neptune only logs scalars; skipping {}", label);
            return Ok(());
        };

        let response = self
            .client
            .post(self.config.url("/api/leaderboard/v1/attributes/operations"))
            .bearer_auth(&self.access_token)
            .query(&[("experimentId", self.run_id.as_str())])
            .json(&assign_float(label, value))
            .send()?;
        check_response(SERVICE, response)?;
        Ok(())
    }

    fn save_plot(&self, name: &str, chart: &Chart) -> TelemetryResult<()> {
        let file = chart_tempfile(chart)?;
        let form = reqwest::blocking::multipart::Form::new().file("file", file.path())?;

        let response = self
            .client
            .post(self.config.url("/api/leaderboard/v1/attributes/storage/file/upload"))
            .bearer_auth(&self.access_token)
            .query(&[
                ("experimentIdentity", self.run_id.as_str()),
                ("attribute", name),
                ("ext", "svg"),
            ])
            .multipart(form)
            .send()?;
        check_response(SERVICE, response)?;

        debug!("Uploaded chart {} to Neptune", name);
        Ok(())
    }
}
