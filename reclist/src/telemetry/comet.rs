use super::{chart_tempfile, check_response, TelemetryResult, TelemetrySink};
use crate::chart::Chart;
use crate::config::{BackendConfig, ConfigResult};
use crate::record::TestOutcome;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_COMET_URL: &str = "https://www.comet.com/api/rest/v2";

const SERVICE: &str = "comet";

#[derive(Clone)]
pub struct CometConfig {
    pub api_key: String,
    pub project_name: String,
    pub workspace: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for CometConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CometConfig")
            .field("project_name", &self.project_name)
            .field("workspace", &self.workspace)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CometConfig {
    /// Read `COMET_KEY`, `COMET_PROJECT_NAME`, `COMET_WORKSPACE` and the
    /// optional `COMET_URL_OVERRIDE`.
    pub fn from_settings(settings: &BackendConfig) -> ConfigResult<Self> {
        Ok(Self {
            api_key: settings.require("COMET_KEY")?,
            project_name: settings.require("COMET_PROJECT_NAME")?,
            workspace: settings.require("COMET_WORKSPACE")?,
            base_url: settings
                .get("COMET_URL_OVERRIDE")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_COMET_URL.to_string()),
            timeout: Duration::from_secs(30),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/write/experiment/{}", self.base_url, path)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateExperimentRequest<'a> {
    workspace_name: &'a str,
    project_name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateExperimentResponse {
    experiment_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LogMetricRequest<'a> {
    experiment_key: &'a str,
    metric_name: &'a str,
    metric_value: f64,
    timestamp: i64,
}

/// Logs scalars and charts to a Comet experiment created at construction.
pub struct CometSink {
    client: reqwest::blocking::Client,
    config: CometConfig,
    experiment_key: String,
}

impl CometSink {
    pub fn new(config: CometConfig) -> TelemetryResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let response = client
            .post(config.endpoint("create"))
            .header("Authorization", &config.api_key)
            .json(&CreateExperimentRequest {
                workspace_name: &config.workspace,
                project_name: &config.project_name,
            })
            .send()?;
        let created: CreateExperimentResponse = check_response(SERVICE, response)?.json()?;

        info!(
            "Created Comet experiment {} in {}/{}",
            created.experiment_key, config.workspace, config.project_name
        );

        Ok(Self {
            client,
            config,
            experiment_key: created.experiment_key,
        })
    }

    pub fn experiment_key(&self) -> &str {
        &self.experiment_key
    }
}

impl TelemetrySink for CometSink {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn write(&self, label: &str, value: &TestOutcome) -> TelemetryResult<()> {
        let Some(metric_value) = value.as_scalar() else {
            debug!("Comet only logs scalars; skipping {} ({})", label, value.shape());
            return Ok(());
        };

        let response = self
            .client
            .post(self.config.endpoint("metric"))
            .header("Authorization", &self.config.api_key)
            .json(&LogMetricRequest {
                experiment_key: &self.experiment_key,
                metric_name: label,
                metric_value,
                timestamp: chrono::Utc::now().timestamp_millis(),
            })
            .send()?;
        check_response(SERVICE, response)?;
        Ok(())
    }

    fn save_plot(&self, name: &str, chart: &Chart) -> TelemetryResult<()> {
        let file = chart_tempfile(chart)?;
        let form = reqwest::blocking::multipart::Form::new().file("file", file.path())?;

        let response = self
            .client
            .post(self.config.endpoint("image"))
            .header("Authorization", &self.config.api_key)
            .query(&[
                ("experimentKey", self.experiment_key.as_str()),
                ("imageName", name),
            ])
            .multipart(form)
            .send()?;
        check_response(SERVICE, response)?;

        debug!("Uploaded chart {} to Comet", name);
        Ok(())
    }
}
