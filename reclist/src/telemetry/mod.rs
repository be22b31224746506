//! Telemetry sinks: destinations for live results and charts during a run.

pub mod comet;
pub mod console;
pub mod neptune;

use crate::chart::Chart;
use crate::config::{BackendConfig, ConfigError, LoggerKind};
use crate::record::TestOutcome;
use std::io::Write;
use thiserror::Error;
use tracing::info;

pub use comet::{CometConfig, CometSink};
pub use console::ConsoleSink;
pub use neptune::{NeptuneConfig, NeptuneSink};

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {service}: {message}")]
    MalformedResponse {
        service: &'static str,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;

pub trait TelemetrySink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Record one test result under its display label.
    fn write(&self, label: &str, value: &TestOutcome) -> TelemetryResult<()>;

    /// Attach a rendered chart to the experiment.
    fn save_plot(&self, name: &str, chart: &Chart) -> TelemetryResult<()>;
}

/// Instantiate the sink registered under `kind`.
///
/// Settings are resolved before any network call, so a missing key fails
/// without contacting the service.
pub fn telemetry_factory(
    kind: LoggerKind,
    settings: &BackendConfig,
) -> TelemetryResult<Box<dyn TelemetrySink>> {
    info!("Using {} telemetry", kind);
    match kind {
        LoggerKind::Local => Ok(Box::new(ConsoleSink::new())),
        LoggerKind::Comet => Ok(Box::new(CometSink::new(CometConfig::from_settings(
            settings,
        )?)?)),
        LoggerKind::Neptune => Ok(Box::new(NeptuneSink::new(NeptuneConfig::from_settings(
            settings,
        )?)?)),
    }
}

/// Check a service response, turning non-success statuses into errors.
pub(crate) fn check_response(
    service: &'static str,
    response: reqwest::blocking::Response,
) -> TelemetryResult<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(TelemetryError::Api {
        service,
        status: status.as_u16(),
        body,
    })
}

/// Write a chart to a temporary `.svg` file for upload.
pub(crate) fn chart_tempfile(chart: &Chart) -> TelemetryResult<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(&format!("{}-", chart.name))
        .suffix(".svg")
        .tempfile()?;
    file.write_all(chart.to_svg().as_bytes())?;
    file.flush()?;
    Ok(file)
}
