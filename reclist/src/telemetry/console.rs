use super::{TelemetryResult, TelemetrySink};
use crate::chart::Chart;
use crate::record::TestOutcome;
use std::io::Write;
use std::sync::Mutex;

/// Prints every result as `label: value`. Charts are not shown.
pub struct ConsoleSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn write(&self, label: &str, value: &TestOutcome) -> TelemetryResult<()> {
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(out, "{}: {}", label, value)?;
        Ok(())
    }

    fn save_plot(&self, _name: &str, _chart: &Chart) -> TelemetryResult<()> {
        Ok(())
    }
}
