//! Suite execution: run every registered test, stream results to telemetry,
//! persist the report and charts.

use crate::annotation::{RecList, TestError};
use crate::chart::{Chart, ChartError};
use crate::config::{ConfigError, RecListConfig, StoreKind};
use crate::record::TestRecord;
use crate::registry::TestRegistry;
use crate::report::{summary_table, Report, REPORT_PATH};
use crate::store::{store_factory, Artifact, ArtifactStore, StorageError};
use crate::telemetry::{telemetry_factory, TelemetryError, TelemetrySink};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RecListError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Rec test '{test}' failed: {source}")]
    TestFailed {
        test: String,
        #[source]
        source: TestError,
    },
}

impl RecListError {
    /// Whether the error comes from missing or invalid configuration,
    /// whichever backend reported it.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            RecListError::Config(_)
                | RecListError::Storage(StorageError::Config(_))
                | RecListError::Telemetry(TelemetryError::Config(_))
        )
    }
}

pub type RecListResult<T> = Result<T, RecListError>;

/// Last run stamp handed out in this process.
static LAST_RUN_STAMP: AtomicI64 = AtomicI64::new(0);

/// Epoch milliseconds naming the next run folder, strictly increasing
/// across calls so two runs never share a folder.
fn next_run_stamp() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let previous = LAST_RUN_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or_else(|last| last);
    now.max(previous + 1)
}

/// Where the outputs of one run ended up.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub run_path: PathBuf,
    pub report_path: PathBuf,
    pub charts: Vec<Chart>,
}

/// A suite bound to its backends, ready to run.
pub struct RecListRunner<S: RecList> {
    suite: S,
    registry: TestRegistry<S>,
    telemetry: Box<dyn TelemetrySink>,
    store: Box<dyn ArtifactStore>,
    config: RecListConfig,
    results: Vec<TestRecord>,
}

impl<S: RecList> RecListRunner<S> {
    /// Discover the suite's tests and instantiate the configured backends.
    ///
    /// Missing backend settings fail here, before any test runs.
    pub fn new(suite: S, config: RecListConfig) -> RecListResult<Self> {
        config.validate().map_err(ConfigError::Invalid)?;

        let store = store_factory(config.metadata_store, &config.settings)?;
        let telemetry = telemetry_factory(config.logger, &config.settings)?;

        Ok(Self::with_backends(suite, telemetry, store, config))
    }

    /// Use already constructed backends instead of the configured labels.
    pub fn with_backends(
        suite: S,
        telemetry: Box<dyn TelemetrySink>,
        store: Box<dyn ArtifactStore>,
        config: RecListConfig,
    ) -> Self {
        let registry = TestRegistry::discover();
        info!(
            "Prepared {} with {} rec tests (telemetry: {}, store: {})",
            suite.name(),
            registry.len(),
            telemetry.name(),
            store.kind()
        );

        Self {
            suite,
            registry,
            telemetry,
            store,
            config,
            results: Vec::new(),
        }
    }

    pub fn suite(&self) -> &S {
        &self.suite
    }

    pub fn registry(&self) -> &TestRegistry<S> {
        &self.registry
    }

    pub fn config(&self) -> &RecListConfig {
        &self.config
    }

    /// Records of the last run, including a run that was aborted.
    pub fn results(&self) -> &[TestRecord] {
        &self.results
    }

    /// `<store root>/<metadata folder>/<suite>/<model>/<epoch ms>`
    fn run_path(&self) -> PathBuf {
        self.store
            .resolve_root(&self.config.metadata_folder)
            .join(self.suite.name())
            .join(self.suite.model_name())
            .join(next_run_stamp().to_string())
    }

    /// Run every test with default arguments.
    pub fn run(&mut self) -> RecListResult<RunOutput>
    where
        S::Args: Default,
    {
        self.run_with(&S::Args::default())
    }

    /// Run every test, handing `args` to each of them.
    pub fn run_with(&mut self, args: &S::Args) -> RecListResult<RunOutput> {
        self.results.clear();

        let run_path = self.run_path();
        self.store.prepare_run(&run_path)?;
        info!("Running {} into {}", self.suite.name(), run_path.display());

        for test in self.registry.iter() {
            debug!("Running rec test {}", test.name());
            let outcome = test
                .call(&self.suite, args)
                .map_err(|source| RecListError::TestFailed {
                    test: test.name().to_string(),
                    source,
                })?;

            self.results.push(TestRecord::new(test.descriptor(), outcome));
            if let Some(record) = self.results.last() {
                self.telemetry.write(&record.name, &record.result)?;
            }
        }

        if self.config.verbose {
            println!("{}", summary_table(&self.suite.name(), &self.results));
        }

        let report_path = self.write_report(&run_path)?;
        let charts = self.write_charts(&run_path)?;
        for chart in &charts {
            self.telemetry.save_plot(&chart.name, chart)?;
        }

        info!(
            "Finished {}: {} tests, {} charts",
            self.suite.name(),
            self.results.len(),
            charts.len()
        );

        Ok(RunOutput {
            run_path,
            report_path,
            charts,
        })
    }

    fn write_report(&self, run_path: &Path) -> RecListResult<PathBuf> {
        let report = Report::new(
            self.suite.model_name(),
            self.suite.name(),
            self.registry.names().into_iter().map(String::from).collect(),
            self.results.clone(),
        );

        let report_path = REPORT_PATH
            .iter()
            .fold(run_path.to_path_buf(), |path, part| path.join(part));
        self.store
            .write_file(&report_path, &Artifact::Structured(report.to_json()?))?;
        debug!("Report written to {}", report_path.display());

        Ok(report_path)
    }

    /// Render charts for bars/bins results; the local store also keeps them
    /// under `plots/`.
    fn write_charts(&self, run_path: &Path) -> RecListResult<Vec<Chart>> {
        let mut charts = Vec::new();
        for record in &self.results {
            let Some(chart) = Chart::from_record(record)? else {
                continue;
            };

            if self.store.kind() == StoreKind::Local {
                let path = run_path.join("plots").join(chart.file_name());
                self.store.write_file(&path, &Artifact::text(chart.to_svg()))?;
            }
            charts.push(chart);
        }
        Ok(charts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::TestResult;
    use crate::store::LocalStore;
    use crate::telemetry::ConsoleSink;
    use tempfile::TempDir;

    struct Counter;

    crate::rec_tests! {
        impl Counter {
            /// Always one
            #[rec_test(test_type = "One", display = Scalar)]
            fn one(&self) -> TestResult<f64> {
                Ok(1.0)
            }
        }
    }

    impl RecList for Counter {
        fn model_name(&self) -> String {
            "CounterModel".to_string()
        }
    }

    fn runner(dir: &TempDir) -> RecListRunner<Counter> {
        RecListRunner::with_backends(
            Counter,
            Box::new(ConsoleSink::with_writer(Box::new(std::io::sink()))),
            Box::new(LocalStore::new()),
            RecListConfig::new()
                .with_metadata_folder(dir.path())
                .with_verbose(false),
        )
    }

    #[test]
    fn test_run_path_layout() {
        let dir = TempDir::new().unwrap();
        let mut runner = runner(&dir);
        let output = runner.run().unwrap();

        let relative = output.run_path.strip_prefix(dir.path()).unwrap();
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        assert_eq!(parts[0], "Counter");
        assert_eq!(parts[1], "CounterModel");
        assert!(parts[2].parse::<i64>().unwrap() > 0);

        assert_eq!(output.report_path, output.run_path.join("results/report.json"));
        assert!(output.run_path.join("artifacts").is_dir());
        assert!(output.charts.is_empty());
    }

    #[test]
    fn test_results_reset_between_runs() {
        let dir = TempDir::new().unwrap();
        let mut runner = runner(&dir);
        runner.run().unwrap();
        runner.run().unwrap();
        assert_eq!(runner.results().len(), 1);
    }

    #[test]
    fn test_run_stamps_strictly_increase() {
        let stamps: Vec<i64> = (0..100).map(|_| next_run_stamp()).collect();
        assert!(stamps.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_back_to_back_runs_get_distinct_folders() {
        let dir = TempDir::new().unwrap();
        let mut runner = runner(&dir);

        let paths: Vec<PathBuf> = (0..20).map(|_| runner.run().unwrap().run_path).collect();
        let mut unique = paths.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), paths.len());
        assert!(paths.iter().all(|p| p.join("results/report.json").is_file()));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = RecListRunner::new(
            Counter,
            RecListConfig::new().with_metadata_folder(""),
        );
        assert!(matches!(result, Err(RecListError::Config(ConfigError::Invalid(_)))));
    }
}
