pub mod annotation;
pub mod chart;
pub mod config;
pub mod metrics;
pub mod record;
pub mod registry;
pub mod report;
pub mod runner;
pub mod store;
pub mod suites;
pub mod telemetry;

pub use annotation::{
    doc_description, ChartType, RecList, RecTest, RecTests, TestDescriptor, TestError, TestFn,
    TestResult,
};
pub use chart::{histogram, Chart, ChartData, ChartError, ChartResult, HistogramBin};
pub use config::{
    BackendConfig, ConfigError, ConfigResult, LoggerKind, RecListConfig, StoreKind,
    DEFAULT_META_DATA_FOLDER, META_DATA_FOLDER_ENV,
};
pub use metrics::{accuracy, accuracy_per_slice, hit_rate_at_k, MetricError, MetricResult};
pub use record::{TestOutcome, TestRecord};
pub use registry::TestRegistry;
pub use report::{summary_table, Report, ReportMetadata};
pub use runner::{RecListError, RecListResult, RecListRunner, RunOutput};
pub use store::{
    store_factory, Artifact, ArtifactStore, AwsCredentials, LocalStore, S3Store, StorageError,
    StorageResult,
};
pub use suites::{SessionMetadata, SessionRecList, SyntheticConfig, SyntheticSessions};
pub use telemetry::{
    telemetry_factory, CometSink, ConsoleSink, NeptuneSink, TelemetryError, TelemetryResult,
    TelemetrySink,
};

pub mod prelude {
    pub use crate::annotation::{RecList, RecTests, TestError, TestResult};
    pub use crate::config::{LoggerKind, RecListConfig, StoreKind};
    pub use crate::rec_tests;
    pub use crate::record::TestOutcome;
    pub use crate::runner::{RecListError, RecListResult, RecListRunner};
}
