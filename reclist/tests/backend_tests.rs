use reclist::config::{ConfigError, META_DATA_FOLDER_ENV};
use reclist::prelude::*;
use reclist::store::{store_factory, StorageError};
use reclist::telemetry::TelemetryError;
use reclist::BackendConfig;
use serial_test::serial;
use std::env;

struct Empty;

rec_tests! {
    impl Empty {
        #[rec_test(test_type = "Constant", display = Scalar)]
        pub fn constant(&self) -> TestResult<f64> {
            Ok(1.0)
        }
    }
}

impl RecList for Empty {
    fn model_name(&self) -> String {
        "NoModel".to_string()
    }
}

fn clear_backend_env() {
    for key in [
        "S3_BUCKET",
        "S3_ANONYMOUS",
        "S3_ENDPOINT",
        "COMET_KEY",
        "COMET_PROJECT_NAME",
        "COMET_WORKSPACE",
        "NEPTUNE_KEY",
        "NEPTUNE_PROJECT_NAME",
        META_DATA_FOLDER_ENV,
    ] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_s3_without_bucket_fails_before_running() {
    clear_backend_env();

    let config = RecListConfig::new().with_metadata_store(StoreKind::S3);
    let err = RecListRunner::new(Empty, config).err().unwrap();

    assert!(err.is_config());
    assert!(matches!(
        err,
        RecListError::Storage(StorageError::Config(ConfigError::MissingSetting { ref key }))
            if key == "S3_BUCKET"
    ));
}

#[test]
#[serial]
fn test_s3_bucket_falls_back_on_environment() {
    clear_backend_env();
    env::set_var("S3_BUCKET", "env-bucket");

    let settings = BackendConfig::new().with_setting("S3_ANONYMOUS", "true");
    let store = store_factory(StoreKind::S3, &settings).unwrap();
    assert_eq!(store.kind(), StoreKind::S3);

    // the explicit setting wins over the environment
    assert_eq!(settings.get("S3_BUCKET").as_deref(), Some("env-bucket"));
    let explicit = settings.with_setting("S3_BUCKET", "explicit-bucket");
    assert_eq!(explicit.get("S3_BUCKET").as_deref(), Some("explicit-bucket"));

    clear_backend_env();
}

#[test]
#[serial]
fn test_s3_rejects_absolute_metadata_folder() {
    clear_backend_env();

    let config = RecListConfig::new()
        .with_metadata_store(StoreKind::S3)
        .with_bucket("bucket")
        .with_setting("S3_ANONYMOUS", "true")
        .with_metadata_folder(env::temp_dir());
    let err = RecListRunner::new(Empty, config).err().unwrap();

    assert!(matches!(err, RecListError::Config(ConfigError::Invalid(_))));
    assert!(err.is_config());
}

#[test]
#[serial]
fn test_missing_telemetry_keys() {
    clear_backend_env();

    let comet = RecListRunner::new(Empty, RecListConfig::new().with_logger(LoggerKind::Comet))
        .err()
        .unwrap();
    assert!(matches!(
        comet,
        RecListError::Telemetry(TelemetryError::Config(ConfigError::MissingSetting { ref key }))
            if key == "COMET_KEY"
    ));

    let neptune =
        RecListRunner::new(Empty, RecListConfig::new().with_logger(LoggerKind::Neptune))
            .err()
            .unwrap();
    assert!(neptune.is_config());
}

#[test]
#[serial]
fn test_store_failure_wins_over_telemetry_failure() {
    clear_backend_env();

    // both backends are misconfigured; the store is checked first
    let config = RecListConfig::new()
        .with_logger(LoggerKind::Comet)
        .with_metadata_store(StoreKind::S3);
    let err = RecListRunner::new(Empty, config).err().unwrap();

    assert!(matches!(err, RecListError::Storage(_)));
}

#[test]
#[serial]
fn test_local_defaults_construct() {
    clear_backend_env();

    let runner = RecListRunner::new(Empty, RecListConfig::new()).unwrap();
    assert_eq!(runner.config().logger, LoggerKind::Local);
    assert_eq!(runner.config().metadata_store, StoreKind::Local);
    assert_eq!(runner.registry().names(), vec!["constant"]);
    assert!(runner.results().is_empty());
}

#[test]
#[serial]
fn test_config_file_selects_backends() {
    clear_backend_env();

    let config = RecListConfig::from_toml_str(
        r#"
logger = "neptune"
metadata_store = "s3"
metadata_folder = "runs"
verbose = false

[settings]
S3_BUCKET = "from-file"
"#,
    )
    .unwrap();

    assert_eq!(config.logger, LoggerKind::Neptune);
    assert_eq!(config.metadata_store, StoreKind::S3);
    assert_eq!(config.settings.get("S3_BUCKET").as_deref(), Some("from-file"));
    assert!(!config.verbose);
}
