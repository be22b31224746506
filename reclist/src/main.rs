use clap::{Parser, Subcommand};
use reclist::prelude::*;
use reclist::suites::{SessionRecList, SyntheticConfig, SyntheticSessions};
use reclist::TestRegistry;
use similarity::prelude::*;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "reclist")]
#[command(about = "Run behavioral test suites against recommender models")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the session suite on a synthetic dataset
    Run {
        /// Telemetry backend (overrides the config file)
        #[arg(short, long, value_enum)]
        logger: Option<LoggerKind>,
        /// Artifact store (overrides the config file)
        #[arg(short, long, value_enum)]
        store: Option<StoreKind>,
        /// Bucket used by the S3 store
        #[arg(long)]
        bucket: Option<String>,
        /// Number of synthetic examples
        #[arg(short = 'n', long, default_value = "1000")]
        examples: usize,
        /// Seed of the synthetic data
        #[arg(long, default_value = "42")]
        seed: u64,
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Folder receiving run outputs
        #[arg(long)]
        metadata_folder: Option<PathBuf>,
        /// Name recorded for the model under test
        #[arg(long, default_value = "SyntheticModel")]
        model_name: String,
        /// Do not print the summary table
        #[arg(short, long)]
        quiet: bool,
    },
    /// List the tests registered on the session suite
    Tests,
    /// Ask a completion model whether two products are similar
    Similarity {
        /// Query product as a JSON object
        query: String,
        /// Target product as a JSON object
        target: String,
        /// API key (falls back on OPENAI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
        /// Completion model
        #[arg(short, long)]
        model: Option<String>,
        /// Log the prompt and completion
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            logger,
            store,
            bucket,
            examples,
            seed,
            config,
            metadata_folder,
            model_name,
            quiet,
        } => {
            let mut rec_config = match config {
                Some(path) => RecListConfig::load(path)?,
                None => RecListConfig::new(),
            };
            if let Some(logger) = logger {
                rec_config = rec_config.with_logger(logger);
            }
            if let Some(store) = store {
                rec_config = rec_config.with_metadata_store(store);
            }
            if let Some(bucket) = bucket {
                rec_config = rec_config.with_bucket(bucket);
            }
            if let Some(folder) = metadata_folder {
                rec_config = rec_config.with_metadata_folder(folder);
            }
            if quiet {
                rec_config = rec_config.with_verbose(false);
            }

            run_session_suite(rec_config, examples, seed, &model_name)?;
        }
        Commands::Tests => {
            list_tests();
        }
        Commands::Similarity {
            query,
            target,
            api_key,
            model,
            verbose,
        } => {
            judge_similarity(&query, &target, api_key, model, verbose)?;
        }
    }

    Ok(())
}

fn run_session_suite(
    config: RecListConfig,
    examples: usize,
    seed: u64,
    model_name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let synthetic = SyntheticConfig::new()
        .with_examples(examples)
        .with_seed(seed);
    let data = SyntheticSessions::generate(&synthetic)?;
    info!(
        "Generated {} synthetic sessions (seed {})",
        data.targets.len(),
        seed
    );

    let (suite, embeddings) = data.into_suite(model_name);
    let suite = suite.with_similarity_model(Box::new(SkipGramSimilarity::new(embeddings)));

    let mut runner = RecListRunner::new(suite, config)?;
    let output = runner.run()?;

    println!("Report: {}", output.report_path.display());
    for chart in &output.charts {
        println!("Chart: {} ({})", chart.name, chart.kind());
    }

    Ok(())
}

fn list_tests() {
    let registry = TestRegistry::<SessionRecList>::discover();

    println!("Registered tests:");
    for test in registry.iter() {
        let descriptor = test.descriptor();
        let chart = descriptor
            .chart_kind
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| "none".to_string());
        println!(
            "  {} [{}, {}]: {}",
            descriptor.name, descriptor.display_label, chart, descriptor.description
        );
    }
}

fn judge_similarity(
    query: &str,
    target: &str,
    api_key: Option<String>,
    model: Option<String>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let query: serde_json::Value = serde_json::from_str(query)?;
    let target: serde_json::Value = serde_json::from_str(target)?;

    let mut config = GptSimilarityConfig::new();
    if let Some(api_key) = api_key {
        config = config.with_api_key(api_key);
    }
    if let Some(model) = model {
        config = config.with_model(model);
    }

    let oracle = GptSimilarity::new(config)?.with_verbose(verbose);
    let similar = oracle.similarity_binary(&query, &target)?;

    let label = |record: &serde_json::Value| {
        record
            .get("name")
            .and_then(|name| name.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| record.to_string())
    };
    println!(
        "{} and {} are similar: {}",
        label(&query),
        label(&target),
        similar
    );

    Ok(())
}
