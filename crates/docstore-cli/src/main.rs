//! docstore CLI
//!
//! Usage:
//!   docstore run                          Run the CRUD suite against MongoDB
//!   docstore run --backend memory         Run it against the in-memory store
//!   docstore run -k find --fail-fast      Only cases matching "find", stop on failure
//!   docstore run --tag read --tag write   Only cases carrying one of these tags
//!   docstore run --format json -o out.json
//!   docstore ping                         Check the store is reachable
//!
//! Store settings come from DOCSTORE_* environment variables; flags override them.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use docstore::StoreConfig;
use docstore_qc::{crud_suite, ReportFormat, Reporter, RunnerConfig, TodoFixture};

#[derive(Parser)]
#[command(name = "docstore")]
#[command(about = "Document store CRUD and aggregation harness", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed a collection, run the CRUD suite and drop the database
    Run {
        #[command(flatten)]
        store: StoreArgs,

        /// Report format: console, markdown, json or yaml
        #[arg(long, default_value = "console")]
        format: String,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop on first failure
        #[arg(long)]
        fail_fast: bool,

        /// Only run cases whose name contains this pattern
        #[arg(short = 'k', long)]
        pattern: Option<String>,

        /// Only run cases with this tag (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Per-case timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<f64>,
    },

    /// Connect to the store and ping it
    Ping {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct StoreArgs {
    /// Store backend: mongo or memory
    #[arg(long)]
    backend: Option<String>,

    /// MongoDB connection string
    #[arg(long)]
    uri: Option<String>,

    /// Database to seed and drop
    #[arg(long)]
    database: Option<String>,

    /// Collection to seed
    #[arg(long)]
    collection: Option<String>,
}

impl StoreArgs {
    fn into_config(self) -> Result<StoreConfig> {
        let config = StoreConfig::from_env().context("Invalid DOCSTORE_* environment")?;
        self.apply(config)
    }

    fn apply(self, mut config: StoreConfig) -> Result<StoreConfig> {
        if let Some(backend) = self.backend {
            config.backend = backend.parse().context("Invalid --backend")?;
        }
        if let Some(uri) = self.uri {
            config.uri = uri;
        }
        if let Some(database) = self.database {
            config.database = database;
        }
        if let Some(collection) = self.collection {
            config.collection = collection;
        }
        config
            .namespace()
            .context("Invalid database or collection name")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Run {
            store,
            format,
            output,
            fail_fast,
            pattern,
            tags,
            timeout,
        } => {
            let selection = Selection {
                fail_fast,
                pattern,
                tags,
                timeout,
            };
            let exit_code = run_suite(store, &format, output, selection)?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        Commands::Ping { store } => ping(store)?,
    }

    Ok(())
}

/// Which cases run and how long each may take
#[derive(Debug, Default)]
struct Selection {
    fail_fast: bool,
    pattern: Option<String>,
    tags: Vec<String>,
    timeout: Option<f64>,
}

fn runner_config(selection: Selection) -> Result<RunnerConfig> {
    let mut config = RunnerConfig {
        name_pattern: selection.pattern,
        tags: selection.tags,
        fail_fast: selection.fail_fast,
        ..Default::default()
    };
    if let Some(secs) = selection.timeout {
        anyhow::ensure!(
            secs.is_finite() && secs > 0.0,
            "--timeout must be a positive number of seconds"
        );
        config.default_timeout = Duration::from_secs_f64(secs);
    }
    Ok(config)
}

fn run_suite(
    store: StoreArgs,
    format: &str,
    output: Option<PathBuf>,
    selection: Selection,
) -> Result<i32> {
    let format: ReportFormat = format.parse()?;
    let config = store.into_config()?;
    let runner = runner_config(selection)?;
    let fixture = TodoFixture::from_config(config)?;

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let report = rt.block_on(crud_suite(fixture).run(runner));

    let rendered = Reporter::new(format)
        .generate(&report)
        .context("Failed to render report")?;
    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => println!("{}", rendered),
    }

    Ok(if report.all_passed() { 0 } else { 1 })
}

fn ping(store: StoreArgs) -> Result<()> {
    let config = store.into_config()?;
    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    rt.block_on(async {
        let store = config
            .connect()
            .await
            .with_context(|| format!("Cannot reach {} store at {}", config.backend, config.uri))?;
        store.ping().await.context("Ping failed")?;
        store.close().await.context("Failed to close store")?;
        Ok::<_, anyhow::Error>(())
    })?;

    println!("{} store is reachable", config.backend);
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok(); // Ignore error if already initialized

    Ok(())
}
