//! Command-line surface: a `sort` subcommand that runs a full job, and a
//! `plan` subcommand that runs just the shuffle planner against an input
//! size (or a live bucket prefix) and prints the result, useful for
//! capacity planning without actually running a job.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::config::{Config, FileConfig};
use crate::coordinator;
use crate::errors::SortError;
use sort_runtime::TokioTaskRunner;
use sort_store::local::LocalFsObjectStore;
use sort_store::memory::InMemoryObjectStore;
use sort_store::ObjectStore;

#[derive(Parser, Debug)]
#[command(name = "orasort", about = "External distributed radix sort over object storage", version)]
pub struct Cli {
    /// Path to a YAML config file; CLI flags take precedence over it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Increase log verbosity; repeat for more (`-v`, `-vv`). Overridden by
    /// `RUST_LOG` if set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a full external sort job.
    Sort {
        #[arg(long, env = "ORASORT_INPUT_PREFIX")]
        input_prefix: Option<String>,
        #[arg(long, env = "ORASORT_OUTPUT_PREFIX")]
        output_prefix: Option<String>,
        #[arg(long, env = "ORASORT_BUCKET")]
        bucket: Option<String>,
        #[arg(long, env = "ORASORT_MAX_PARALLELISM")]
        max_parallelism: Option<usize>,
        #[arg(long, env = "ORASORT_WORKER_IMAGE")]
        worker_image: Option<String>,
        /// Use a filesystem directory as the object store instead of S3.
        #[arg(long)]
        local_store: Option<PathBuf>,
    },
    /// Compute and print the shuffle plan for a given input size, without
    /// running anything.
    Plan {
        /// Total input size, in bytes.
        input_size_bytes: u64,
    },
}

pub fn init_tracing(cli: &Cli) {
    use tracing_subscriber::EnvFilter;

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match cli.log_format {
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().json().with_env_filter(filter).init();
        }
    }
}

#[cfg(feature = "aws-s3")]
async fn build_production_store(config: &Config) -> Arc<dyn ObjectStore> {
    Arc::new(sort_store::s3::S3ObjectStore::from_env(config.bucket.clone()).await)
}

#[cfg(not(feature = "aws-s3"))]
async fn build_production_store(_config: &Config) -> Arc<dyn ObjectStore> {
    Arc::new(InMemoryObjectStore::new())
}

pub async fn run(cli: Cli) -> Result<(), SortError> {
    match cli.command {
        Command::Plan { input_size_bytes } => {
            let (num_passes, v) = sort_core::plan(
                input_size_bytes,
                crate::config::BUFFER_SIZE_TO_CATEGORIZE,
                crate::config::RECORD_SIZE,
            )
            .map_err(|source| SortError::Planner { source })?;
            println!("num_passes={num_passes} values_per_category={v}");
            Ok(())
        }
        Command::Sort {
            input_prefix,
            output_prefix,
            bucket,
            max_parallelism,
            worker_image,
            local_store,
        } => {
            let file = match &cli.config {
                Some(path) => FileConfig::load(path).map_err(|source| SortError::Config { source })?,
                None => FileConfig::default(),
            };
            let config = Config::resolve(
                file,
                input_prefix,
                output_prefix,
                bucket,
                max_parallelism,
                worker_image,
            )
            .map_err(|source| SortError::Config { source })?;

            let store: Arc<dyn ObjectStore> = match local_store {
                Some(root) => Arc::new(LocalFsObjectStore::new(root)),
                None => build_production_store(&config).await,
            };

            info!(
                input_prefix = %config.input_prefix,
                output_prefix = %config.output_prefix,
                max_parallelism = config.max_parallelism,
                "starting sort job"
            );

            let started_at = std::time::Instant::now();
            let runner = TokioTaskRunner;
            let summary = coordinator::run(&config, store, &runner)
                .await
                .map_err(|source| SortError::Coordinator { source })?;
            let elapsed = started_at.elapsed();

            info!(
                num_passes = summary.num_passes,
                values_per_category = summary.values_per_category,
                output_objects = summary.output_objects,
                input_bytes = %bytesize::ByteSize(summary.input_bytes),
                output_bytes = %bytesize::ByteSize(summary.output_bytes),
                elapsed = %humantime::format_duration(elapsed),
                "sort job complete"
            );
            Ok(())
        }
    }
}
