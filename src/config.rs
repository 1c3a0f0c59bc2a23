//! Layered configuration: CLI flags override an optional YAML file, which
//! overrides built-in defaults — the same precedence the teacher documents
//! for its own component configuration.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use snafu::{ResultExt, Snafu};

/// Fixed by the record format (spec §6); not runtime configuration.
pub const RECORD_SIZE: u64 = sort_core::RECORD_SIZE as u64;
/// Fixed by the record format (spec §6); not runtime configuration.
pub const MAX_NUM_CATEGORIES: u64 = sort_core::MAX_NUM_CATEGORIES as u64;
/// Worker memory budget. A compile-time constant per the design: every
/// terminal category and every partition worker buffer is sized to this.
pub const BUFFER_SIZE_TO_CATEGORIZE: u64 = 500_000_000;

fn default_max_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

fn default_worker_image() -> String {
    "orasort-worker:latest".to_string()
}

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("failed to read config file {path}: {source}"))]
    ReadFile { path: String, source: std::io::Error },
    #[snafu(display("failed to parse config file {path}: {source}"))]
    ParseFile { path: String, source: serde_yaml::Error },
    #[snafu(display("input_prefix must not be empty"))]
    EmptyInputPrefix,
    #[snafu(display("output_prefix must not be empty"))]
    EmptyOutputPrefix,
    #[snafu(display("max_parallelism must be greater than zero"))]
    ZeroParallelism,
}

/// The subset of configuration that can come from a file or the CLI.
/// Every field is optional here; [`Config::resolve`] applies the
/// file-then-default fallback and CLI-overrides-file precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub input_prefix: Option<String>,
    pub output_prefix: Option<String>,
    pub bucket: Option<String>,
    pub max_parallelism: Option<usize>,
    pub worker_image: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).context(ReadFileSnafu {
            path: path.display().to_string(),
        })?;
        serde_yaml::from_str(&raw).context(ParseFileSnafu {
            path: path.display().to_string(),
        })
    }
}

/// Fully-resolved configuration for one sort job, after CLI/file/default
/// precedence has been applied.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_prefix: String,
    pub output_prefix: String,
    pub bucket: String,
    pub max_parallelism: usize,
    /// Carried through only for parity with the original FaaS-runtime task
    /// metadata; unused by the in-process task runner.
    pub worker_image: String,
}

impl Config {
    /// Merges CLI overrides over an optional file config over defaults.
    pub fn resolve(
        file: FileConfig,
        cli_input_prefix: Option<String>,
        cli_output_prefix: Option<String>,
        cli_bucket: Option<String>,
        cli_max_parallelism: Option<usize>,
        cli_worker_image: Option<String>,
    ) -> Result<Self, ConfigError> {
        let input_prefix = cli_input_prefix
            .or(file.input_prefix)
            .unwrap_or_default();
        if input_prefix.is_empty() {
            return Err(ConfigError::EmptyInputPrefix);
        }

        let output_prefix = cli_output_prefix
            .or(file.output_prefix)
            .unwrap_or_default();
        if output_prefix.is_empty() {
            return Err(ConfigError::EmptyOutputPrefix);
        }

        let bucket = cli_bucket.or(file.bucket).unwrap_or_default();

        let max_parallelism = cli_max_parallelism
            .or(file.max_parallelism)
            .unwrap_or_else(default_max_parallelism);
        if max_parallelism == 0 {
            return Err(ConfigError::ZeroParallelism);
        }

        let worker_image = cli_worker_image
            .or(file.worker_image)
            .unwrap_or_else(default_worker_image);

        Ok(Config {
            input_prefix,
            output_prefix,
            bucket,
            max_parallelism,
            worker_image,
        })
    }
}
