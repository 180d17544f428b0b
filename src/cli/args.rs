use crate::core::{ServiceConfig, TRANSACTION_REGION};
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for the payment transaction service
///
/// # Examples
///
/// ```bash
/// payment-service commands.csv
/// payment-service --strategy async --batch-size 2000 --max-concurrent 8 commands.csv
/// payment-service --no-cache --log-level debug commands.csv
/// ```
#[derive(Parser, Debug)]
#[command(name = "payment-service")]
#[command(about = "Replay payment transaction commands against the transaction service", long_about = None)]
pub struct CliArgs {
    #[arg(value_name = "INPUT", help = "Path to the command CSV file")]
    pub input_file: PathBuf,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Replay strategy: 'sync' for sequential or 'async' for batched concurrent reads"
    )]
    pub strategy: StrategyType,

    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of read-only commands executing at once (default: CPU cores)"
    )]
    pub max_concurrent: Option<usize>,

    #[arg(long = "no-cache", help = "Disable the result cache")]
    pub no_cache: bool,

    #[arg(
        long = "cache-region",
        value_name = "NAME",
        default_value = TRANSACTION_REGION,
        help = "Cache region holding transaction views"
    )]
    pub cache_region: String,

    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "warn",
        help = "Log level written to stderr (RUST_LOG takes precedence)"
    )]
    pub log_level: String,
}

/// Replay strategy selection
#[derive(Clone, Debug, PartialEq, ValueEnum)]
pub enum StrategyType {
    /// Read and execute commands one at a time
    Sync,
    /// Read in batches and run consecutive reads concurrently
    Async,
}

impl CliArgs {
    /// Build the batch configuration, falling back to defaults
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent.unwrap_or(default.max_concurrent),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn to_service_config(&self) -> ServiceConfig {
        ServiceConfig {
            cache_region: self.cache_region.clone(),
            cache_enabled: !self.no_cache,
        }
    }
}
