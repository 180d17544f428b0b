//! Asynchronous batch replay strategy
//!
//! Multi-threaded implementation of [`ReplayStrategy`]. Commands are read in
//! batches; within a batch, runs of consecutive read-only commands execute
//! concurrently while every mutating command acts as a barrier.
//!
//! # Architecture
//!
//! ```text
//! AsyncReplayStrategy
//!     ├── BatchConfig (batch_size, max_concurrent)
//!     ├── AsyncReader (batch CSV reading)
//!     └── TransactionService (shared, Arc-backed)
//!             └── executed on blocking workers via spawn_blocking
//! ```
//!
//! # Ordering
//!
//! - Batches are replayed one after another
//! - A mutating command starts only after everything before it finished
//! - Outcomes are written in input order, so the output matches the
//!   synchronous strategy for the same input

use crate::core::TransactionService;
use crate::io::{AsyncReader, ViewWriter};
use crate::strategy::{execute, write_outcome, CommandOutcome, ReplayStrategy};
use crate::types::{Command, PaymentError};
use futures::future::join_all;
use std::io::{ErrorKind, Write};
use std::mem;
use std::path::Path;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{debug, error, warn};

/// Configuration for batch replay
#[derive(Clone, Debug, PartialEq)]
pub struct BatchConfig {
    /// Number of commands read per batch
    pub batch_size: usize,
    /// Maximum number of read-only commands executing at once
    pub max_concurrent: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, replacing zero values with defaults
    pub fn new(batch_size: usize, max_concurrent: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size, default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent = if max_concurrent == 0 {
            warn!(
                "Invalid max_concurrent ({}), using default ({})",
                max_concurrent, default.max_concurrent
            );
            default.max_concurrent
        } else {
            max_concurrent
        };

        Self {
            batch_size,
            max_concurrent,
        }
    }
}

/// Asynchronous batch replay strategy
#[derive(Debug, Clone)]
pub struct AsyncReplayStrategy {
    config: BatchConfig,
    service: TransactionService,
}

impl AsyncReplayStrategy {
    pub fn new(config: BatchConfig, service: TransactionService) -> Self {
        Self { config, service }
    }

    /// Replay one batch, returning outcomes in input order
    async fn replay_batch(&self, batch: Vec<Command>) -> Vec<CommandOutcome> {
        let mut outcomes = Vec::with_capacity(batch.len());
        let mut reads = Vec::new();

        for command in batch {
            if command.is_read_only() {
                reads.push(command);
                continue;
            }

            outcomes.extend(self.run_concurrently(mem::take(&mut reads)).await);
            outcomes.extend(self.run_concurrently(vec![command]).await);
        }
        outcomes.extend(self.run_concurrently(reads).await);

        outcomes
    }

    /// Execute commands on blocking workers, at most `max_concurrent` at once
    async fn run_concurrently(&self, commands: Vec<Command>) -> Vec<CommandOutcome> {
        let mut outcomes = Vec::with_capacity(commands.len());
        let mut pending = commands.into_iter().peekable();

        while pending.peek().is_some() {
            let (labels, tasks): (Vec<_>, Vec<_>) = pending
                .by_ref()
                .take(self.config.max_concurrent)
                .map(|command| {
                    let label = (command.to_string(), command.name());
                    let service = self.service.clone();
                    let task = tokio::task::spawn_blocking(move || execute(&service, command));
                    (label, task)
                })
                .unzip();
            debug!(commands = tasks.len(), "Executing commands");

            for ((command, name), joined) in labels.into_iter().zip(join_all(tasks).await) {
                match joined {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => {
                        error!(command = %command, "Task panicked: {:?}", e);
                        outcomes.push(CommandOutcome {
                            command,
                            name,
                            result: Err(PaymentError::store_failure("execute", e.to_string())),
                        });
                    }
                }
            }
        }

        outcomes
    }
}

impl ReplayStrategy for AsyncReplayStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), PaymentError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent)
            .build()
            .map_err(|e| PaymentError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        runtime.block_on(async {
            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| match e.kind() {
                    ErrorKind::NotFound => PaymentError::FileNotFound {
                        path: input_path.display().to_string(),
                    },
                    _ => PaymentError::IoError {
                        message: format!("Failed to open file '{}': {}", input_path.display(), e),
                    },
                })?;

            let mut reader = AsyncReader::new(file.compat());
            let mut writer = ViewWriter::new(output)?;

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for outcome in self.replay_batch(batch).await {
                    write_outcome(&mut writer, outcome)?;
                }
            }

            writer.flush()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InMemoryRepository, ServiceConfig};
    use crate::types::{Description, PaymentMethod, Transaction};
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    const HEADER: &str = "command,id,value,establishment,merchant_code,payment_type,instalments,description_id,payment_method_id,nsu,authorization_code,status\n";

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(format!("{}{}", HEADER, rows).as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn service() -> TransactionService {
        TransactionService::from_config(
            &ServiceConfig::default(),
            Arc::new(InMemoryRepository::new()),
        )
    }

    fn pay(value: i64) -> Command {
        Command::Pay(Transaction::new(
            Description::new(Decimal::new(value, 0), "PUC Minas", "00000000000000"),
            PaymentMethod::new("DEBITO", 1),
        ))
    }

    #[test]
    fn test_batch_config_zero_values_fall_back() {
        let config = BatchConfig::new(0, 0);
        assert_eq!(config, BatchConfig::default());

        let config = BatchConfig::new(5, 2);
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.max_concurrent, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_replay_batch_preserves_input_order() {
        let strategy = AsyncReplayStrategy::new(BatchConfig::new(100, 2), service());

        let outcomes = strategy
            .replay_batch(vec![
                Command::FindById(1),
                pay(10),
                Command::FindById(1),
                pay(20),
                Command::FindById(2),
                Command::FindAll,
                Command::Reverse(1),
                Command::FindById(1),
            ])
            .await;

        let names: Vec<_> = outcomes.iter().map(|o| o.name).collect();
        assert_eq!(
            names,
            vec!["find", "pay", "find", "pay", "find", "find_all", "reverse", "find"]
        );
        assert!(outcomes[0].result.is_err());
        assert_eq!(outcomes[2].result.as_ref().unwrap()[0].id, 1);
        assert_eq!(outcomes[4].result.as_ref().unwrap()[0].id, 2);
        assert_eq!(outcomes[5].result.as_ref().unwrap().len(), 2);
        assert_eq!(
            outcomes[7].result.as_ref().unwrap()[0].status().as_str(),
            "DENIED"
        );
    }

    #[test]
    fn test_async_strategy_replays_across_batches() {
        let file = create_temp_csv(
            "pay,,10,Shop,123,DEBITO,1\n\
             find,1\n\
             pay,,20,Shop,123,DEBITO,1\n\
             find_all\n\
             reverse,2\n",
        );
        let strategy = AsyncReplayStrategy::new(BatchConfig::new(2, 2), service());
        let mut output = Vec::new();

        strategy.process(file.path(), &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        let commands: Vec<_> = output
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap_or_default())
            .collect();
        assert_eq!(
            commands,
            vec!["pay", "find", "pay", "find_all", "find_all", "reverse"]
        );
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let strategy = AsyncReplayStrategy::new(BatchConfig::default(), service());
        let mut output = Vec::new();

        let result = strategy.process(Path::new("nonexistent.csv"), &mut output);
        assert_eq!(
            result.unwrap_err(),
            PaymentError::FileNotFound {
                path: "nonexistent.csv".to_string()
            }
        );
    }
}
