//! Replay strategy module
//!
//! This module defines the Strategy pattern for replaying command files
//! against a [`TransactionService`], encompassing both CSV parsing and
//! command execution. Different implementations (synchronous, asynchronous
//! batch) can be selected at runtime and must produce identical output.

use crate::cli::StrategyType;
use crate::core::TransactionService;
use crate::io::ViewWriter;
use crate::types::{Command, PaymentError, TransactionView};
use std::io::Write;
use std::path::Path;
use tracing::warn;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncReplayStrategy, BatchConfig};
pub use sync::SyncReplayStrategy;

/// Replay strategy trait for complete command pipelines
pub trait ReplayStrategy: Send + Sync {
    /// Replay commands from the input file and write the resulting views
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened (file not found, permission denied)
    /// - A fatal I/O error occurs during reading or writing
    ///
    /// Individual command failures (malformed records, not-found ids,
    /// rejected payments) are logged and do not cause this method to return
    /// an error. Replay continues with the next command.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), PaymentError>;
}

/// Result of executing one command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    /// Rendered command, used in logs
    pub command: String,
    /// Name written to the `command` output column
    pub name: &'static str,
    pub result: Result<Vec<TransactionView>, PaymentError>,
}

/// Run one command against the service
pub fn execute(service: &TransactionService, command: Command) -> CommandOutcome {
    let rendered = command.to_string();
    let name = command.name();

    let result = match command {
        Command::FindById(id) => service.find_by_id(id).map(|view| vec![view]),
        Command::FindAll => service.find_all(),
        Command::Pay(transaction) => service.pay(transaction).map(|view| vec![view]),
        Command::Reverse(id) => service.reverse(id).map(|view| vec![view]),
    };

    CommandOutcome {
        command: rendered,
        name,
        result,
    }
}

/// Write a successful outcome's views, or log the failure and move on
pub(crate) fn write_outcome<W: Write>(
    writer: &mut ViewWriter<W>,
    outcome: CommandOutcome,
) -> Result<(), PaymentError> {
    match outcome.result {
        Ok(views) => writer.write_views(outcome.name, &views),
        Err(e) => {
            warn!(command = %outcome.command, kind = ?e.kind(), "Command failed: {}", e);
            Ok(())
        }
    }
}

/// Create a replay strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of replay strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch replay (ignored for sync)
/// * `service` - The service every command is executed against
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
    service: TransactionService,
) -> Box<dyn ReplayStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncReplayStrategy::new(service)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncReplayStrategy::new(config, service))
        }
    }
}
