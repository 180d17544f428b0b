//! Synchronous replay strategy
//!
//! Single-threaded implementation of [`ReplayStrategy`]. It orchestrates
//! replay by coordinating between the SyncReader (for CSV input), the
//! TransactionService (for business logic) and the ViewWriter (for output).
//!
//! Commands are read, executed and written one at a time, so memory usage
//! does not grow with the size of the command file.

use crate::core::TransactionService;
use crate::io::{SyncReader, ViewWriter};
use crate::strategy::{execute, write_outcome, ReplayStrategy};
use crate::types::PaymentError;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Synchronous replay strategy
///
/// # Examples
///
/// ```no_run
/// use payment_transaction_service::core::{InMemoryRepository, ServiceConfig, TransactionService};
/// use payment_transaction_service::strategy::{ReplayStrategy, SyncReplayStrategy};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// let service = TransactionService::from_config(
///     &ServiceConfig::default(),
///     Arc::new(InMemoryRepository::new()),
/// );
/// let strategy = SyncReplayStrategy::new(service);
///
/// strategy
///     .process(Path::new("commands.csv"), &mut std::io::stdout())
///     .expect("Replay failed");
/// ```
#[derive(Debug, Clone)]
pub struct SyncReplayStrategy {
    service: TransactionService,
}

impl SyncReplayStrategy {
    pub fn new(service: TransactionService) -> Self {
        Self { service }
    }
}

impl ReplayStrategy for SyncReplayStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), PaymentError> {
        let reader = SyncReader::new(input_path)?;
        let mut writer = ViewWriter::new(output)?;

        for result in reader {
            match result {
                Ok(command) => write_outcome(&mut writer, execute(&self.service, command))?,
                Err(e) => warn!("Skipping command: {}", e),
            }
        }

        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InMemoryRepository, ServiceConfig};
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

    fn strategy() -> SyncReplayStrategy {
        SyncReplayStrategy::new(TransactionService::from_config(
            &ServiceConfig::default(),
            Arc::new(InMemoryRepository::new()),
        ))
    }

    fn replay(rows: &str) -> Vec<String> {
        let file = create_temp_csv(rows);
        let mut output = Vec::new();
        strategy().process(file.path(), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_sync_strategy_pays_and_finds() {
        let lines = replay(
            "pay,,496,PUC Minas,00000000000000,DEBITO,1\n\
             find,1\n",
        );

        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("pay,1,1,1,496,PUC Minas"));
        assert!(lines[1].ends_with("1234567890,147258369,AUTHORIZED,DEBITO,1"));
        assert!(lines[2].starts_with("find,1,"));
    }

    #[test]
    fn test_sync_strategy_skips_failed_commands() {
        let lines = replay(
            "find,7\n\
             find_all\n\
             refund,1\n\
             pay,,10,Shop,123,CREDITO,2,,,,,AUTHORIZED\n\
             pay,,10,Shop,123,CREDITO,2\n\
             reverse,1\n",
        );

        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("pay,1,"));
        assert!(lines[2].starts_with("reverse,1,"));
        assert!(lines[2].contains(",DENIED,"));
    }

    #[test]
    fn test_sync_strategy_handles_missing_file() {
        let mut output = Vec::new();

        let result = strategy().process(Path::new("nonexistent.csv"), &mut output);
        assert_eq!(
            result.unwrap_err(),
            PaymentError::FileNotFound {
                path: "nonexistent.csv".to_string()
            }
        );
    }

    #[test]
    fn test_sync_strategy_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncReplayStrategy>();
    }
}
