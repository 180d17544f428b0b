//! Payment Transaction Service CLI
//!
//! Replays a file of transaction commands against the payment transaction
//! service and writes every resulting view to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > views.csv
//! cargo run -- --strategy async commands.csv > views.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 commands.csv > views.csv
//! cargo run -- --no-cache --log-level info commands.csv > views.csv
//! ```
//!
//! # Processing Strategies
//!
//! - **sync**: Sequential replay, one command at a time (default)
//! - **async**: Batched replay with concurrent read-only commands
//!
//! # Exit Codes
//!
//! - 0: Success (individual command failures are logged and skipped)
//! - 1: Error (missing arguments, file not found, output not writable, etc.)

use payment_transaction_service::cli;
use payment_transaction_service::core::{InMemoryRepository, TransactionService};
use payment_transaction_service::strategy;
use std::process;
use std::sync::Arc;
use tracing::info;

fn main() {
    let args = cli::parse_args();
    cli::init_logging(&args.log_level);

    let service_config = args.to_service_config();
    info!(
        region = %service_config.cache_region,
        cache_enabled = service_config.cache_enabled,
        strategy = ?args.strategy,
        "Starting replay"
    );
    let service =
        TransactionService::from_config(&service_config, Arc::new(InMemoryRepository::new()));

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), config, service)
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
