//! Asynchronous CSV reader with batch interface
//!
//! Provides a streaming interface over service commands from a CSV file.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Commands
//!                  ↓
//!           csv_format module
//!           (CsvCommand, convert_csv_command)
//! ```

use crate::io::csv_format::{convert_csv_command, CsvCommand};
use crate::types::Command;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV command reader
///
/// Reads commands in batches. Records that fail to parse are logged and
/// skipped.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
        }
    }

    /// Read up to `batch_size` commands
    ///
    /// Returns an empty vector when the end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Command> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvCommand>();

        while batch.len() < batch_size {
            let Some(result) = records.next().await else {
                break;
            };
            self.line_num += 1;

            match result {
                Ok(csv_command) => match convert_csv_command(csv_command) {
                    Ok(command) => batch.push(command),
                    Err(e) => warn!(line = self.line_num, error = %e, "Skipping command"),
                },
                Err(e) => warn!(line = self.line_num, error = %e, "CSV parse error"),
            }
        }

        batch
    }
}
