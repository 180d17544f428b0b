//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over service commands from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<Command, PaymentError>` for each CSV row:
//!
//! ```no_run
//! use payment_transaction_service::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("commands.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(command) => println!("Replaying: {}", command),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual record errors are yielded as Err variants carrying the line
//!   number (header is line 1)
//! - Memory usage is O(1) per record, not O(file_size)

use crate::io::csv_format::{convert_csv_command, CsvCommand};
use crate::types::{Command, PaymentError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Synchronous CSV command reader
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Create a new SyncReader from a file path
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (trailing optional columns may be omitted)
    /// - Use an 8KB buffer for efficient I/O
    pub fn new(path: &Path) -> Result<Self, PaymentError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PaymentError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => PaymentError::IoError {
                message: format!("Failed to open file '{}': {}", path.display(), e),
            },
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<Command, PaymentError>;

    /// Read the next row and convert it, tagging failures with the line
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvCommand>();
        let result = deserializer.next()?;
        self.line_num += 1;

        Some(match result {
            Ok(csv_command) => convert_csv_command(csv_command)
                .map_err(|e| PaymentError::parse_error(Some(self.line_num), e)),
            Err(e) => Err(PaymentError::parse_error(Some(self.line_num), e.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "command,id,value,establishment,merchant_code,payment_type,instalments,description_id,payment_method_id,nsu,authorization_code,status\n";

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(HEADER.as_bytes())
            .expect("Failed to write to temp file");
        file.write_all(rows.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));
        assert_eq!(
            result.unwrap_err(),
            PaymentError::FileNotFound {
                path: "nonexistent.csv".to_string()
            }
        );
    }

    #[test]
    fn test_sync_reader_iterates_commands() {
        let file = create_temp_csv(
            "pay,,496,PUC Minas,00000000000000,DEBITO,1,,,,,\n\
             find,1,,,,,,,,,,\n\
             find_all,,,,,,,,,,,\n\
             reverse,1,,,,,,,,,,\n",
        );

        let commands: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(commands.len(), 4);
        assert_eq!(commands[0].name(), "pay");
        assert_eq!(commands[1], Command::FindById(1));
        assert_eq!(commands[2], Command::FindAll);
        assert_eq!(commands[3], Command::Reverse(1));
    }

    #[test]
    fn test_sync_reader_accepts_short_rows() {
        let file = create_temp_csv("find,3\nfind_all\n");

        let commands: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(commands, vec![Command::FindById(3), Command::FindAll]);
    }

    #[test]
    fn test_sync_reader_includes_line_numbers_in_errors() {
        let file = create_temp_csv("find,1\nfind,abc\nfind,2\n");

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 3);
        assert!(records[0].is_ok());
        assert!(records[2].is_ok());
        let error = records[1].as_ref().unwrap_err();
        assert_eq!(
            error.to_string(),
            "CSV parse error at line 3: Invalid id 'abc'"
        );
    }

    #[test]
    fn test_sync_reader_handles_whitespace_and_case() {
        let file = create_temp_csv("  REVERSE  ,  9  \n");

        let commands: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(commands, vec![Command::Reverse(9)]);
    }

    #[test]
    fn test_sync_reader_handles_empty_file_after_header() {
        let file = create_temp_csv("");

        assert_eq!(SyncReader::new(file.path()).unwrap().count(), 0);
    }
}
