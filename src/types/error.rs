//! Error types for the payment transaction service
//!
//! This module defines all error types that can occur while serving
//! transaction operations or replaying command files.
//!
//! # Error Categories
//!
//! - **Not found**: unknown transaction id, or no transactions at all
//! - **Insertion not permitted**: a payment carried server-owned fields
//! - **Store failures**: repository, constraint or transaction failures
//! - **Input errors**: command file I/O and CSV parsing (CLI only)

use super::transaction::TransactionId;
use thiserror::Error;

/// Main error type for the payment service
///
/// Each variant includes enough context to diagnose the failure without
/// access to the request that produced it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentError {
    /// The requested transaction id does not resolve
    ///
    /// Recovered by the caller; a transport layer maps it to a 404-class
    /// response.
    #[error("Transaction {id} not found")]
    TransactionNotFound {
        /// The id that was looked up
        id: TransactionId,
    },

    /// Listing found no transactions at all
    ///
    /// An empty store is reported as not-found rather than an empty list.
    #[error("No transactions found")]
    NoTransactions,

    /// A payment supplied a field that only the server may assign
    ///
    /// Non-retryable; the caller must correct the payload.
    #[error("Insertion not permitted: {field} is assigned by the server")]
    InsertionNotPermitted {
        /// The first offending field
        field: &'static str,
    },

    /// The repository or its storage transaction failed
    ///
    /// The storage transaction is rolled back and the cache is not touched.
    #[error("Store failure during {operation}: {message}")]
    StoreFailure {
        /// Repository operation that failed
        operation: String,
        /// Description of the failure
        message: String,
    },

    /// Command file not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading commands or writing views
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// A command record could not be parsed
    ///
    /// Recoverable - the record is skipped and replay continues.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

/// Coarse classification of [`PaymentError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InsertionNotPermitted,
    StoreFailure,
    Input,
}

// Conversion from io::Error to PaymentError
impl From<std::io::Error> for PaymentError {
    fn from(error: std::io::Error) -> Self {
        PaymentError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to PaymentError
impl From<csv::Error> for PaymentError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        PaymentError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl PaymentError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::TransactionNotFound { .. } | PaymentError::NoTransactions => {
                ErrorKind::NotFound
            }
            PaymentError::InsertionNotPermitted { .. } => ErrorKind::InsertionNotPermitted,
            PaymentError::StoreFailure { .. } => ErrorKind::StoreFailure,
            PaymentError::FileNotFound { .. }
            | PaymentError::IoError { .. }
            | PaymentError::ParseError { .. } => ErrorKind::Input,
        }
    }

    /// Whether the error means the requested data does not exist
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Create a TransactionNotFound error
    pub fn transaction_not_found(id: TransactionId) -> Self {
        PaymentError::TransactionNotFound { id }
    }

    /// Create an InsertionNotPermitted error
    pub fn insertion_not_permitted(field: &'static str) -> Self {
        PaymentError::InsertionNotPermitted { field }
    }

    /// Create a StoreFailure error
    pub fn store_failure(operation: &str, message: impl Into<String>) -> Self {
        PaymentError::StoreFailure {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Create a ParseError error
    pub fn parse_error(line: Option<u64>, message: impl Into<String>) -> Self {
        PaymentError::ParseError {
            line,
            message: message.into(),
        }
    }
}
