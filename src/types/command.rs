//! Service commands replayed by the CLI
//!
//! Each [`Command`] maps one-to-one onto a `TransactionService` operation.

use super::transaction::{Transaction, TransactionId};
use std::fmt;

/// A single service invocation read from a command file
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Look up one transaction
    FindById(TransactionId),

    /// List every transaction
    FindAll,

    /// Authorize a new payment
    Pay(Transaction),

    /// Void an existing payment
    Reverse(TransactionId),
}

impl Command {
    /// Whether the command leaves the store untouched
    ///
    /// Read-only commands may run concurrently with each other; every other
    /// command must observe all commands that precede it.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Command::FindById(_) | Command::FindAll)
    }

    /// Name used in logs and in the `command` output column
    pub fn name(&self) -> &'static str {
        match self {
            Command::FindById(_) => "find",
            Command::FindAll => "find_all",
            Command::Pay(_) => "pay",
            Command::Reverse(_) => "reverse",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::FindById(id) | Command::Reverse(id) => write!(f, "{} {}", self.name(), id),
            Command::FindAll | Command::Pay(_) => f.write_str(self.name()),
        }
    }
}
