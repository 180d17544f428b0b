//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `transaction`: Persistence entities and identifiers
//! - `view`: Transport-side read models
//! - `command`: Service commands replayed by the CLI
//! - `error`: Error types for the payment service

pub mod command;
pub mod error;
pub mod transaction;
pub mod view;

pub use command::Command;
pub use error::{ErrorKind, PaymentError};
pub use transaction::{
    Description, DescriptionId, PaymentMethod, PaymentMethodId, Status, Transaction,
    TransactionId,
};
pub use view::{DescriptionView, PaymentMethodView, TransactionView};
