//! Payment Transaction Service Library
//! # Overview
//!
//! A payment transaction service exposing four operations over a relational
//! store, fronted by a region cache:
//!
//! - **find_by_id**: Look up one transaction, served from the cache when possible
//! - **find_all**: List every transaction; an empty store is reported as not-found
//! - **pay**: Authorize a new payment, stamping its authorization fields
//! - **reverse**: Void a payment, marking its description `DENIED`
//!
//! # Architecture
//!
//! - [`types`] - Entities, views, commands and errors
//! - [`core`] - Business logic components:
//!   - [`core::service`] - Operations, invariants and cache coherence
//!   - [`core::repository`] - In-memory store with units of work
//!   - [`core::cache`] - Region cache
//!   - [`core::mapper`] - Entity to view projection
//! - [`io`] - Command file parsing and view output
//! - [`strategy`] - Sync and async command replay
//! - [`cli`] - CLI arguments parsing and logging setup
//!
//! # Consistency
//!
//! Each operation runs in exactly one storage transaction. The cache is only
//! touched after that transaction commits; `pay` evicts the whole region and
//! `reverse` replaces the entry for the reversed id.

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{InMemoryRepository, RegionCache, ServiceConfig, TransactionService};
pub use types::{
    Command, Description, ErrorKind, PaymentError, PaymentMethod, Status, Transaction,
    TransactionId, TransactionView,
};
