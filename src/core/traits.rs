//! Core traits for storage, caching and authorization
//!
//! This module defines the seams between [`TransactionService`] and its
//! collaborators, so that storage, cache and authorizer implementations can
//! be swapped without touching the service.
//!
//! [`TransactionService`]: super::TransactionService

use std::fmt::Debug;

use super::authorizer::Authorization;
use super::cache::{CacheKey, CachedEntry};
use crate::types::{Description, PaymentError, Transaction, TransactionId};

/// Persistent store for transactions
///
/// All access goes through a [`UnitOfWork`], which plays the role of a
/// single storage transaction.
pub trait Repository: Send + Sync + Debug {
    /// Open a storage transaction
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, PaymentError>;
}

/// A single open storage transaction
///
/// Nothing done through a unit of work is visible to others until
/// [`commit`](UnitOfWork::commit). Dropping it without committing discards
/// every change.
pub trait UnitOfWork {
    /// Load a transaction with its description and payment method
    fn find_by_id(&mut self, id: TransactionId) -> Result<Option<Transaction>, PaymentError>;

    /// Load every transaction, ordered by id
    fn find_all(&mut self) -> Result<Vec<Transaction>, PaymentError>;

    /// Insert or update a transaction, cascading to its description and
    /// payment method. Returns the entity with every identifier populated.
    fn save(&mut self, transaction: Transaction) -> Result<Transaction, PaymentError>;

    /// Update an existing description
    fn save_description(&mut self, description: Description) -> Result<Description, PaymentError>;

    /// Publish every change made through this unit of work
    fn commit(self: Box<Self>) -> Result<(), PaymentError>;

    /// Discard every change made through this unit of work
    fn rollback(self: Box<Self>) -> Result<(), PaymentError>;
}

/// Process-local keyed store with named regions
pub trait Cache: Send + Sync + Debug {
    /// Look up an entry
    fn get(&self, region: &str, key: &CacheKey) -> Option<CachedEntry>;

    /// Insert or replace an entry
    ///
    /// Replacing an entry advances the region's epoch.
    fn put(&self, region: &str, key: CacheKey, value: CachedEntry);

    /// Drop every entry of a region and advance its epoch
    fn evict_region(&self, region: &str);

    /// Current epoch of a region
    ///
    /// Read it before loading from the store and hand it to
    /// [`put_if_current`](Cache::put_if_current) when filling after a miss.
    fn epoch(&self, region: &str) -> u64;

    /// Fill an entry only if the region's epoch is still `epoch`
    ///
    /// Returns whether the entry was stored. A fill loaded before a
    /// concurrent write committed never overwrites that write's eviction or
    /// replacement.
    fn put_if_current(&self, region: &str, key: CacheKey, value: CachedEntry, epoch: u64) -> bool;

    /// Insert or replace an entry and hand the value back
    fn put_and_return(&self, region: &str, key: CacheKey, value: CachedEntry) -> CachedEntry {
        self.put(region, key, value.clone());
        value
    }
}

/// Source of the server-stamped authorization fields
pub trait Authorizer: Send + Sync + Debug {
    /// Authorize a prospective payment
    fn authorize(&self, transaction: &Transaction) -> Authorization;
}
