//! Transaction service orchestration
//!
//! This module provides [`TransactionService`], which serves the four
//! payment operations on top of a [`Repository`], a [`Cache`] and an
//! [`Authorizer`].
//!
//! # Architecture
//!
//! ```text
//! TransactionService
//!     ├── Arc<dyn Repository>  (units of work over the store)
//!     ├── Arc<dyn Cache>       (region `transacao` by default)
//!     └── Arc<dyn Authorizer>  (nsu / authorization code)
//! ```
//!
//! # Cache coherence
//!
//! - `find_by_id` caches under `Id(id)`, `find_all` under `Operation("find_all")`
//! - `pay` evicts the whole region after commit
//! - `reverse` replaces `Id(id)` after commit
//!
//! The cache is only touched after a successful commit, so a failed
//! operation leaves it exactly as it was. Read fills capture the region
//! epoch before opening their unit of work and are dropped if a write
//! evicted or replaced entries in the meantime.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::authorizer::FixedAuthorizer;
use super::cache::{CacheKey, CachedEntry, NoCache, RegionCache};
use super::mapper;
use super::traits::{Authorizer, Cache, Repository, UnitOfWork};
use crate::types::{PaymentError, Status, Transaction, TransactionId, TransactionView};

/// Default cache region for transaction responses
pub const TRANSACTION_REGION: &str = "transacao";

/// Cache key of the `find_all` response
pub const FIND_ALL_KEY: CacheKey = CacheKey::Operation("find_all");

/// Service-level configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Cache region holding transaction responses
    pub cache_region: String,

    /// Whether responses are cached at all
    pub cache_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_region: TRANSACTION_REGION.to_string(),
            cache_enabled: true,
        }
    }
}

/// Payment transaction service
///
/// Cheap to clone; clones share the same repository, cache and authorizer,
/// so a single service can be handed to many worker threads.
#[derive(Debug, Clone)]
pub struct TransactionService {
    repository: Arc<dyn Repository>,
    cache: Arc<dyn Cache>,
    authorizer: Arc<dyn Authorizer>,
    region: String,
}

impl TransactionService {
    /// Create a service from explicit collaborators
    pub fn new(
        repository: Arc<dyn Repository>,
        cache: Arc<dyn Cache>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            repository,
            cache,
            authorizer,
            region: TRANSACTION_REGION.to_string(),
        }
    }

    /// Create a service from configuration
    ///
    /// Uses a fresh [`RegionCache`] (or [`NoCache`] when caching is disabled)
    /// and the [`FixedAuthorizer`].
    pub fn from_config(config: &ServiceConfig, repository: Arc<dyn Repository>) -> Self {
        let cache: Arc<dyn Cache> = if config.cache_enabled {
            Arc::new(RegionCache::new())
        } else {
            Arc::new(NoCache)
        };

        Self::new(repository, cache, Arc::new(FixedAuthorizer)).with_region(&config.cache_region)
    }

    /// Use a different cache region
    pub fn with_region(mut self, region: &str) -> Self {
        self.region = region.to_string();
        self
    }

    /// Cache region this service reads and writes
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Look up a transaction by id
    ///
    /// # Returns
    ///
    /// * `Ok(TransactionView)` - From the cache, or from the store on a miss
    /// * `Err(PaymentError::TransactionNotFound)` - If the store has no such id
    /// * `Err(PaymentError::StoreFailure)` - If the store failed
    pub fn find_by_id(&self, id: TransactionId) -> Result<TransactionView, PaymentError> {
        let key = CacheKey::Id(id);
        if let Some(CachedEntry::One(view)) = self.cache.get(&self.region, &key) {
            debug!(id, "transaction served from cache");
            return Ok(view);
        }

        let epoch = self.cache.epoch(&self.region);
        let view = self.in_unit_of_work("find_by_id", |unit| {
            let transaction = unit
                .find_by_id(id)?
                .ok_or_else(|| PaymentError::transaction_not_found(id))?;
            mapper::project(&transaction)
        })?;

        if !self
            .cache
            .put_if_current(&self.region, key, CachedEntry::One(view.clone()), epoch)
        {
            debug!(id, "cache fill skipped");
        }
        Ok(view)
    }

    /// List every transaction
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<TransactionView>)` - Non-empty, ordered by id
    /// * `Err(PaymentError::NoTransactions)` - If the store is empty
    /// * `Err(PaymentError::StoreFailure)` - If the store failed
    pub fn find_all(&self) -> Result<Vec<TransactionView>, PaymentError> {
        if let Some(CachedEntry::Many(views)) = self.cache.get(&self.region, &FIND_ALL_KEY) {
            debug!(count = views.len(), "transaction list served from cache");
            return Ok(views);
        }

        let epoch = self.cache.epoch(&self.region);
        let views = self.in_unit_of_work("find_all", |unit| {
            let transactions = unit.find_all()?;
            if transactions.is_empty() {
                return Err(PaymentError::NoTransactions);
            }
            mapper::project_all(&transactions)
        })?;

        if !self
            .cache
            .put_if_current(&self.region, FIND_ALL_KEY, CachedEntry::Many(views.clone()), epoch)
        {
            debug!(count = views.len(), "cache fill skipped");
        }
        Ok(views)
    }

    /// Authorize a new payment
    ///
    /// The payment must not carry any server-owned field. Accepted payments
    /// are stamped by the authorizer, persisted as `AUTHORIZED`, and the
    /// cache region is evicted so later reads see the new row.
    ///
    /// # Returns
    ///
    /// * `Ok(TransactionView)` - The persisted payment with its new id
    /// * `Err(PaymentError::InsertionNotPermitted)` - If a server-owned field was supplied
    /// * `Err(PaymentError::StoreFailure)` - If the store failed
    pub fn pay(&self, mut transaction: Transaction) -> Result<TransactionView, PaymentError> {
        if let Some(field) = transaction.server_owned_field() {
            warn!(field, "payment rejected");
            return Err(PaymentError::insertion_not_permitted(field));
        }

        let authorization = self.authorizer.authorize(&transaction);
        transaction.description.nsu = Some(authorization.nsu);
        transaction.description.authorization_code = Some(authorization.authorization_code);
        transaction.description.status = Some(Status::Authorized);

        let view = self.in_unit_of_work("pay", |unit| {
            let saved = unit.save(transaction)?;
            mapper::project(&saved)
        })?;

        self.cache.evict_region(&self.region);
        info!(id = view.id, nsu = %view.description.nsu, "payment authorized");
        Ok(view)
    }

    /// Reverse (void) a payment
    ///
    /// Flips the description status to `DENIED` and re-saves only the
    /// description. Reversing an already denied payment is allowed and
    /// leaves it denied.
    ///
    /// # Returns
    ///
    /// * `Ok(TransactionView)` - The payment with status `DENIED`
    /// * `Err(PaymentError::TransactionNotFound)` - If the store has no such id
    /// * `Err(PaymentError::StoreFailure)` - If the store failed
    pub fn reverse(&self, id: TransactionId) -> Result<TransactionView, PaymentError> {
        let view = self.in_unit_of_work("reverse", |unit| {
            let mut transaction = unit
                .find_by_id(id)?
                .ok_or_else(|| PaymentError::transaction_not_found(id))?;

            transaction.description.status = Some(Status::Denied);
            transaction.description = unit.save_description(transaction.description)?;
            mapper::project(&transaction)
        })?;

        let view = self
            .cache
            .put_and_return(&self.region, CacheKey::Id(id), CachedEntry::One(view))
            .into_one()
            .ok_or_else(|| PaymentError::store_failure("reverse", "cache returned a list"))?;
        info!(id, "payment reversed");
        Ok(view)
    }

    /// Run `work` inside one storage transaction
    ///
    /// Commits when `work` succeeds and rolls back when it fails. A rollback
    /// failure is logged; the original error is what the caller sees.
    fn in_unit_of_work<'s, T, F>(&'s self, operation: &'static str, work: F) -> Result<T, PaymentError>
    where
        F: FnOnce(&mut (dyn UnitOfWork + 's)) -> Result<T, PaymentError>,
    {
        let mut unit = self.repository.begin()?;

        match work(unit.as_mut()) {
            Ok(value) => {
                unit.commit()?;
                Ok(value)
            }
            Err(err) => {
                debug!(operation, error = %err, "rolling back");
                if let Err(rollback_err) = unit.rollback() {
                    error!(operation, error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}
