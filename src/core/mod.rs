//! Core business logic module
//!
//! This module contains the transaction service and its collaborators:
//! - `traits` - Ports for storage, caching and authorization
//! - `service` - Payment operations, invariants and cache coherence
//! - `repository` - In-memory relational store with units of work
//! - `cache` - Region cache (DashMap) and the no-op cache
//! - `mapper` - Entity to view projection
//! - `authorizer` - Server-stamped authorization fields

pub mod authorizer;
pub mod cache;
pub mod mapper;
pub mod repository;
pub mod service;
pub mod traits;

pub use authorizer::{Authorization, FixedAuthorizer};
pub use cache::{CacheKey, CacheStats, CachedEntry, NoCache, RegionCache};
pub use repository::InMemoryRepository;
pub use service::{ServiceConfig, TransactionService, TRANSACTION_REGION};
pub use traits::{Authorizer, Cache, Repository, UnitOfWork};
