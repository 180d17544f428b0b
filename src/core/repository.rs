//! In-memory relational store for transactions
//!
//! [`InMemoryRepository`] models the three tables behind the service:
//!
//! ```text
//! transaction(id, description_id, payment_method_id)
//! description(id, value, establishment, merchant_code, nsu, authorization_code, status)
//! payment_method(id, payment_type, instalments)
//! ```
//!
//! `transaction.description_id` is a one-to-one foreign key and
//! `transaction.payment_method_id` a plain foreign key. The description's
//! `nsu`, `authorization_code` and `status` are NOT NULL.
//!
//! # Storage transactions
//!
//! [`Repository::begin`] takes the table lock and hands out a unit of work
//! holding a private copy of the tables. Reads and writes go to the copy;
//! `commit` publishes it, `rollback` (or drop) discards it. Units of work are
//! therefore fully serialized.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::traits::{Repository, UnitOfWork};
use crate::types::{
    Description, DescriptionId, PaymentError, PaymentMethod, PaymentMethodId, Transaction,
    TransactionId,
};

/// Row of the `transaction` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TransactionRow {
    description_id: DescriptionId,
    payment_method_id: PaymentMethodId,
}

/// Every table plus its id sequence
#[derive(Debug, Clone, Default)]
struct Tables {
    transactions: BTreeMap<TransactionId, TransactionRow>,
    descriptions: BTreeMap<DescriptionId, Description>,
    payment_methods: BTreeMap<PaymentMethodId, PaymentMethod>,
    last_transaction_id: TransactionId,
    last_description_id: DescriptionId,
    last_payment_method_id: PaymentMethodId,
}

impl Tables {
    /// Join a transaction row with its description and payment method
    fn load(&self, id: TransactionId, row: &TransactionRow) -> Result<Transaction, PaymentError> {
        let description = self
            .descriptions
            .get(&row.description_id)
            .cloned()
            .ok_or_else(|| {
                PaymentError::store_failure(
                    "load",
                    format!("transaction {} references missing description {}", id, row.description_id),
                )
            })?;
        let payment_method = self
            .payment_methods
            .get(&row.payment_method_id)
            .cloned()
            .ok_or_else(|| {
                PaymentError::store_failure(
                    "load",
                    format!(
                        "transaction {} references missing payment method {}",
                        id, row.payment_method_id
                    ),
                )
            })?;

        Ok(Transaction {
            id: Some(id),
            description,
            payment_method,
        })
    }

    /// Insert or merge a payment method, returning its id
    fn upsert_payment_method(&mut self, mut payment_method: PaymentMethod) -> Result<PaymentMethodId, PaymentError> {
        let id = match payment_method.id {
            Some(id) if self.payment_methods.contains_key(&id) => id,
            Some(id) => {
                return Err(PaymentError::store_failure(
                    "save",
                    format!("foreign key violation: payment method {} does not exist", id),
                ))
            }
            None => {
                self.last_payment_method_id += 1;
                self.last_payment_method_id
            }
        };

        payment_method.id = Some(id);
        self.payment_methods.insert(id, payment_method);
        Ok(id)
    }

    /// Insert or merge a description owned by `owner`, returning its id
    fn upsert_description(
        &mut self,
        mut description: Description,
        owner: Option<TransactionId>,
    ) -> Result<DescriptionId, PaymentError> {
        check_not_null(&description, "save")?;

        let id = match description.id {
            Some(id) if self.descriptions.contains_key(&id) => {
                let taken = self
                    .transactions
                    .iter()
                    .any(|(tx_id, row)| row.description_id == id && Some(*tx_id) != owner);
                if taken {
                    return Err(PaymentError::store_failure(
                        "save",
                        format!("unique violation: description {} belongs to another transaction", id),
                    ));
                }
                id
            }
            Some(id) => {
                return Err(PaymentError::store_failure(
                    "save",
                    format!("description {} does not exist", id),
                ))
            }
            None => {
                self.last_description_id += 1;
                self.last_description_id
            }
        };

        description.id = Some(id);
        self.descriptions.insert(id, description);
        Ok(id)
    }
}

/// NOT NULL constraints of the `description` table
fn check_not_null(description: &Description, operation: &str) -> Result<(), PaymentError> {
    let violation = if description.status.is_none() {
        Some("status")
    } else if description.nsu.as_deref().map_or(true, str::is_empty) {
        Some("nsu")
    } else if description
        .authorization_code
        .as_deref()
        .map_or(true, str::is_empty)
    {
        Some("authorization_code")
    } else {
        None
    };

    match violation {
        Some(column) => Err(PaymentError::store_failure(
            operation,
            format!("not-null violation: description.{} is required", column),
        )),
        None => Ok(()),
    }
}

/// Mutex-guarded in-memory store
///
/// Safe to share across threads behind an `Arc`.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
}

impl InMemoryRepository {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed transactions
    pub fn transaction_count(&self) -> Result<usize, PaymentError> {
        Ok(self.lock("transaction_count")?.transactions.len())
    }

    /// Committed state of a description row
    pub fn description(&self, id: DescriptionId) -> Result<Option<Description>, PaymentError> {
        Ok(self.lock("description")?.descriptions.get(&id).cloned())
    }

    fn lock(&self, operation: &str) -> Result<MutexGuard<'_, Tables>, PaymentError> {
        self.tables
            .lock()
            .map_err(|_| PaymentError::store_failure(operation, "repository lock poisoned"))
    }
}

impl Repository for InMemoryRepository {
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, PaymentError> {
        let committed = self.lock("begin")?;
        Ok(Box::new(InMemoryUnitOfWork {
            committed,
            working: None,
        }))
    }
}

/// Storage transaction over [`InMemoryRepository`]
///
/// Reads go straight to the committed tables until the first write, which
/// takes a private copy. Read-only units never copy.
struct InMemoryUnitOfWork<'a> {
    /// Holds the table lock for the lifetime of the unit of work
    committed: MutexGuard<'a, Tables>,
    working: Option<Tables>,
}

impl InMemoryUnitOfWork<'_> {
    fn tables(&self) -> &Tables {
        self.working.as_ref().unwrap_or(&*self.committed)
    }

    fn tables_mut(&mut self) -> &mut Tables {
        let committed = &self.committed;
        self.working.get_or_insert_with(|| Tables::clone(&**committed))
    }
}

impl UnitOfWork for InMemoryUnitOfWork<'_> {
    fn find_by_id(&mut self, id: TransactionId) -> Result<Option<Transaction>, PaymentError> {
        let tables = self.tables();
        tables
            .transactions
            .get(&id)
            .map(|row| tables.load(id, row))
            .transpose()
    }

    fn find_all(&mut self) -> Result<Vec<Transaction>, PaymentError> {
        let tables = self.tables();
        tables
            .transactions
            .iter()
            .map(|(id, row)| tables.load(*id, row))
            .collect()
    }

    fn save(&mut self, transaction: Transaction) -> Result<Transaction, PaymentError> {
        if let Some(id) = transaction.id {
            if !self.tables().transactions.contains_key(&id) {
                return Err(PaymentError::store_failure(
                    "save",
                    format!("transaction {} does not exist", id),
                ));
            }
        }

        let tables = self.tables_mut();
        let payment_method_id = tables.upsert_payment_method(transaction.payment_method)?;
        let description_id = tables.upsert_description(transaction.description, transaction.id)?;

        let id = match transaction.id {
            Some(id) => id,
            None => {
                tables.last_transaction_id += 1;
                tables.last_transaction_id
            }
        };

        let row = TransactionRow {
            description_id,
            payment_method_id,
        };
        tables.transactions.insert(id, row);
        tables.load(id, &row)
    }

    fn save_description(&mut self, description: Description) -> Result<Description, PaymentError> {
        let id = description.id.ok_or_else(|| {
            PaymentError::store_failure("save_description", "description has no id")
        })?;
        if !self.tables().descriptions.contains_key(&id) {
            return Err(PaymentError::store_failure(
                "save_description",
                format!("description {} does not exist", id),
            ));
        }
        check_not_null(&description, "save_description")?;

        self.tables_mut().descriptions.insert(id, description.clone());
        Ok(description)
    }

    fn commit(self: Box<Self>) -> Result<(), PaymentError> {
        let InMemoryUnitOfWork {
            mut committed,
            working,
        } = *self;
        if let Some(working) = working {
            *committed = working;
        }
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<(), PaymentError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;
    use rust_decimal::Decimal;

    fn authorized() -> Transaction {
        let mut description = Description::new(Decimal::new(496, 0), "PUC Minas", "00000000000000");
        description.nsu = Some("1234567890".to_string());
        description.authorization_code = Some("147258369".to_string());
        description.status = Some(Status::Authorized);
        Transaction::new(description, PaymentMethod::new("DEBITO", 1))
    }

    fn save_committed(repository: &InMemoryRepository, transaction: Transaction) -> Transaction {
        let mut unit = repository.begin().unwrap();
        let saved = unit.save(transaction).unwrap();
        unit.commit().unwrap();
        saved
    }

    #[test]
    fn test_save_assigns_identifiers() {
        let repository = InMemoryRepository::new();

        let saved = save_committed(&repository, authorized());

        assert_eq!(saved.id, Some(1));
        assert_eq!(saved.description.id, Some(1));
        assert_eq!(saved.payment_method.id, Some(1));
        assert_eq!(repository.transaction_count().unwrap(), 1);
    }

    #[test]
    fn test_ids_increase_per_insert() {
        let repository = InMemoryRepository::new();

        save_committed(&repository, authorized());
        let second = save_committed(&repository, authorized());

        assert_eq!(second.id, Some(2));
        assert_eq!(second.description.id, Some(2));
    }

    #[test]
    fn test_find_by_id_round_trip() {
        let repository = InMemoryRepository::new();
        let saved = save_committed(&repository, authorized());

        let mut unit = repository.begin().unwrap();
        let found = unit.find_by_id(1).unwrap();
        assert_eq!(found, Some(saved));
        assert_eq!(unit.find_by_id(2).unwrap(), None);
    }

    #[test]
    fn test_find_all_ordered_by_id() {
        let repository = InMemoryRepository::new();
        for _ in 0..3 {
            save_committed(&repository, authorized());
        }

        let mut unit = repository.begin().unwrap();
        let ids: Vec<_> = unit
            .find_all()
            .unwrap()
            .into_iter()
            .map(|t| t.id.unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_uncommitted_changes_are_discarded() {
        let repository = InMemoryRepository::new();

        {
            let mut unit = repository.begin().unwrap();
            unit.save(authorized()).unwrap();
            // dropped without commit
        }
        let mut unit = repository.begin().unwrap();
        unit.save(authorized()).unwrap();
        unit.rollback().unwrap();

        assert_eq!(repository.transaction_count().unwrap(), 0);
    }

    #[test]
    fn test_save_rejects_missing_status() {
        let repository = InMemoryRepository::new();
        let mut transaction = authorized();
        transaction.description.status = None;

        let mut unit = repository.begin().unwrap();
        let result = unit.save(transaction);

        assert!(matches!(result, Err(PaymentError::StoreFailure { .. })));
        assert!(result.unwrap_err().to_string().contains("description.status"));
    }

    #[test]
    fn test_save_rejects_empty_nsu() {
        let repository = InMemoryRepository::new();
        let mut transaction = authorized();
        transaction.description.nsu = Some(String::new());

        let mut unit = repository.begin().unwrap();
        let result = unit.save(transaction);
        assert!(result.unwrap_err().to_string().contains("description.nsu"));
    }

    #[test]
    fn test_save_rejects_unknown_payment_method() {
        let repository = InMemoryRepository::new();
        let mut transaction = authorized();
        transaction.payment_method.id = Some(42);

        let mut unit = repository.begin().unwrap();
        let result = unit.save(transaction);
        assert!(result.unwrap_err().to_string().contains("foreign key violation"));
    }

    #[test]
    fn test_save_rejects_shared_description() {
        let repository = InMemoryRepository::new();
        let first = save_committed(&repository, authorized());

        let mut second = authorized();
        second.description.id = first.description.id;

        let mut unit = repository.begin().unwrap();
        let result = unit.save(second);
        assert!(result.unwrap_err().to_string().contains("unique violation"));
    }

    #[test]
    fn test_save_existing_transaction_updates_in_place() {
        let repository = InMemoryRepository::new();
        let mut saved = save_committed(&repository, authorized());
        saved.payment_method.instalments = 3;

        let updated = save_committed(&repository, saved);

        assert_eq!(updated.id, Some(1));
        assert_eq!(updated.payment_method.instalments, 3);
        assert_eq!(repository.transaction_count().unwrap(), 1);
    }

    #[test]
    fn test_save_description_updates_status() {
        let repository = InMemoryRepository::new();
        let saved = save_committed(&repository, authorized());

        let mut description = saved.description;
        description.status = Some(Status::Denied);

        let mut unit = repository.begin().unwrap();
        let stored = unit.save_description(description).unwrap();
        unit.commit().unwrap();

        assert_eq!(stored.status, Some(Status::Denied));
        assert_eq!(
            repository.description(1).unwrap().and_then(|d| d.status),
            Some(Status::Denied)
        );
    }

    #[test]
    fn test_reads_do_not_copy_tables() {
        let repository = InMemoryRepository::new();
        save_committed(&repository, authorized());

        let mut unit = InMemoryUnitOfWork {
            committed: repository.lock("test").unwrap(),
            working: None,
        };
        assert!(unit.find_by_id(1).unwrap().is_some());
        assert_eq!(unit.find_all().unwrap().len(), 1);
        assert!(unit.working.is_none());

        unit.save(authorized()).unwrap();
        assert!(unit.working.is_some());
        assert_eq!(unit.committed.transactions.len(), 1);
        assert_eq!(unit.find_all().unwrap().len(), 2);
    }

    #[test]
    fn test_read_only_commit_keeps_committed_state() {
        let repository = InMemoryRepository::new();
        save_committed(&repository, authorized());

        let mut unit = repository.begin().unwrap();
        unit.find_all().unwrap();
        unit.commit().unwrap();

        assert_eq!(repository.transaction_count().unwrap(), 1);
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        use std::sync::Arc;
        use std::thread;

        let repository = Arc::new(InMemoryRepository::new());
        let poisoner = Arc::clone(&repository);
        let _ = thread::spawn(move || {
            let _guard = poisoner.tables.lock().unwrap();
            panic!("poison the table lock");
        })
        .join();

        assert_eq!(
            repository.transaction_count().unwrap_err(),
            PaymentError::store_failure("transaction_count", "repository lock poisoned")
        );
        assert!(repository.description(1).is_err());
        assert!(repository.begin().is_err());
    }

    #[test]
    fn test_save_description_requires_existing_row() {
        let repository = InMemoryRepository::new();
        let mut description = authorized().description;

        let mut unit = repository.begin().unwrap();
        assert!(unit.save_description(description.clone()).is_err());

        description.id = Some(7);
        let result = unit.save_description(description);
        assert!(result.unwrap_err().to_string().contains("description 7 does not exist"));
    }

    #[test]
    fn test_units_of_work_are_serialized_across_threads() {
        use std::sync::Arc;
        use std::thread;

        let repository = Arc::new(InMemoryRepository::new());

        let mut handles = vec![];
        for _ in 0..10 {
            let repository_clone = Arc::clone(&repository);
            let handle = thread::spawn(move || {
                save_committed(&repository_clone, authorized());
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(repository.transaction_count().unwrap(), 10);
        let mut unit = repository.begin().unwrap();
        let mut ids: Vec<_> = unit
            .find_all()
            .unwrap()
            .into_iter()
            .map(|t| t.id.unwrap())
            .collect();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }
}
