//! Append-only transaction ledger.
//!
//! Entries are validated on save and can never be edited or removed one by
//! one. `delete_all` exists for tests and tooling that need a clean slate.

use bankledger_core::{EntityId, StoreError, Transaction, TransactionStore};
use uuid::Uuid;

use crate::InMemoryStore;

#[derive(Default)]
pub struct InMemoryTransactionStore {
    store: InMemoryStore<Transaction>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new(),
        }
    }
}

impl TransactionStore for InMemoryTransactionStore {
    fn save(&self, transaction: &Transaction) -> Result<Transaction, StoreError> {
        self.store.insert(transaction)
    }

    fn get_by_id(&self, uuid: &Uuid) -> Option<Transaction> {
        self.store.get_by_id(uuid)
    }

    fn get_all(&self) -> Vec<Transaction> {
        self.store.get_all()
    }

    fn delete(&self, uuid: &Uuid) -> Result<Transaction, StoreError> {
        tracing::warn!(%uuid, "Rejected attempt to delete a ledger entry");
        Err(StoreError::Unsupported(
            "transactions are immutable once recorded and cannot be removed",
        ))
    }

    fn delete_all(&self) -> Vec<Transaction> {
        self.store.clear()
    }

    fn list_by_owner(&self, account_id: EntityId) -> Vec<Transaction> {
        self.store
            .filter(|transaction| transaction.owner_account_id == Some(account_id))
    }
}
