use std::sync::Arc;

use bankledger_core::{Account, AccountStore, Entity, StoreError, TransactionStore};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::InMemoryStore;

/// Account records plus a handle on the ledger used to rebuild each account's
/// history at read time.
pub struct InMemoryAccountStore {
    store: InMemoryStore<Account>,
    transactions: Arc<dyn TransactionStore>,
}

impl InMemoryAccountStore {
    pub fn new(transactions: Arc<dyn TransactionStore>) -> Self {
        Self {
            store: InMemoryStore::new(),
            transactions,
        }
    }

    fn with_history(&self, mut account: Account) -> Account {
        account.transaction_history = match account.id() {
            Some(id) => self.transactions.list_by_owner(id),
            None => Vec::new(),
        };
        account
    }
}

impl AccountStore for InMemoryAccountStore {
    fn create(&self, currency: &str, initial_total: Decimal) -> Result<Account, StoreError> {
        let account = self.store.insert(&Account::new(currency, initial_total))?;
        Ok(self.with_history(account))
    }

    fn get_by_id(&self, uuid: &Uuid) -> Result<Account, StoreError> {
        self.store
            .get_by_id(uuid)
            .map(|account| self.with_history(account))
            .ok_or_else(|| StoreError::not_found(Account::KIND, uuid))
    }

    fn get_all(&self) -> Vec<Account> {
        self.store
            .get_all()
            .into_iter()
            .map(|account| self.with_history(account))
            .collect()
    }

    fn update_total(&self, uuid: &Uuid, total: Decimal) -> Result<Account, StoreError> {
        let account = self.store.update(uuid, |account| {
            if total < Decimal::ZERO {
                return Err(StoreError::Validation {
                    entity: Account::KIND,
                    violations: vec!["total is negative".to_string()],
                });
            }
            account.total = total;
            Ok(())
        })?;
        Ok(self.with_history(account))
    }
}
