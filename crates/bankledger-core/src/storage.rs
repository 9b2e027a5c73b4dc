use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{account::Account, transaction::Transaction, EntityId};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{entity} validation failed: {}", .violations.join("; "))]
    Validation {
        entity: &'static str,
        violations: Vec<String>,
    },
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// Append-only ledger of transactions.
///
/// Every value returned is a copy; nothing handed out aliases stored state.
pub trait TransactionStore: Send + Sync {
    fn save(&self, transaction: &Transaction) -> Result<Transaction, StoreError>;
    fn get_by_id(&self, uuid: &Uuid) -> Option<Transaction>;
    fn get_all(&self) -> Vec<Transaction>;
    /// Always fails: ledger entries cannot be removed once written.
    fn delete(&self, uuid: &Uuid) -> Result<Transaction, StoreError>;
    /// Bulk reset. Only meant for tests and tooling.
    fn delete_all(&self) -> Vec<Transaction>;
    fn list_by_owner(&self, account_id: EntityId) -> Vec<Transaction>;
}

/// Accounts with their derived transaction history.
pub trait AccountStore: Send + Sync {
    fn create(&self, currency: &str, initial_total: Decimal) -> Result<Account, StoreError>;
    fn get_by_id(&self, uuid: &Uuid) -> Result<Account, StoreError>;
    fn get_all(&self) -> Vec<Account>;
    fn update_total(&self, uuid: &Uuid, total: Decimal) -> Result<Account, StoreError>;
}
