//! Transfer objects exposed over the API and their conversions from store
//! entities. Callers only ever see the uuid of an entity, never its
//! process-local numeric id.

use bankledger_core::{Account, Entity, Transaction, TransactionType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDto {
    pub id: String,
    pub currency: String,
    pub total: Decimal,
    pub transaction_history: Vec<TransactionDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDto {
    pub id: String,
    pub amount: Decimal,
    pub currency: String,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AccountCreateDto {
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AmountDto {
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransferDto {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

fn uuid_string<T: Entity>(entity: &T) -> String {
    entity.uuid().map(|uuid| uuid.to_string()).unwrap_or_default()
}

impl From<Transaction> for TransactionDto {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: uuid_string(&transaction),
            amount: transaction.amount.unwrap_or_default(),
            currency: transaction.currency.unwrap_or_default(),
            transaction_type: transaction.transaction_type,
            description: transaction.description,
            created_at: transaction.meta.created_at.map(|at| at.to_string()),
        }
    }
}

impl From<Account> for AccountDto {
    fn from(account: Account) -> Self {
        Self {
            id: uuid_string(&account),
            currency: account.currency,
            total: account.total,
            transaction_history: account
                .transaction_history
                .into_iter()
                .map(TransactionDto::from)
                .collect(),
        }
    }
}
