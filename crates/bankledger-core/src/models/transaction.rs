use std::fmt::Display;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Entity, EntityId, EntityMeta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Credit,
    Debit,
    Transfer,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Credit => f.write_str("CREDIT"),
            TransactionType::Debit => f.write_str("DEBIT"),
            TransactionType::Transfer => f.write_str("TRANSFER"),
        }
    }
}

/// One ledger entry, owned by the account whose history it belongs to.
///
/// Required fields are optional here so that a candidate missing several of
/// them can be rejected with a single error naming all of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    pub meta: EntityMeta,
    pub owner_account_id: Option<EntityId>,
    pub other_account_id: Option<EntityId>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub description: Option<String>,
}

impl Transaction {
    pub fn new(
        owner_account_id: EntityId,
        other_account_id: EntityId,
        amount: Decimal,
        currency: impl Into<String>,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            meta: EntityMeta::default(),
            owner_account_id: Some(owner_account_id),
            other_account_id: Some(other_account_id),
            amount: Some(amount),
            currency: Some(currency.into()),
            transaction_type: Some(transaction_type),
            description: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

impl Entity for Transaction {
    const KIND: &'static str = "transaction";

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        match self.currency.as_deref() {
            Some(currency) if !currency.trim().is_empty() => {}
            _ => violations.push("currency is missing".to_string()),
        }
        if self.owner_account_id.is_none() {
            violations.push("owner account id is missing".to_string());
        }
        if self.other_account_id.is_none() {
            violations.push("other account id is missing".to_string());
        }
        if self.amount.is_none() {
            violations.push("amount is missing".to_string());
        }
        if self.transaction_type.is_none() {
            violations.push("transaction type is missing".to_string());
        }
        violations
    }
}
