use rust_decimal::Decimal;

use super::{transaction::Transaction, Entity, EntityMeta};

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub meta: EntityMeta,
    pub currency: String,
    pub total: Decimal,
    /// Filled in on read from the transaction store; never stored.
    pub transaction_history: Vec<Transaction>,
}

impl Account {
    pub fn new(currency: impl Into<String>, total: Decimal) -> Self {
        Self {
            meta: EntityMeta::default(),
            currency: currency.into(),
            total,
            transaction_history: Vec::new(),
        }
    }
}

impl Entity for Account {
    const KIND: &'static str = "account";

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.currency.trim().is_empty() {
            violations.push("currency is missing".to_string());
        }
        if self.total < Decimal::ZERO {
            violations.push("total is negative".to_string());
        }
        violations
    }
}
