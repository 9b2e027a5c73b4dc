//! Core types and traits for bankledger stores.
//!
//! This crate provides the [`Entity`] contract, the account and transaction
//! records, and the `AccountStore` / `TransactionStore` traits, so store
//! implementations can live in separate crates.

pub mod models;
pub mod storage;

// Re-export key types at crate root for convenience
pub use models::{Entity, EntityId, EntityMeta};
pub use models::account::Account;
pub use models::transaction::{Transaction, TransactionType};
pub use storage::{AccountStore, StoreError, TransactionStore};
