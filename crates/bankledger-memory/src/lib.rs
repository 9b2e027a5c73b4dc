//! In-memory store backend for the bankledger.
//!
//! [`InMemoryStore`] is the generic, copy-isolating container; the account and
//! transaction stores specialise it and implement the traits from
//! `bankledger-core`.

mod accounts;
mod store;
mod transactions;

pub use accounts::InMemoryAccountStore;
pub use store::InMemoryStore;
pub use transactions::InMemoryTransactionStore;
