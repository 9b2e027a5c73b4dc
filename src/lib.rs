//! Bankledger: accounts, an append-only transaction ledger, and the REST
//! surface over them. Stores come from `bankledger-memory`; this crate wires
//! them together behind [`service::AccountService`].

pub mod api;
pub mod config;
pub mod dto;
pub mod service;
