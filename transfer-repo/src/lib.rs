//! # Transfer Repo
//!
//! Outbound persistence adapters for the transfer service: a SQLite-backed
//! store implementing the `TransferRepository` and `UserAccountRepository`
//! ports, and an in-memory, TTL-leased implementation of the `LockService`
//! port.

pub mod locks;
pub mod sqlite;
mod types;

#[cfg(test)]
mod sqlite_tests;

pub use locks::InMemoryLockRegistry;
pub use sqlite::SqliteTransferRepo;
