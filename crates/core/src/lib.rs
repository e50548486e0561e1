//! Memberledger Core - Domain entities, services, and traits.
//!
//! This crate contains the balance recomputation logic for member ledger
//! tables (savings, contributions, loans). It is database-agnostic and
//! defines traits that are implemented by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod ledger;

// Re-export common types from the ledger module
pub use ledger::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
