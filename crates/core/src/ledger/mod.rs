//! Ledger module - running-balance recomputation for member ledger tables.

pub mod engine;
pub mod marker;
mod model;
pub mod ordering;
pub mod service;
mod traits;
pub mod verifier;

pub use engine::*;
pub use marker::*;
pub use model::*;
pub use ordering::*;
pub use service::*;
pub use traits::*;
pub use verifier::*;

#[cfg(test)]
mod ordering_tests;
