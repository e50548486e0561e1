//! Ledger repository and service traits.
//!
//! These traits define the contract for ledger operations without any
//! database-specific types, allowing for different storage implementations.

use async_trait::async_trait;

use super::model::{
    BalanceUpdate, FlagUpdate, LedgerEntry, LedgerTable, MarkingSummary, RecalculationRun,
    RecomputeSummary, VerificationReport,
};
use crate::errors::Result;

/// Trait defining the contract for ledger storage operations.
///
/// The core does its own ordering; `fetch_entries` need not pre-sort.
/// All write-backs are keyed by the entry's stable row id.
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    /// Loads every transaction row of one table, in no particular order.
    fn fetch_entries(&self, table: LedgerTable) -> Result<Vec<LedgerEntry>>;

    /// Bulk-writes balance (and, for loans, total) values.
    ///
    /// Returns the number of rows updated. The batch is applied atomically;
    /// a failure leaves none of it behind.
    async fn apply_balance_updates(
        &self,
        table: LedgerTable,
        updates: &[BalanceUpdate],
    ) -> Result<usize>;

    /// Bulk-writes operator flags (opening markers).
    async fn apply_flag_updates(&self, table: LedgerTable, updates: &[FlagUpdate])
        -> Result<usize>;
}

/// Trait defining the contract for ledger maintenance operations.
///
/// The service layer coordinates the marker, the engine, and the verifier
/// over one storage repository.
#[async_trait]
pub trait LedgerMaintenanceServiceTrait: Send + Sync {
    /// Seeds the opening entry of every account in the table.
    async fn mark_opening_balances(&self, table: LedgerTable) -> Result<MarkingSummary>;

    /// Recomputes the running balance column of the whole table.
    async fn recompute_balances(&self, table: LedgerTable) -> Result<RecomputeSummary>;

    /// Audits stored balances; never mutates the table.
    fn verify_balances(&self, table: LedgerTable) -> Result<VerificationReport>;

    /// Full pass: marker, then engine, then verifier.
    async fn recalculate(&self, table: LedgerTable) -> Result<RecalculationRun>;
}
