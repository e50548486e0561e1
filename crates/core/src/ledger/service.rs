//! Ledger maintenance service.
//!
//! Thin orchestration over one storage repository: fetch a table, run the
//! marker/engine/verifier, and write the results back. Each account's
//! balance updates are applied as one batch so an interrupted run leaves
//! every written account internally consistent; recomputation is idempotent,
//! so recovery is simply a re-run.

use log::{debug, info};
use std::sync::Arc;

use super::engine::BalanceEngine;
use super::marker::OpeningBalanceMarker;
use super::model::{
    LedgerTable, MarkingSummary, RecalculationRun, RecomputeSummary, VerificationReport,
};
use super::traits::{LedgerMaintenanceServiceTrait, LedgerRepositoryTrait};
use super::verifier::{BalanceVerifier, VerifierConfig};
use crate::errors::Result;

/// Service for recomputing and auditing ledger balance columns.
pub struct LedgerMaintenanceService {
    repository: Arc<dyn LedgerRepositoryTrait>,
    verifier_config: VerifierConfig,
}

impl LedgerMaintenanceService {
    pub fn new(repository: Arc<dyn LedgerRepositoryTrait>) -> Self {
        Self {
            repository,
            verifier_config: VerifierConfig::default(),
        }
    }

    pub fn with_verifier_config(
        repository: Arc<dyn LedgerRepositoryTrait>,
        verifier_config: VerifierConfig,
    ) -> Self {
        Self {
            repository,
            verifier_config,
        }
    }
}

#[async_trait::async_trait]
impl LedgerMaintenanceServiceTrait for LedgerMaintenanceService {
    /// Seeds one opening entry per account and persists the new flags.
    async fn mark_opening_balances(&self, table: LedgerTable) -> Result<MarkingSummary> {
        let mut entries = self.repository.fetch_entries(table)?;
        debug!(
            "Marking opening balances for {} ({} records)",
            table,
            entries.len()
        );

        let marker = OpeningBalanceMarker::new();
        let (updates, summary) = marker.mark(&mut entries);

        if !updates.is_empty() {
            self.repository.apply_flag_updates(table, &updates).await?;
        }

        info!(
            "Opening marker for {}: {} rows marked across {} accounts ({} failures)",
            table,
            summary.rows_marked,
            summary.accounts_affected,
            summary.failures.len()
        );
        Ok(summary)
    }

    /// Recomputes every account's running balance and persists it.
    ///
    /// Storage errors propagate verbatim; because recomputation is
    /// idempotent, the caller recovers by re-running for the affected
    /// table rather than resuming from a checkpoint.
    async fn recompute_balances(&self, table: LedgerTable) -> Result<RecomputeSummary> {
        let entries = self.repository.fetch_entries(table)?;
        let mut summary = RecomputeSummary::empty(table);
        summary.records_scanned = entries.len();

        let engine = BalanceEngine::new(table.scheme());
        let (recomputations, failures) = engine.recompute(entries);
        summary.failures = failures;

        for recomputation in recomputations {
            let applied = self
                .repository
                .apply_balance_updates(table, &recomputation.updates)
                .await?;

            summary.accounts_processed += 1;
            summary.records_updated += applied;
            summary.total_credits += recomputation.total_credits;
            summary.total_debits += recomputation.total_debits;
            summary.net_balance += recomputation.final_balance;
            summary.date_range = match summary.date_range {
                None => Some((recomputation.first_date, recomputation.last_date)),
                Some((first, last)) => Some((
                    first.min(recomputation.first_date),
                    last.max(recomputation.last_date),
                )),
            };
        }

        info!(
            "Recomputed {}: {} accounts, {} records updated, net balance {} ({} failures)",
            table,
            summary.accounts_processed,
            summary.records_updated,
            summary.net_balance,
            summary.failures.len()
        );
        Ok(summary)
    }

    /// Audits the stored balances of one table.
    fn verify_balances(&self, table: LedgerTable) -> Result<VerificationReport> {
        let entries = self.repository.fetch_entries(table)?;
        let verifier = BalanceVerifier::new(table.scheme(), self.verifier_config);
        let report = verifier.verify(&entries);

        info!(
            "Verified {}: {} records, {} discrepancies, {} accounts missing opening",
            table,
            report.records_scanned,
            report.discrepancies.len(),
            report.accounts_missing_opening.len()
        );
        Ok(report)
    }

    /// Runs marker, engine, and verifier in sequence on one table.
    async fn recalculate(&self, table: LedgerTable) -> Result<RecalculationRun> {
        let marking = self.mark_opening_balances(table).await?;
        let recompute = self.recompute_balances(table).await?;
        let verification = self.verify_balances(table)?;
        Ok(RecalculationRun {
            marking,
            recompute,
            verification,
        })
    }
}
