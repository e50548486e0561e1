//! Opening-balance marker.
//!
//! Tags the chronologically-first transaction of each account as the
//! opening entry by setting its operator flag to `"CWO"`.

use log::{debug, warn};
use std::collections::BTreeMap;

use crate::constants::OPENING_FLAG;
use crate::errors::ComputeError;

use super::model::{AccountFailure, AccountKey, FlagUpdate, LedgerEntry, MarkingSummary};
use super::ordering::chronological_cmp;

/// Marks the opening entry of every account in a batch.
///
/// The first row of an account is the minimum under `(entry_date,
/// sequence_id)`; an existing correct flag is left untouched, a wrong value
/// on the genuinely-first row is overwritten. Flags on other rows are never
/// cleared here; the verifier surfaces them as a data-quality condition.
pub struct OpeningBalanceMarker;

impl OpeningBalanceMarker {
    pub fn new() -> Self {
        Self
    }

    /// Runs the marking pass over one table's entries.
    ///
    /// Mutates the in-memory entries so later passes in the same run see
    /// the flags, and returns the write-backs for the storage layer plus a
    /// summary. An account whose first row cannot be determined (tied
    /// minimum with equal `sequence_id`) fails alone; other accounts
    /// continue.
    pub fn mark(&self, entries: &mut [LedgerEntry]) -> (Vec<FlagUpdate>, MarkingSummary) {
        let mut updates = Vec::new();
        let mut summary = MarkingSummary::default();

        // BTreeMap keeps the per-account iteration order deterministic.
        let mut by_account: BTreeMap<AccountKey, Vec<usize>> = BTreeMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            by_account
                .entry(entry.account_key.clone())
                .or_default()
                .push(idx);
        }

        for (account_key, indices) in by_account {
            summary.accounts_scanned += 1;

            if account_key.is_empty() {
                let entry_id = entries[indices[0]].id.clone();
                let error = ComputeError::MissingAccountKey { entry_id };
                warn!("Skipping opening marker: {}", error);
                summary
                    .failures
                    .push(AccountFailure::new(account_key, &error));
                continue;
            }

            let first_idx = match Self::first_index(entries, &indices, &account_key) {
                Ok(idx) => idx,
                Err(error) => {
                    warn!("Opening marker failed for {}: {}", account_key, error);
                    summary
                        .failures
                        .push(AccountFailure::new(account_key, &error));
                    continue;
                }
            };

            let first = &mut entries[first_idx];
            if first.operator_flag.as_deref() == Some(OPENING_FLAG) {
                continue;
            }

            debug!(
                "Marking entry {} of account {} as opening (was {:?})",
                first.id, account_key, first.operator_flag
            );
            first.operator_flag = Some(OPENING_FLAG.to_string());
            updates.push(FlagUpdate {
                entry_id: first.id.clone(),
                operator_flag: OPENING_FLAG.to_string(),
            });
            summary.rows_marked += 1;
            summary.accounts_affected += 1;
        }

        (updates, summary)
    }

    /// Finds the index of the chronologically-first entry of one account,
    /// failing on an unresolvable tie for the minimum.
    ///
    /// Only a tie at the minimum itself is fatal here. Duplicate
    /// `(entry_date, sequence_id)` pairs elsewhere in the account do not
    /// block marking; whether they form a strict order under the full
    /// posting policy is the engine's concern.
    fn first_index(
        entries: &[LedgerEntry],
        indices: &[usize],
        account_key: &AccountKey,
    ) -> Result<usize, ComputeError> {
        let mut first = indices[0];
        for &idx in &indices[1..] {
            if chronological_cmp(&entries[idx], &entries[first]) == std::cmp::Ordering::Less {
                first = idx;
            }
        }

        let tied_with_minimum = indices.iter().find(|&&idx| {
            idx != first
                && chronological_cmp(&entries[idx], &entries[first]) == std::cmp::Ordering::Equal
        });
        if let Some(&dup) = tied_with_minimum {
            return Err(ComputeError::UnresolvableTie {
                account_key: account_key.to_string(),
                date: entries[dup].entry_date,
                first_id: entries[first].id.clone(),
                second_id: entries[dup].id.clone(),
            });
        }
        Ok(first)
    }
}

impl Default for OpeningBalanceMarker {
    fn default() -> Self {
        Self::new()
    }
}
