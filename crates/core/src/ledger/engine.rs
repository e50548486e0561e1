//! Balance recomputation engine.
//!
//! Orders each account's transactions under the shared ordering policy and
//! fills the cumulative balance column in a single linear pass. Accounts are
//! mutually independent partitions, so they are recomputed in parallel; a
//! failure in one account never stops the others.

use chrono::NaiveDate;
use log::{debug, warn};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::errors::ComputeError;

use super::model::{AccountFailure, AccountKey, BalanceScheme, BalanceUpdate, LedgerEntry};
use super::ordering::{check_strict_order, sort_entries};

/// The recomputed balance sequence for one account, kept together so the
/// storage layer can apply it as a single all-or-nothing batch.
#[derive(Debug, Clone)]
pub struct AccountRecomputation {
    pub account_key: AccountKey,
    pub updates: Vec<BalanceUpdate>,
    pub final_balance: Decimal,
    pub total_credits: Decimal,
    pub total_debits: Decimal,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

/// Computes running balances for one ledger table.
#[derive(Debug, Clone, Copy)]
pub struct BalanceEngine {
    scheme: BalanceScheme,
}

impl BalanceEngine {
    pub fn new(scheme: BalanceScheme) -> Self {
        Self { scheme }
    }

    /// Recomputes every account in the batch.
    ///
    /// Partitions by account key and processes the partitions in parallel;
    /// there is no shared mutable state between accounts. Returns the
    /// per-account results in account-key order plus the per-account
    /// failures, so a re-run can target only the failed accounts.
    pub fn recompute(
        &self,
        entries: Vec<LedgerEntry>,
    ) -> (Vec<AccountRecomputation>, Vec<AccountFailure>) {
        let mut partitions: HashMap<AccountKey, Vec<LedgerEntry>> = HashMap::new();
        for entry in entries {
            partitions
                .entry(entry.account_key.clone())
                .or_default()
                .push(entry);
        }

        let results: Vec<std::result::Result<AccountRecomputation, AccountFailure>> = partitions
            .into_par_iter()
            .map(|(account_key, account_entries)| {
                self.recompute_account(account_entries).map_err(|error| {
                    warn!("Recomputation failed for account {}: {}", account_key, error);
                    AccountFailure::new(account_key, &error)
                })
            })
            .collect();

        let mut recomputations = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(recomputation) => recomputations.push(recomputation),
                Err(failure) => failures.push(failure),
            }
        }

        // Parallel collection order is nondeterministic; normalize it.
        recomputations.sort_by(|a, b| a.account_key.cmp(&b.account_key));
        failures.sort_by(|a, b| a.account_key.cmp(&b.account_key));

        (recomputations, failures)
    }

    /// Recomputes a single account: one sort, then one scan with a local
    /// accumulator. The ordering is established exactly once up front and
    /// never re-derived mid-loop.
    pub fn recompute_account(
        &self,
        mut entries: Vec<LedgerEntry>,
    ) -> std::result::Result<AccountRecomputation, ComputeError> {
        if entries.is_empty() {
            return Err(ComputeError::InvalidEntry(
                "no entries to recompute".to_string(),
            ));
        }
        let account_key = entries[0].account_key.clone();
        if account_key.is_empty() {
            return Err(ComputeError::MissingAccountKey {
                entry_id: entries[0].id.clone(),
            });
        }

        sort_entries(&mut entries, self.scheme);
        check_strict_order(&entries, self.scheme)?;

        let mut running = Decimal::ZERO;
        let mut total_credits = Decimal::ZERO;
        let mut total_debits = Decimal::ZERO;
        let mut updates = Vec::with_capacity(entries.len());

        for entry in &entries {
            let credit_like = self.checked_credit_effect(entry, &account_key)?;
            let debit = entry.debit_amt();

            running = running
                .checked_add(credit_like)
                .and_then(|b| b.checked_sub(debit))
                .ok_or_else(|| ComputeError::Overflow {
                    account_key: account_key.to_string(),
                    entry_id: entry.id.clone(),
                })?;

            total_credits = total_credits.checked_add(credit_like).ok_or_else(|| {
                ComputeError::Overflow {
                    account_key: account_key.to_string(),
                    entry_id: entry.id.clone(),
                }
            })?;
            total_debits = total_debits.checked_add(debit).ok_or_else(|| {
                ComputeError::Overflow {
                    account_key: account_key.to_string(),
                    entry_id: entry.id.clone(),
                }
            })?;

            // Loan tables carry a per-row total of the credit-like
            // components, distinct from the cumulative balance.
            let total = match self.scheme {
                BalanceScheme::CreditDebit => None,
                BalanceScheme::PrincipalInterest => Some(credit_like),
            };

            updates.push(BalanceUpdate {
                entry_id: entry.id.clone(),
                balance: running,
                total,
            });
        }

        debug!(
            "Recomputed {} entries for account {}: final balance {}",
            updates.len(),
            account_key,
            running
        );

        Ok(AccountRecomputation {
            account_key,
            final_balance: running,
            total_credits,
            total_debits,
            first_date: entries[0].entry_date,
            last_date: entries[entries.len() - 1].entry_date,
            updates,
        })
    }

    /// Credit-like amount of one entry with overflow checking on the
    /// principal + interest sum.
    fn checked_credit_effect(
        &self,
        entry: &LedgerEntry,
        account_key: &AccountKey,
    ) -> std::result::Result<Decimal, ComputeError> {
        match self.scheme {
            BalanceScheme::CreditDebit => Ok(entry.credit_amt()),
            BalanceScheme::PrincipalInterest => entry
                .principal_amt()
                .checked_add(entry.interest_amt())
                .ok_or_else(|| ComputeError::Overflow {
                    account_key: account_key.to_string(),
                    entry_id: entry.id.clone(),
                }),
        }
    }
}
