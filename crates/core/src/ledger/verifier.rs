//! Balance verifier.
//!
//! Read-only audit of a balance-populated table: recomputes the expected
//! delta of every row from its credit/debit fields and flags rows whose
//! stored balance progression diverges beyond the rounding tolerance,
//! together with the data-quality conditions the engine never fixes
//! silently (missing or duplicated opening flags, all-null amount rows,
//! negative amounts).

use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::constants::BALANCE_TOLERANCE;
use crate::errors::ComputeError;

use super::model::{
    AccountFailure, AccountKey, BalanceDiscrepancy, BalanceScheme, LedgerEntry,
    VerificationReport,
};
use super::ordering::{check_strict_order, sort_entries};

/// Thresholds for the verification pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerifierConfig {
    /// Maximum allowed divergence between observed and expected deltas,
    /// in currency units.
    pub tolerance: Decimal,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            tolerance: Decimal::from_str(BALANCE_TOLERANCE)
                .unwrap_or_else(|_| Decimal::new(1, 2)),
        }
    }
}

/// Audits stored balances against the ordering policy and delta rule.
#[derive(Debug, Clone, Copy)]
pub struct BalanceVerifier {
    scheme: BalanceScheme,
    config: VerifierConfig,
}

impl BalanceVerifier {
    pub fn new(scheme: BalanceScheme, config: VerifierConfig) -> Self {
        Self { scheme, config }
    }

    pub fn with_defaults(scheme: BalanceScheme) -> Self {
        Self::new(scheme, VerifierConfig::default())
    }

    /// Verifies one table's entries. Never mutates them.
    pub fn verify(&self, entries: &[LedgerEntry]) -> VerificationReport {
        let mut report = VerificationReport {
            records_scanned: entries.len(),
            ..Default::default()
        };

        let mut by_account: BTreeMap<AccountKey, Vec<LedgerEntry>> = BTreeMap::new();
        for entry in entries {
            by_account
                .entry(entry.account_key.clone())
                .or_default()
                .push(entry.clone());
        }
        report.accounts_scanned = by_account.len();

        for (account_key, mut account_entries) in by_account {
            if account_key.is_empty() {
                let error = ComputeError::MissingAccountKey {
                    entry_id: account_entries[0].id.clone(),
                };
                report
                    .failures
                    .push(AccountFailure::new(account_key, &error));
                continue;
            }

            sort_entries(&mut account_entries, self.scheme);
            // Progression deltas are meaningless without a strict order;
            // such accounts get row-level checks only.
            let strict = match check_strict_order(&account_entries, self.scheme) {
                Ok(()) => true,
                Err(error) => {
                    report
                        .failures
                        .push(AccountFailure::new(account_key.clone(), &error));
                    false
                }
            };

            self.scan_rows(&account_key, &account_entries, strict, &mut report);
        }

        report.discrepancies.sort_by(|a, b| {
            b.divergence
                .cmp(&a.divergence)
                .then_with(|| a.account_key.cmp(&b.account_key))
                .then_with(|| a.entry_date.cmp(&b.entry_date))
        });

        debug!(
            "Verified {} records across {} accounts: {} discrepancies",
            report.records_scanned,
            report.accounts_scanned,
            report.discrepancies.len()
        );
        report
    }

    /// Row-level checks, plus the delta comparison when `check_deltas`
    /// holds (the account's ordering is strict).
    fn scan_rows(
        &self,
        account_key: &AccountKey,
        account_entries: &[LedgerEntry],
        check_deltas: bool,
        report: &mut VerificationReport,
    ) {
        let mut openings = 0usize;
        let mut previous_balance = Decimal::ZERO;

        for entry in account_entries {
            if entry.is_opening() {
                openings += 1;
                report.opening_marked_records += 1;
            }
            if entry.has_no_amounts(self.scheme) {
                report.empty_amount_rows.push(entry.id.clone());
            }
            if entry.has_negative_amount() {
                report.negative_amount_rows.push(entry.id.clone());
            }

            if check_deltas {
                let observed_balance = entry.balance.unwrap_or(Decimal::ZERO);
                let observed_delta = observed_balance - previous_balance;
                let expected_delta = entry.net_effect(self.scheme);
                let divergence = (observed_delta - expected_delta).abs();

                if divergence > self.config.tolerance {
                    report.discrepancies.push(BalanceDiscrepancy {
                        account_key: account_key.clone(),
                        entry_id: entry.id.clone(),
                        entry_date: entry.entry_date,
                        expected_delta,
                        observed_delta,
                        divergence,
                    });
                }

                previous_balance = observed_balance;
            }
        }

        if openings == 0 {
            report.accounts_missing_opening.push(account_key.clone());
        } else if openings > 1 {
            report
                .accounts_with_multiple_openings
                .push(account_key.clone());
        }
    }
}
