//! The ordering policy shared by the marker, the engine, and the verifier.
//!
//! All three components depend on the same strict total order, so it is
//! defined once here and never duplicated. The composite key is:
//! date ascending, opening-flag priority, posting class (credit before
//! debit), then `sequence_id` ascending as the final deterministic tie-break.

use std::cmp::Ordering;

use crate::errors::ComputeError;

use super::model::{BalanceScheme, LedgerEntry};

/// Same-day classification of an entry, ordered by posting priority.
///
/// Within one date, opening entries post first, then credit-like entries,
/// then entries carrying both a credit-like and a debit amount, then
/// debit-only entries. Entries with no amounts at all post last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PostingClass {
    Opening,
    Credit,
    CreditAndDebit,
    Debit,
    Unclassified,
}

impl PostingClass {
    /// Classifies an entry under the given balance scheme.
    ///
    /// Classification looks at field presence, not value: a null credit and
    /// a zero credit bucket differently, matching how the source tables
    /// distinguish "no credit posted" from "credit of zero".
    pub fn of(entry: &LedgerEntry, scheme: BalanceScheme) -> Self {
        if entry.is_opening() {
            return PostingClass::Opening;
        }
        match (entry.has_credit_like(scheme), entry.has_debit()) {
            (true, false) => PostingClass::Credit,
            (true, true) => PostingClass::CreditAndDebit,
            (false, true) => PostingClass::Debit,
            (false, false) => PostingClass::Unclassified,
        }
    }
}

/// Compares two entries of the same account under the ordering policy.
pub fn posting_cmp(a: &LedgerEntry, b: &LedgerEntry, scheme: BalanceScheme) -> Ordering {
    a.entry_date
        .cmp(&b.entry_date)
        .then_with(|| PostingClass::of(a, scheme).cmp(&PostingClass::of(b, scheme)))
        .then_with(|| a.sequence_id.cmp(&b.sequence_id))
}

/// Compares two entries by date and insertion order only, ignoring flags
/// and classification. The opening-balance marker uses this to find the
/// genuinely-first row even when an existing flag is wrong.
pub fn chronological_cmp(a: &LedgerEntry, b: &LedgerEntry) -> Ordering {
    a.entry_date
        .cmp(&b.entry_date)
        .then_with(|| a.sequence_id.cmp(&b.sequence_id))
}

/// Sorts one account's entries in place under the ordering policy.
pub fn sort_entries(entries: &mut [LedgerEntry], scheme: BalanceScheme) {
    entries.sort_by(|a, b| posting_cmp(a, b, scheme));
}

/// Verifies that a sorted slice forms a strict total order.
///
/// Two entries comparing equal means the source data reused a
/// `sequence_id` within one day and class; that is a data integrity error
/// to surface, never to resolve arbitrarily.
pub fn check_strict_order(
    entries: &[LedgerEntry],
    scheme: BalanceScheme,
) -> Result<(), ComputeError> {
    for pair in entries.windows(2) {
        if posting_cmp(&pair[0], &pair[1], scheme) == Ordering::Equal {
            return Err(ComputeError::UnresolvableTie {
                account_key: pair[0].account_key.to_string(),
                date: pair[0].entry_date,
                first_id: pair[0].id.clone(),
                second_id: pair[1].id.clone(),
            });
        }
    }
    Ok(())
}
