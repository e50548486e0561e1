//! Property-based integration tests for the balance recomputation pipeline.
//!
//! These tests verify that universal properties hold across all valid inputs,
//! using the `proptest` crate for random test case generation.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use memberledger_core::{
    AccountKey, BalanceEngine, BalanceScheme, BalanceVerifier, LedgerEntry, OpeningBalanceMarker,
    sort_entries,
};

// =============================================================================
// Generators
// =============================================================================

/// Raw material for one generated row: day of month, optional credit and
/// debit amounts in cents.
type RawRow = (u32, Option<i64>, Option<i64>);

fn arb_raw_row() -> impl Strategy<Value = RawRow> {
    (
        1u32..=28,
        proptest::option::of(0i64..1_000_000),
        proptest::option::of(0i64..1_000_000),
    )
}

/// Generates a full account's worth of entries with unique sequence ids.
fn arb_account_entries(
    member: &'static str,
    max_rows: usize,
) -> impl Strategy<Value = Vec<LedgerEntry>> {
    proptest::collection::vec(arb_raw_row(), 1..=max_rows).prop_map(move |rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (day, credit_cents, debit_cents))| LedgerEntry {
                id: format!("{member}-{i}"),
                account_key: AccountKey::member(member),
                entry_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
                credit: credit_cents.map(|c| Decimal::new(c, 2)),
                debit: debit_cents.map(|c| Decimal::new(c, 2)),
                principal: None,
                interest: None,
                operator_flag: None,
                balance: None,
                total: None,
                sequence_id: i as i64,
            })
            .collect()
    })
}

fn net_effect(entry: &LedgerEntry) -> Decimal {
    entry.credit.unwrap_or(Decimal::ZERO) - entry.debit.unwrap_or(Decimal::ZERO)
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The final balance of an account equals the sum of every entry's
    /// net effect, and each row's balance is the prefix sum up to it.
    #[test]
    fn prop_balance_is_prefix_sum_of_net_effects(
        entries in arb_account_entries("M100", 40)
    ) {
        let engine = BalanceEngine::new(BalanceScheme::CreditDebit);
        let (recomputations, failures) = engine.recompute(entries.clone());

        prop_assert!(failures.is_empty());
        prop_assert_eq!(recomputations.len(), 1);
        let result = &recomputations[0];

        let expected_final: Decimal = entries.iter().map(net_effect).sum();
        prop_assert_eq!(result.final_balance, expected_final);

        // Each balance is the previous balance plus that row's net effect.
        let mut ordered = entries.clone();
        sort_entries(&mut ordered, BalanceScheme::CreditDebit);
        let mut running = Decimal::ZERO;
        for (update, entry) in result.updates.iter().zip(ordered.iter()) {
            prop_assert_eq!(&update.entry_id, &entry.id);
            running += net_effect(entry);
            prop_assert_eq!(update.balance, running);
        }
    }

    /// Recomputing the same rows twice yields byte-identical updates.
    #[test]
    fn prop_recomputation_is_idempotent(
        entries in arb_account_entries("M101", 40)
    ) {
        let engine = BalanceEngine::new(BalanceScheme::CreditDebit);
        let (first, _) = engine.recompute(entries.clone());
        let (second, _) = engine.recompute(entries);

        prop_assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            prop_assert_eq!(&a.updates, &b.updates);
        }
    }

    /// Input row order never influences the result: any permutation of the
    /// same rows produces the same balance sequence.
    #[test]
    fn prop_result_is_invariant_under_input_permutation(
        entries in arb_account_entries("M102", 30).prop_shuffle()
    ) {
        let mut sorted = entries.clone();
        sorted.sort_by(|a, b| a.sequence_id.cmp(&b.sequence_id));

        let engine = BalanceEngine::new(BalanceScheme::CreditDebit);
        let (from_shuffled, _) = engine.recompute(entries);
        let (from_sorted, _) = engine.recompute(sorted);

        prop_assert_eq!(from_shuffled.len(), 1);
        prop_assert_eq!(&from_shuffled[0].updates, &from_sorted[0].updates);
    }

    /// A table freshly recomputed by the engine always verifies with zero
    /// balance discrepancies.
    #[test]
    fn prop_engine_output_passes_verification(
        mut entries in arb_account_entries("M103", 40)
    ) {
        let engine = BalanceEngine::new(BalanceScheme::CreditDebit);
        let (recomputations, failures) = engine.recompute(entries.clone());
        prop_assert!(failures.is_empty());

        for update in &recomputations[0].updates {
            let target = entries.iter_mut().find(|e| &e.id == &update.entry_id).unwrap();
            target.balance = Some(update.balance);
        }

        let verifier = BalanceVerifier::with_defaults(BalanceScheme::CreditDebit);
        let report = verifier.verify(&entries);
        prop_assert!(report.discrepancies.is_empty());
        prop_assert!(report.failures.is_empty());
    }

    /// Interleaving a second account's rows never changes the first
    /// account's balances.
    #[test]
    fn prop_accounts_are_independent(
        first in arb_account_entries("M104", 20),
        second in arb_account_entries("M105", 20),
    ) {
        let engine = BalanceEngine::new(BalanceScheme::CreditDebit);

        let (alone, _) = engine.recompute(first.clone());

        let mut combined = first;
        combined.extend(second);
        let (together, _) = engine.recompute(combined);

        let first_key = AccountKey::member("M104");
        let in_combined = together
            .iter()
            .find(|r| r.account_key == first_key)
            .unwrap();
        prop_assert_eq!(&alone[0].updates, &in_combined.updates);
    }

    /// Sorting is a total order over rows with unique sequence ids, and
    /// sorting twice changes nothing.
    #[test]
    fn prop_sort_is_stable_and_total(
        mut entries in arb_account_entries("M106", 30).prop_shuffle()
    ) {
        sort_entries(&mut entries, BalanceScheme::CreditDebit);
        let once = entries.clone();
        sort_entries(&mut entries, BalanceScheme::CreditDebit);
        prop_assert_eq!(&once, &entries);

        for pair in entries.windows(2) {
            let earlier = (&pair[0].entry_date, pair[0].sequence_id);
            let later = (&pair[1].entry_date, pair[1].sequence_id);
            prop_assert!(pair[0].entry_date <= pair[1].entry_date);
            prop_assert!(earlier != later);
        }
    }

    /// The marker always leaves exactly one opening-flagged row per account,
    /// and that row is a chronological minimum.
    #[test]
    fn prop_marker_produces_exactly_one_opening(
        mut entries in arb_account_entries("M107", 30)
    ) {
        let (updates, summary) = OpeningBalanceMarker::new().mark(&mut entries);

        prop_assert_eq!(updates.len(), 1);
        prop_assert_eq!(summary.rows_marked, 1);
        prop_assert!(summary.failures.is_empty());

        let openings: Vec<&LedgerEntry> =
            entries.iter().filter(|e| e.is_opening()).collect();
        prop_assert_eq!(openings.len(), 1);

        let earliest_date = entries.iter().map(|e| e.entry_date).min().unwrap();
        prop_assert_eq!(openings[0].entry_date, earliest_date);
    }

    /// Marking is idempotent: a second pass writes nothing.
    #[test]
    fn prop_marking_is_idempotent(
        mut entries in arb_account_entries("M108", 30)
    ) {
        let marker = OpeningBalanceMarker::new();
        let (first_updates, _) = marker.mark(&mut entries);
        prop_assert_eq!(first_updates.len(), 1);

        let (second_updates, summary) = marker.mark(&mut entries);
        prop_assert!(second_updates.is_empty());
        prop_assert_eq!(summary.rows_marked, 0);
    }
}
