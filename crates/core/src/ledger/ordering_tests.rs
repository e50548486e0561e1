use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::constants::OPENING_FLAG;
use crate::ledger::model::{AccountKey, BalanceScheme, LedgerEntry};
use crate::ledger::ordering::{
    check_strict_order, chronological_cmp, posting_cmp, sort_entries, PostingClass,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn entry(
    id: &str,
    day: u32,
    credit: Option<Decimal>,
    debit: Option<Decimal>,
    seq: i64,
) -> LedgerEntry {
    LedgerEntry {
        id: id.to_string(),
        account_key: AccountKey::savings("M001", "01"),
        entry_date: date(2024, 1, day),
        credit,
        debit,
        principal: None,
        interest: None,
        operator_flag: None,
        balance: None,
        total: None,
        sequence_id: seq,
    }
}

#[test]
fn test_date_orders_first() {
    let earlier = entry("a", 1, None, Some(dec!(50)), 9);
    let later = entry("b", 2, Some(dec!(100)), None, 1);
    assert_eq!(
        posting_cmp(&earlier, &later, BalanceScheme::CreditDebit),
        std::cmp::Ordering::Less
    );
}

#[test]
fn test_opening_flag_sorts_first_within_day() {
    let mut opening = entry("open", 5, Some(dec!(10)), None, 7);
    opening.operator_flag = Some(OPENING_FLAG.to_string());
    let credit = entry("credit", 5, Some(dec!(10)), None, 1);

    assert_eq!(
        posting_cmp(&opening, &credit, BalanceScheme::CreditDebit),
        std::cmp::Ordering::Less
    );
}

#[test]
fn test_credit_before_debit_within_day() {
    let credit = entry("c", 2, Some(dec!(500)), None, 10);
    let debit = entry("d", 2, None, Some(dec!(200)), 1);

    // The credit posts first even though the debit was inserted earlier.
    assert_eq!(
        posting_cmp(&credit, &debit, BalanceScheme::CreditDebit),
        std::cmp::Ordering::Less
    );
}

#[test]
fn test_posting_class_buckets() {
    let scheme = BalanceScheme::CreditDebit;
    assert_eq!(
        PostingClass::of(&entry("a", 1, Some(dec!(1)), None, 1), scheme),
        PostingClass::Credit
    );
    assert_eq!(
        PostingClass::of(&entry("b", 1, Some(dec!(1)), Some(dec!(1)), 1), scheme),
        PostingClass::CreditAndDebit
    );
    assert_eq!(
        PostingClass::of(&entry("c", 1, None, Some(dec!(1)), 1), scheme),
        PostingClass::Debit
    );
    assert_eq!(
        PostingClass::of(&entry("d", 1, None, None, 1), scheme),
        PostingClass::Unclassified
    );
    assert!(PostingClass::Credit < PostingClass::CreditAndDebit);
    assert!(PostingClass::CreditAndDebit < PostingClass::Debit);
    assert!(PostingClass::Debit < PostingClass::Unclassified);
}

#[test]
fn test_null_credit_classifies_differently_from_zero() {
    let scheme = BalanceScheme::CreditDebit;
    let zero_credit = entry("z", 1, Some(Decimal::ZERO), None, 1);
    let null_credit = entry("n", 1, None, None, 1);
    assert_eq!(PostingClass::of(&zero_credit, scheme), PostingClass::Credit);
    assert_eq!(
        PostingClass::of(&null_credit, scheme),
        PostingClass::Unclassified
    );
}

#[test]
fn test_loan_scheme_treats_principal_and_interest_as_credit_like() {
    let mut principal_only = entry("p", 1, None, None, 1);
    principal_only.principal = Some(dec!(300));
    let debit = entry("d", 1, None, Some(dec!(100)), 0);

    assert_eq!(
        posting_cmp(&principal_only, &debit, BalanceScheme::PrincipalInterest),
        std::cmp::Ordering::Less
    );
}

#[test]
fn test_sequence_id_breaks_ties_deterministically() {
    let first = entry("a", 3, Some(dec!(100)), None, 4);
    let second = entry("b", 3, Some(dec!(100)), None, 9);

    assert_eq!(
        posting_cmp(&first, &second, BalanceScheme::CreditDebit),
        std::cmp::Ordering::Less
    );

    // Stable across repeated sorts regardless of initial order.
    for _ in 0..3 {
        let mut forward = vec![first.clone(), second.clone()];
        let mut reversed = vec![second.clone(), first.clone()];
        sort_entries(&mut forward, BalanceScheme::CreditDebit);
        sort_entries(&mut reversed, BalanceScheme::CreditDebit);
        assert_eq!(forward[0].id, "a");
        assert_eq!(reversed[0].id, "a");
    }
}

#[test]
fn test_full_sort_order() {
    let mut opening = entry("open", 1, Some(dec!(1000)), None, 0);
    opening.operator_flag = Some(OPENING_FLAG.to_string());
    let mut entries = vec![
        entry("d2", 2, None, Some(dec!(200)), 2),
        entry("c3", 3, Some(dec!(300)), None, 3),
        entry("c2", 2, Some(dec!(500)), None, 1),
        opening,
    ];
    sort_entries(&mut entries, BalanceScheme::CreditDebit);

    let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["open", "c2", "d2", "c3"]);
}

#[test]
fn test_check_strict_order_flags_duplicate_sequence() {
    let mut entries = vec![
        entry("a", 2, Some(dec!(10)), None, 5),
        entry("b", 2, Some(dec!(20)), None, 5),
    ];
    sort_entries(&mut entries, BalanceScheme::CreditDebit);

    let err = check_strict_order(&entries, BalanceScheme::CreditDebit).unwrap_err();
    assert!(err.to_string().contains("Unresolvable ordering tie"));
}

#[test]
fn test_check_strict_order_passes_distinct_sequences() {
    let mut entries = vec![
        entry("a", 2, Some(dec!(10)), None, 1),
        entry("b", 2, Some(dec!(20)), None, 2),
        entry("c", 2, None, Some(dec!(5)), 1),
    ];
    sort_entries(&mut entries, BalanceScheme::CreditDebit);
    assert!(check_strict_order(&entries, BalanceScheme::CreditDebit).is_ok());
}

#[test]
fn test_chronological_cmp_ignores_flags_and_class() {
    let mut flagged = entry("flagged", 2, Some(dec!(10)), None, 5);
    flagged.operator_flag = Some(OPENING_FLAG.to_string());
    let plain = entry("plain", 2, None, Some(dec!(10)), 1);

    // The plain row was inserted first, so it is chronologically first
    // even though the posting order would put the flagged row ahead.
    assert_eq!(
        chronological_cmp(&plain, &flagged),
        std::cmp::Ordering::Less
    );
}
