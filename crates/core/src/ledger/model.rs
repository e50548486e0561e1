//! Domain models for ledger entries, account keys, and run summaries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::OPENING_FLAG;
use crate::errors::ComputeError;

// =============================================================================
// Account key
// =============================================================================

/// Composite identifier scoping one independent running-balance sequence.
///
/// A member number alone identifies a contribution ledger; savings ledgers
/// add a sub-account code and loan ledgers add a loan number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKey {
    pub member_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_no: Option<String>,
}

impl AccountKey {
    /// Key for a member-level ledger (contributions).
    pub fn member(member_no: impl Into<String>) -> Self {
        Self {
            member_no: member_no.into(),
            sub_account: None,
            loan_no: None,
        }
    }

    /// Key for a savings ledger scoped to a sub-account.
    pub fn savings(member_no: impl Into<String>, sub_account: impl Into<String>) -> Self {
        Self {
            member_no: member_no.into(),
            sub_account: Some(sub_account.into()),
            loan_no: None,
        }
    }

    /// Key for a loan ledger scoped to a loan number.
    pub fn loan(member_no: impl Into<String>, loan_no: impl Into<String>) -> Self {
        Self {
            member_no: member_no.into(),
            sub_account: None,
            loan_no: Some(loan_no.into()),
        }
    }

    /// True when the key carries no usable member number.
    pub fn is_empty(&self) -> bool {
        self.member_no.trim().is_empty()
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.member_no)?;
        if let Some(ref sub) = self.sub_account {
            write!(f, "/{}", sub)?;
        }
        if let Some(ref loan) = self.loan_no {
            write!(f, "/{}", loan)?;
        }
        Ok(())
    }
}

// =============================================================================
// Tables and balance schemes
// =============================================================================

/// Arithmetic variant applied when accumulating a running balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BalanceScheme {
    /// `credit - debit` per entry (savings, contributions).
    CreditDebit,
    /// `principal + interest - debit` per entry, plus a per-row `total`
    /// of the credit-like components (loans).
    PrincipalInterest,
}

/// The ledger tables this system recomputes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerTable {
    Savings,
    Contributions,
    Loans,
}

impl LedgerTable {
    /// Returns the string representation of this table.
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerTable::Savings => "SAVINGS",
            LedgerTable::Contributions => "CONTRIBUTIONS",
            LedgerTable::Loans => "LOANS",
        }
    }

    /// Balance arithmetic used for this table.
    pub fn scheme(&self) -> BalanceScheme {
        match self {
            LedgerTable::Savings | LedgerTable::Contributions => BalanceScheme::CreditDebit,
            LedgerTable::Loans => BalanceScheme::PrincipalInterest,
        }
    }
}

impl fmt::Display for LedgerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Ledger entry
// =============================================================================

/// One transaction row of a ledger table.
///
/// Amount fields are nullable: null is treated as zero for arithmetic but is
/// distinguished from zero when classifying same-day ordering. `balance` and
/// `total` are outputs of the recomputation engine, never inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Stable row identity assigned at ingestion. All write-backs are keyed
    /// by this id; rows are never re-located by date/amount matching.
    pub id: String,
    pub account_key: AccountKey,
    pub entry_date: NaiveDate,

    #[serde(default)]
    pub credit: Option<Decimal>,
    #[serde(default)]
    pub debit: Option<Decimal>,
    #[serde(default)]
    pub principal: Option<Decimal>,
    #[serde(default)]
    pub interest: Option<Decimal>,

    /// Optional operator marker; `"CWO"` designates the opening entry.
    #[serde(default)]
    pub operator_flag: Option<String>,

    /// Cumulative running balance (output).
    #[serde(default)]
    pub balance: Option<Decimal>,
    /// Per-row credit-like total, loan tables only (output).
    #[serde(default)]
    pub total: Option<Decimal>,

    /// Monotonic insertion-order identifier. Required tie-break for
    /// same-day entries of the same posting class.
    pub sequence_id: i64,
}

impl LedgerEntry {
    /// Get credit, defaulting to zero if not set.
    pub fn credit_amt(&self) -> Decimal {
        self.credit.unwrap_or(Decimal::ZERO)
    }

    /// Get debit, defaulting to zero if not set.
    pub fn debit_amt(&self) -> Decimal {
        self.debit.unwrap_or(Decimal::ZERO)
    }

    /// Get principal, defaulting to zero if not set.
    pub fn principal_amt(&self) -> Decimal {
        self.principal.unwrap_or(Decimal::ZERO)
    }

    /// Get interest, defaulting to zero if not set.
    pub fn interest_amt(&self) -> Decimal {
        self.interest.unwrap_or(Decimal::ZERO)
    }

    /// Sum of the credit-like components under the given scheme.
    pub fn credit_effect(&self, scheme: BalanceScheme) -> Decimal {
        match scheme {
            BalanceScheme::CreditDebit => self.credit_amt(),
            BalanceScheme::PrincipalInterest => self.principal_amt() + self.interest_amt(),
        }
    }

    /// Net effect of this entry on the running balance.
    pub fn net_effect(&self, scheme: BalanceScheme) -> Decimal {
        self.credit_effect(scheme) - self.debit_amt()
    }

    /// True when any credit-like field is present (non-null), regardless of
    /// value. Null and zero classify differently for same-day ordering.
    pub fn has_credit_like(&self, scheme: BalanceScheme) -> bool {
        match scheme {
            BalanceScheme::CreditDebit => self.credit.is_some(),
            BalanceScheme::PrincipalInterest => {
                self.principal.is_some() || self.interest.is_some()
            }
        }
    }

    /// True when the debit field is present (non-null).
    pub fn has_debit(&self) -> bool {
        self.debit.is_some()
    }

    /// True when every amount field relevant to the scheme is null.
    pub fn has_no_amounts(&self, scheme: BalanceScheme) -> bool {
        !self.has_credit_like(scheme) && !self.has_debit()
    }

    /// True when any present amount is negative (a precondition violation).
    pub fn has_negative_amount(&self) -> bool {
        [self.credit, self.debit, self.principal, self.interest]
            .iter()
            .flatten()
            .any(|amount| amount.is_sign_negative() && !amount.is_zero())
    }

    /// True when this entry carries the opening-balance flag.
    pub fn is_opening(&self) -> bool {
        self.operator_flag.as_deref() == Some(OPENING_FLAG)
    }
}

// =============================================================================
// Write-backs
// =============================================================================

/// Balance write-back for one row, keyed by its stable id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceUpdate {
    pub entry_id: String,
    pub balance: Decimal,
    /// Set for loan tables only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
}

/// Operator-flag write-back for one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagUpdate {
    pub entry_id: String,
    pub operator_flag: String,
}

// =============================================================================
// Summaries and reports
// =============================================================================

/// A per-account failure that did not stop the rest of the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFailure {
    pub account_key: AccountKey,
    pub message: String,
}

impl AccountFailure {
    pub fn new(account_key: AccountKey, error: &ComputeError) -> Self {
        Self {
            account_key,
            message: error.to_string(),
        }
    }
}

/// Outcome of an opening-balance marking pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkingSummary {
    pub rows_marked: usize,
    pub accounts_affected: usize,
    pub accounts_scanned: usize,
    pub failures: Vec<AccountFailure>,
}

/// Outcome of a balance recomputation pass over one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeSummary {
    pub table: LedgerTable,
    pub accounts_processed: usize,
    pub records_updated: usize,
    pub records_scanned: usize,
    /// Earliest and latest entry date seen across processed accounts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub total_credits: Decimal,
    pub total_debits: Decimal,
    pub net_balance: Decimal,
    pub failures: Vec<AccountFailure>,
}

impl RecomputeSummary {
    pub fn empty(table: LedgerTable) -> Self {
        Self {
            table,
            accounts_processed: 0,
            records_updated: 0,
            records_scanned: 0,
            date_range: None,
            total_credits: Decimal::ZERO,
            total_debits: Decimal::ZERO,
            net_balance: Decimal::ZERO,
            failures: Vec::new(),
        }
    }
}

/// A row whose observed balance progression diverges from its expected
/// credit/debit effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDiscrepancy {
    pub account_key: AccountKey,
    pub entry_id: String,
    pub entry_date: NaiveDate,
    pub expected_delta: Decimal,
    pub observed_delta: Decimal,
    /// Absolute divergence, used for triage ordering.
    pub divergence: Decimal,
}

/// Read-only audit of a balance-populated table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub records_scanned: usize,
    pub accounts_scanned: usize,
    pub opening_marked_records: usize,
    /// Sorted by divergence magnitude, descending.
    pub discrepancies: Vec<BalanceDiscrepancy>,
    pub accounts_missing_opening: Vec<AccountKey>,
    pub accounts_with_multiple_openings: Vec<AccountKey>,
    /// Rows whose amount fields are all null.
    pub empty_amount_rows: Vec<String>,
    /// Rows carrying a negative amount.
    pub negative_amount_rows: Vec<String>,
    pub failures: Vec<AccountFailure>,
}

impl VerificationReport {
    /// True when no discrepancy or data-quality condition was found.
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
            && self.accounts_missing_opening.is_empty()
            && self.accounts_with_multiple_openings.is_empty()
            && self.empty_amount_rows.is_empty()
            && self.negative_amount_rows.is_empty()
            && self.failures.is_empty()
    }
}

/// Combined result of a full marker -> engine -> verifier run on one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculationRun {
    pub marking: MarkingSummary,
    pub recompute: RecomputeSummary,
    pub verification: VerificationReport,
}
