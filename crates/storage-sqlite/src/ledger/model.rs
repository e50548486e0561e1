//! Database models for the ledger transaction tables.
//!
//! Amounts are persisted as TEXT and parsed tolerantly on the way out;
//! nullability is preserved because null and zero classify differently
//! upstream. Rows with an unusable entry date are dropped at this boundary
//! with a logged error rather than aborting the whole fetch.

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use memberledger_core::ledger::{AccountKey, LedgerEntry};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Helper function to parse a string into a Decimal,
/// with a fallback for scientific notation by parsing as f64 first.
fn parse_decimal_string_tolerant(value_str: &str, field_name: &str) -> Decimal {
    match Decimal::from_str(value_str) {
        Ok(d) => d,
        Err(e_decimal) => match f64::from_str(value_str) {
            Ok(f_val) => match Decimal::from_f64(f_val) {
                Some(dec_val) => dec_val,
                None => {
                    log::error!(
                        "Failed to convert {} '{}' (parsed as f64: {}) to Decimal.",
                        field_name,
                        value_str,
                        f_val
                    );
                    Decimal::ZERO
                }
            },
            Err(e_f64) => {
                log::error!(
                    "Failed to parse {} '{}': as Decimal (err: {}), and as f64 (err: {}). Falling back to ZERO.",
                    field_name, value_str, e_decimal, e_f64
                );
                Decimal::ZERO
            }
        },
    }
}

fn parse_optional_decimal(value: &Option<String>, field_name: &str) -> Option<Decimal> {
    value
        .as_deref()
        .map(|s| parse_decimal_string_tolerant(s, field_name))
}

/// Parses the stored entry date; `None` means the row cannot participate
/// in ordering and must be skipped by the caller.
fn parse_entry_date(value: &Option<String>, row_id: &str) -> Option<NaiveDate> {
    match value {
        None => {
            log::error!("Row {} has no entry_date, skipping", row_id);
            None
        }
        Some(raw) => match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(e) => {
                log::error!("Row {} has unparseable entry_date '{}': {}", row_id, raw, e);
                None
            }
        },
    }
}

fn now_string() -> String {
    Utc::now().to_rfc3339()
}

/// Database model for savings transactions
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Default,
)]
#[diesel(table_name = crate::schema::savings_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SavingsTransactionDB {
    pub id: String,
    pub member_no: Option<String>,
    pub sub_account: Option<String>,
    pub entry_date: Option<String>,
    pub credit: Option<String>,
    pub debit: Option<String>,
    pub operator_flag: Option<String>,
    pub balance: Option<String>,
    pub sequence_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl SavingsTransactionDB {
    /// Converts to a domain entry, or `None` when the row has no usable date.
    pub fn into_entry(self) -> Option<LedgerEntry> {
        let entry_date = parse_entry_date(&self.entry_date, &self.id)?;
        Some(LedgerEntry {
            account_key: AccountKey {
                member_no: self.member_no.unwrap_or_default(),
                sub_account: self.sub_account,
                loan_no: None,
            },
            entry_date,
            credit: parse_optional_decimal(&self.credit, "credit"),
            debit: parse_optional_decimal(&self.debit, "debit"),
            principal: None,
            interest: None,
            operator_flag: self.operator_flag,
            balance: parse_optional_decimal(&self.balance, "balance"),
            total: None,
            sequence_id: self.sequence_id,
            id: self.id,
        })
    }

    pub fn from_entry(entry: &LedgerEntry) -> Self {
        let now = now_string();
        Self {
            id: entry.id.clone(),
            member_no: Some(entry.account_key.member_no.clone())
                .filter(|m| !m.trim().is_empty()),
            sub_account: entry.account_key.sub_account.clone(),
            entry_date: Some(entry.entry_date.format(DATE_FORMAT).to_string()),
            credit: entry.credit.map(|d| d.to_string()),
            debit: entry.debit.map(|d| d.to_string()),
            operator_flag: entry.operator_flag.clone(),
            balance: entry.balance.map(|d| d.to_string()),
            sequence_id: entry.sequence_id,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Database model for contribution transactions
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Default,
)]
#[diesel(table_name = crate::schema::contribution_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ContributionTransactionDB {
    pub id: String,
    pub member_no: Option<String>,
    pub entry_date: Option<String>,
    pub credit: Option<String>,
    pub debit: Option<String>,
    pub operator_flag: Option<String>,
    pub balance: Option<String>,
    pub sequence_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ContributionTransactionDB {
    pub fn into_entry(self) -> Option<LedgerEntry> {
        let entry_date = parse_entry_date(&self.entry_date, &self.id)?;
        Some(LedgerEntry {
            account_key: AccountKey::member(self.member_no.unwrap_or_default()),
            entry_date,
            credit: parse_optional_decimal(&self.credit, "credit"),
            debit: parse_optional_decimal(&self.debit, "debit"),
            principal: None,
            interest: None,
            operator_flag: self.operator_flag,
            balance: parse_optional_decimal(&self.balance, "balance"),
            total: None,
            sequence_id: self.sequence_id,
            id: self.id,
        })
    }

    pub fn from_entry(entry: &LedgerEntry) -> Self {
        let now = now_string();
        Self {
            id: entry.id.clone(),
            member_no: Some(entry.account_key.member_no.clone())
                .filter(|m| !m.trim().is_empty()),
            entry_date: Some(entry.entry_date.format(DATE_FORMAT).to_string()),
            credit: entry.credit.map(|d| d.to_string()),
            debit: entry.debit.map(|d| d.to_string()),
            operator_flag: entry.operator_flag.clone(),
            balance: entry.balance.map(|d| d.to_string()),
            sequence_id: entry.sequence_id,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Database model for loan transactions
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Default,
)]
#[diesel(table_name = crate::schema::loan_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LoanTransactionDB {
    pub id: String,
    pub member_no: Option<String>,
    pub loan_no: Option<String>,
    pub entry_date: Option<String>,
    pub principal: Option<String>,
    pub interest: Option<String>,
    pub debit: Option<String>,
    pub operator_flag: Option<String>,
    pub balance: Option<String>,
    pub total: Option<String>,
    pub sequence_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl LoanTransactionDB {
    pub fn into_entry(self) -> Option<LedgerEntry> {
        let entry_date = parse_entry_date(&self.entry_date, &self.id)?;
        Some(LedgerEntry {
            account_key: AccountKey {
                member_no: self.member_no.unwrap_or_default(),
                sub_account: None,
                loan_no: self.loan_no,
            },
            entry_date,
            credit: None,
            debit: parse_optional_decimal(&self.debit, "debit"),
            principal: parse_optional_decimal(&self.principal, "principal"),
            interest: parse_optional_decimal(&self.interest, "interest"),
            operator_flag: self.operator_flag,
            balance: parse_optional_decimal(&self.balance, "balance"),
            total: parse_optional_decimal(&self.total, "total"),
            sequence_id: self.sequence_id,
            id: self.id,
        })
    }

    pub fn from_entry(entry: &LedgerEntry) -> Self {
        let now = now_string();
        Self {
            id: entry.id.clone(),
            member_no: Some(entry.account_key.member_no.clone())
                .filter(|m| !m.trim().is_empty()),
            loan_no: entry.account_key.loan_no.clone(),
            entry_date: Some(entry.entry_date.format(DATE_FORMAT).to_string()),
            principal: entry.principal.map(|d| d.to_string()),
            interest: entry.interest.map(|d| d.to_string()),
            debit: entry.debit.map(|d| d.to_string()),
            operator_flag: entry.operator_flag.clone(),
            balance: entry.balance.map(|d| d.to_string()),
            total: entry.total.map(|d| d.to_string()),
            sequence_id: entry.sequence_id,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
