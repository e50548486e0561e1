//! SQLite repository for the ledger transaction tables.

use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;

use async_trait::async_trait;
use memberledger_core::ledger::{
    BalanceUpdate, FlagUpdate, LedgerEntry, LedgerRepositoryTrait, LedgerTable,
};
use memberledger_core::Result;

use super::model::{ContributionTransactionDB, LoanTransactionDB, SavingsTransactionDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{contribution_transactions, loan_transactions, savings_transactions};

/// Repository for reading and updating ledger transaction rows.
///
/// Reads go through the shared pool; writes go through the single-writer
/// actor so each update batch runs in one immediate transaction.
pub struct LedgerRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl LedgerRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    fn fetch_entries(&self, table: LedgerTable) -> Result<Vec<LedgerEntry>> {
        let mut conn = get_connection(&self.pool)?;

        let entries = match table {
            LedgerTable::Savings => savings_transactions::table
                .select(SavingsTransactionDB::as_select())
                .load::<SavingsTransactionDB>(&mut conn)
                .into_core()?
                .into_iter()
                .filter_map(SavingsTransactionDB::into_entry)
                .collect(),
            LedgerTable::Contributions => contribution_transactions::table
                .select(ContributionTransactionDB::as_select())
                .load::<ContributionTransactionDB>(&mut conn)
                .into_core()?
                .into_iter()
                .filter_map(ContributionTransactionDB::into_entry)
                .collect(),
            LedgerTable::Loans => loan_transactions::table
                .select(LoanTransactionDB::as_select())
                .load::<LoanTransactionDB>(&mut conn)
                .into_core()?
                .into_iter()
                .filter_map(LoanTransactionDB::into_entry)
                .collect(),
        };

        Ok(entries)
    }

    async fn apply_balance_updates(
        &self,
        table: LedgerTable,
        updates: &[BalanceUpdate],
    ) -> Result<usize> {
        if updates.is_empty() {
            return Ok(0);
        }
        let updates = updates.to_vec();

        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let mut applied = 0usize;
                match table {
                    LedgerTable::Savings => {
                        for update in &updates {
                            applied += diesel::update(
                                savings_transactions::table.find(&update.entry_id),
                            )
                            .set((
                                savings_transactions::balance.eq(update.balance.to_string()),
                                savings_transactions::updated_at.eq(&now),
                            ))
                            .execute(conn)
                            .into_core()?;
                        }
                    }
                    LedgerTable::Contributions => {
                        for update in &updates {
                            applied += diesel::update(
                                contribution_transactions::table.find(&update.entry_id),
                            )
                            .set((
                                contribution_transactions::balance
                                    .eq(update.balance.to_string()),
                                contribution_transactions::updated_at.eq(&now),
                            ))
                            .execute(conn)
                            .into_core()?;
                        }
                    }
                    LedgerTable::Loans => {
                        for update in &updates {
                            applied += diesel::update(
                                loan_transactions::table.find(&update.entry_id),
                            )
                            .set((
                                loan_transactions::balance.eq(update.balance.to_string()),
                                loan_transactions::total
                                    .eq(update.total.map(|t| t.to_string())),
                                loan_transactions::updated_at.eq(&now),
                            ))
                            .execute(conn)
                            .into_core()?;
                        }
                    }
                }
                Ok(applied)
            })
            .await
    }

    async fn apply_flag_updates(
        &self,
        table: LedgerTable,
        updates: &[FlagUpdate],
    ) -> Result<usize> {
        if updates.is_empty() {
            return Ok(0);
        }
        let updates = updates.to_vec();

        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let mut applied = 0usize;
                match table {
                    LedgerTable::Savings => {
                        for update in &updates {
                            applied += diesel::update(
                                savings_transactions::table.find(&update.entry_id),
                            )
                            .set((
                                savings_transactions::operator_flag
                                    .eq(&update.operator_flag),
                                savings_transactions::updated_at.eq(&now),
                            ))
                            .execute(conn)
                            .into_core()?;
                        }
                    }
                    LedgerTable::Contributions => {
                        for update in &updates {
                            applied += diesel::update(
                                contribution_transactions::table.find(&update.entry_id),
                            )
                            .set((
                                contribution_transactions::operator_flag
                                    .eq(&update.operator_flag),
                                contribution_transactions::updated_at.eq(&now),
                            ))
                            .execute(conn)
                            .into_core()?;
                        }
                    }
                    LedgerTable::Loans => {
                        for update in &updates {
                            applied += diesel::update(
                                loan_transactions::table.find(&update.entry_id),
                            )
                            .set((
                                loan_transactions::operator_flag.eq(&update.operator_flag),
                                loan_transactions::updated_at.eq(&now),
                            ))
                            .execute(conn)
                            .into_core()?;
                        }
                    }
                }
                Ok(applied)
            })
            .await
    }
}

impl LedgerRepository {
    /// Inserts raw transaction rows, used by ingestion and test setup.
    pub async fn insert_entries(
        &self,
        table: LedgerTable,
        entries: Vec<LedgerEntry>,
    ) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        self.writer
            .exec(move |conn| {
                let inserted = match table {
                    LedgerTable::Savings => {
                        let rows: Vec<SavingsTransactionDB> =
                            entries.iter().map(SavingsTransactionDB::from_entry).collect();
                        diesel::insert_into(savings_transactions::table)
                            .values(&rows)
                            .execute(conn)
                            .into_core()?
                    }
                    LedgerTable::Contributions => {
                        let rows: Vec<ContributionTransactionDB> = entries
                            .iter()
                            .map(ContributionTransactionDB::from_entry)
                            .collect();
                        diesel::insert_into(contribution_transactions::table)
                            .values(&rows)
                            .execute(conn)
                            .into_core()?
                    }
                    LedgerTable::Loans => {
                        let rows: Vec<LoanTransactionDB> =
                            entries.iter().map(LoanTransactionDB::from_entry).collect();
                        diesel::insert_into(loan_transactions::table)
                            .values(&rows)
                            .execute(conn)
                            .into_core()?
                    }
                };
                Ok(inserted)
            })
            .await
    }
}
