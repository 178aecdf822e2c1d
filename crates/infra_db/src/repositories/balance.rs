//! Period balance repository
//!
//! Recomputes stored period balances from the active movement rows. Each
//! recompute replaces the debit/credit totals of the touched groups and
//! rederives the closing balance from the stored opening; groups with no
//! movement in the current data keep their previous totals.
//!
//! Concurrent recomputes of the same (branch, period) pair serialize on a
//! transaction-scoped advisory lock, so two writers cannot interleave their
//! read-aggregate-write cycles.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{AccountId, Amount, BalanceId, BranchId, CostCenterId, PeriodId, ProjectId};
use domain_ledger::{
    sum_by_account, sum_by_cost_center, sum_by_project, AccountMovement, CostCenterMovement,
    MovementTotals, ProjectMovement,
};

use super::codes;
use crate::error::DatabaseError;

/// Errors surfaced by balance recomputation
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("Period not found: {0}")]
    PeriodNotFound(PeriodId),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Repository for recomputing stored period balances
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    pool: PgPool,
}

impl BalanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Recomputes the per-account balances of one branch and period.
    ///
    /// Aggregates every active line whose entry falls in the period's date
    /// range and upserts one row per account: debit/credit are replaced,
    /// opening is preserved, closing is rederived as
    /// `opening + debit - credit`.
    #[instrument(skip(self))]
    pub async fn recompute_account_balances(
        &self,
        branch_id: BranchId,
        period_id: PeriodId,
    ) -> Result<usize, AggregationError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        acquire_recompute_lock(&mut tx, branch_id, period_id).await?;
        let (start_date, end_date) = load_period_dates(&mut tx, period_id).await?;

        let rows: Vec<(Uuid, String, Decimal)> = sqlx::query_as(
            r#"
            SELECT l.account_id, l.side, l.amount
            FROM entry_lines l
            JOIN ledger_entries e ON e.id = l.entry_id
            WHERE e.branch_id = $1
              AND e.accrual_date BETWEEN $2 AND $3
              AND e.active AND l.active
            "#,
        )
        .bind(branch_id.as_uuid())
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        let movements = rows
            .into_iter()
            .map(|(account_id, side, amount)| {
                Ok(AccountMovement {
                    account_id: AccountId::from_uuid(account_id),
                    side: codes::side_from_code(&side)?,
                    amount: Amount::new(amount),
                })
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;
        let groups = sum_by_account(&movements);

        let mut written = 0;
        for (account_id, totals) in &groups {
            upsert_account_balance(&mut tx, *account_id, branch_id, period_id, *totals).await?;
            written += 1;
        }

        tx.commit().await.map_err(DatabaseError::from)?;
        debug!(%branch_id, %period_id, accounts = written, "account balances recomputed");
        Ok(written)
    }

    /// Recomputes the cost-center and project breakdowns of one branch and
    /// period. Breakdown rows hang off the per-account balance row, which is
    /// created with a zero opening when absent.
    #[instrument(skip(self))]
    pub async fn recompute_allocation_balances(
        &self,
        branch_id: BranchId,
        period_id: PeriodId,
    ) -> Result<usize, AggregationError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        acquire_recompute_lock(&mut tx, branch_id, period_id).await?;
        let (start_date, end_date) = load_period_dates(&mut tx, period_id).await?;

        let cc_rows: Vec<(Uuid, Uuid, String, Decimal)> = sqlx::query_as(
            r#"
            SELECT l.account_id, a.cost_center_id, l.side, a.amount
            FROM line_cost_center_allocations a
            JOIN entry_lines l ON l.id = a.line_id
            JOIN ledger_entries e ON e.id = l.entry_id
            WHERE e.branch_id = $1
              AND e.accrual_date BETWEEN $2 AND $3
              AND e.active AND l.active
            "#,
        )
        .bind(branch_id.as_uuid())
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        let project_rows: Vec<(Uuid, Uuid, String, Decimal)> = sqlx::query_as(
            r#"
            SELECT l.account_id, a.project_id, l.side, a.amount
            FROM line_project_allocations a
            JOIN entry_lines l ON l.id = a.line_id
            JOIN ledger_entries e ON e.id = l.entry_id
            WHERE e.branch_id = $1
              AND e.accrual_date BETWEEN $2 AND $3
              AND e.active AND l.active
            "#,
        )
        .bind(branch_id.as_uuid())
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        let cc_movements = cc_rows
            .into_iter()
            .map(|(account_id, cost_center_id, side, amount)| {
                Ok(CostCenterMovement {
                    account_id: AccountId::from_uuid(account_id),
                    cost_center_id: CostCenterId::from_uuid(cost_center_id),
                    side: codes::side_from_code(&side)?,
                    amount: Amount::new(amount),
                })
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;
        let project_movements = project_rows
            .into_iter()
            .map(|(account_id, project_id, side, amount)| {
                Ok(ProjectMovement {
                    account_id: AccountId::from_uuid(account_id),
                    project_id: ProjectId::from_uuid(project_id),
                    side: codes::side_from_code(&side)?,
                    amount: Amount::new(amount),
                })
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;

        let mut written = 0;
        for ((account_id, cost_center_id), totals) in &sum_by_cost_center(&cc_movements) {
            let parent_id =
                get_or_create_account_balance(&mut tx, *account_id, branch_id, period_id).await?;
            upsert_cost_center_balance(&mut tx, parent_id, *cost_center_id, period_id, *totals)
                .await?;
            written += 1;
        }
        for ((account_id, project_id), totals) in &sum_by_project(&project_movements) {
            let parent_id =
                get_or_create_account_balance(&mut tx, *account_id, branch_id, period_id).await?;
            upsert_project_balance(&mut tx, parent_id, *project_id, period_id, *totals).await?;
            written += 1;
        }

        tx.commit().await.map_err(DatabaseError::from)?;
        debug!(%branch_id, %period_id, groups = written, "allocation balances recomputed");
        Ok(written)
    }
}

/// Derives the advisory lock key of a (branch, period) pair by xoring the
/// leading eight bytes of each UUID. Collisions between distinct pairs only
/// cost extra serialization, never correctness.
fn advisory_lock_key(branch_id: BranchId, period_id: PeriodId) -> i64 {
    let branch = first_eight_bytes(branch_id.as_uuid());
    let period = first_eight_bytes(period_id.as_uuid());
    (branch ^ period) as i64
}

fn first_eight_bytes(uuid: &Uuid) -> u64 {
    let bytes = uuid.as_bytes();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(prefix)
}

async fn acquire_recompute_lock(
    tx: &mut Transaction<'_, Postgres>,
    branch_id: BranchId,
    period_id: PeriodId,
) -> Result<(), AggregationError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(advisory_lock_key(branch_id, period_id))
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;
    Ok(())
}

async fn load_period_dates(
    tx: &mut Transaction<'_, Postgres>,
    period_id: PeriodId,
) -> Result<(chrono::NaiveDate, chrono::NaiveDate), AggregationError> {
    let row: Option<(chrono::NaiveDate, chrono::NaiveDate)> =
        sqlx::query_as("SELECT start_date, end_date FROM periods WHERE id = $1")
            .bind(period_id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(DatabaseError::from)?;
    row.ok_or(AggregationError::PeriodNotFound(period_id))
}

async fn upsert_account_balance(
    tx: &mut Transaction<'_, Postgres>,
    account_id: AccountId,
    branch_id: BranchId,
    period_id: PeriodId,
    totals: MovementTotals,
) -> Result<(), AggregationError> {
    sqlx::query(
        r#"
        INSERT INTO period_account_balances
            (id, account_id, branch_id, period_id, opening, debit, credit, closing)
        VALUES ($1, $2, $3, $4, 0, $5, $6, $5 - $6)
        ON CONFLICT (account_id, branch_id, period_id) DO UPDATE
        SET debit = EXCLUDED.debit,
            credit = EXCLUDED.credit,
            closing = period_account_balances.opening + EXCLUDED.debit - EXCLUDED.credit
        "#,
    )
    .bind(BalanceId::new_v7().as_uuid())
    .bind(account_id.as_uuid())
    .bind(branch_id.as_uuid())
    .bind(period_id.as_uuid())
    .bind(totals.debit.as_decimal())
    .bind(totals.credit.as_decimal())
    .execute(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;
    Ok(())
}

/// Returns the id of the per-account balance row, inserting a zero-opening
/// row when the account has none for this branch and period yet.
async fn get_or_create_account_balance(
    tx: &mut Transaction<'_, Postgres>,
    account_id: AccountId,
    branch_id: BranchId,
    period_id: PeriodId,
) -> Result<BalanceId, AggregationError> {
    sqlx::query(
        r#"
        INSERT INTO period_account_balances
            (id, account_id, branch_id, period_id, opening, debit, credit, closing)
        VALUES ($1, $2, $3, $4, 0, 0, 0, 0)
        ON CONFLICT (account_id, branch_id, period_id) DO NOTHING
        "#,
    )
    .bind(BalanceId::new_v7().as_uuid())
    .bind(account_id.as_uuid())
    .bind(branch_id.as_uuid())
    .bind(period_id.as_uuid())
    .execute(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        SELECT id FROM period_account_balances
        WHERE account_id = $1 AND branch_id = $2 AND period_id = $3
        "#,
    )
    .bind(account_id.as_uuid())
    .bind(branch_id.as_uuid())
    .bind(period_id.as_uuid())
    .fetch_one(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;
    Ok(BalanceId::from_uuid(id))
}

async fn upsert_cost_center_balance(
    tx: &mut Transaction<'_, Postgres>,
    account_balance_id: BalanceId,
    cost_center_id: CostCenterId,
    period_id: PeriodId,
    totals: MovementTotals,
) -> Result<(), AggregationError> {
    sqlx::query(
        r#"
        INSERT INTO period_cost_center_balances
            (id, account_balance_id, cost_center_id, period_id, opening, debit, credit, closing)
        VALUES ($1, $2, $3, $4, 0, $5, $6, $5 - $6)
        ON CONFLICT (account_balance_id, cost_center_id, period_id) DO UPDATE
        SET debit = EXCLUDED.debit,
            credit = EXCLUDED.credit,
            closing = period_cost_center_balances.opening + EXCLUDED.debit - EXCLUDED.credit
        "#,
    )
    .bind(BalanceId::new_v7().as_uuid())
    .bind(account_balance_id.as_uuid())
    .bind(cost_center_id.as_uuid())
    .bind(period_id.as_uuid())
    .bind(totals.debit.as_decimal())
    .bind(totals.credit.as_decimal())
    .execute(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;
    Ok(())
}

async fn upsert_project_balance(
    tx: &mut Transaction<'_, Postgres>,
    account_balance_id: BalanceId,
    project_id: ProjectId,
    period_id: PeriodId,
    totals: MovementTotals,
) -> Result<(), AggregationError> {
    sqlx::query(
        r#"
        INSERT INTO period_project_balances
            (id, account_balance_id, project_id, period_id, opening, debit, credit, closing)
        VALUES ($1, $2, $3, $4, 0, $5, $6, $5 - $6)
        ON CONFLICT (account_balance_id, project_id, period_id) DO UPDATE
        SET debit = EXCLUDED.debit,
            credit = EXCLUDED.credit,
            closing = period_project_balances.opening + EXCLUDED.debit - EXCLUDED.credit
        "#,
    )
    .bind(BalanceId::new_v7().as_uuid())
    .bind(account_balance_id.as_uuid())
    .bind(project_id.as_uuid())
    .bind(period_id.as_uuid())
    .bind(totals.debit.as_decimal())
    .bind(totals.credit.as_decimal())
    .execute(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_key_is_symmetric_in_neither_argument() {
        let branch = BranchId::new();
        let period = PeriodId::new();
        let key = advisory_lock_key(branch, period);

        assert_eq!(key, advisory_lock_key(branch, period));
        assert_ne!(key, advisory_lock_key(BranchId::new(), period));
    }

    #[test]
    fn lock_key_uses_uuid_prefix() {
        let branch = BranchId::from_uuid(Uuid::from_bytes([0xFF; 16]));
        let period = PeriodId::from_uuid(Uuid::from_bytes([0x00; 16]));
        assert_eq!(advisory_lock_key(branch, period), u64::MAX as i64);
    }
}
