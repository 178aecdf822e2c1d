//! Ledger repository
//!
//! Database access for journal entries, lines and allocations. Entry
//! persistence and validation run inside one transaction: if validation
//! fails after rows are written the transaction rolls back in full, so a
//! partial entry is never observable.

use chrono::{NaiveDate, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AccountId, AllocationId, Amount, BranchId, CostCenterId, CurrencyId, EntryId, HistoryCodeId,
    LineId, ProjectId, UserId,
};
use domain_ledger::{
    validate_entry, CostCenterAllocation, Entry, EntryError, EntryOrigin, EntryType, Line,
    LineDetail, PeriodStatus, ProjectAllocation, Side,
};

use super::{chart, codes};
use crate::error::DatabaseError;

/// Errors surfaced by ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The accrual date falls in a period that refuses new postings
    #[error("Period {code} does not accept postings")]
    PeriodLocked { code: String },

    /// Business-rule failure; blocks the enclosing transaction
    #[error(transparent)]
    Validation(#[from] EntryError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Data for creating or replacing an entry header
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub posting_date: NaiveDate,
    pub accrual_date: NaiveDate,
    pub entry_type: EntryType,
    pub origin: EntryOrigin,
    pub document_number: String,
    pub description: String,
    pub external_code: String,
    pub branch_id: BranchId,
    pub user_id: UserId,
}

/// Data for one line plus its allocation splits
#[derive(Debug, Clone)]
pub struct NewLine {
    pub account_id: AccountId,
    pub branch_id: BranchId,
    pub currency_id: CurrencyId,
    pub history_code_id: HistoryCodeId,
    pub external_code: String,
    pub amount: Amount,
    pub side: Side,
    pub cost_centers: Vec<(CostCenterId, Amount)>,
    pub projects: Vec<(ProjectId, Amount)>,
}

/// Repository for the posting flow
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persists an entry with its lines and allocations, validates it, and
    /// commits, all atomically. Passing an existing id replaces the header
    /// and lines (the cascade removes old allocations).
    ///
    /// Validation failure rolls everything back and surfaces the structured
    /// error.
    #[instrument(skip(self, header, lines), fields(branch = %header.branch_id))]
    pub async fn save_entry(
        &self,
        entry_id: Option<EntryId>,
        header: NewEntry,
        lines: Vec<NewLine>,
    ) -> Result<EntryId, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        check_period_accepts(&mut tx, header.branch_id, header.accrual_date).await?;

        let entry_id = match entry_id {
            Some(id) => {
                replace_header(&mut tx, id, &header).await?;
                sqlx::query("DELETE FROM entry_lines WHERE entry_id = $1")
                    .bind(id.as_uuid())
                    .execute(&mut *tx)
                    .await
                    .map_err(DatabaseError::from)?;
                id
            }
            None => insert_header(&mut tx, &header).await?,
        };

        let mut details = Vec::with_capacity(lines.len());
        for line in &lines {
            details.push(insert_line(&mut tx, entry_id, line).await?);
        }
        attach_classifications(&mut *tx, &mut details).await?;

        let entry = header.into_entry(entry_id);
        validate_entry(&entry, &details)?;

        tx.commit().await.map_err(DatabaseError::from)?;
        debug!(%entry_id, lines = details.len(), "entry saved");
        Ok(entry_id)
    }

    /// Adds one line to an existing entry without running full-entry
    /// validation. Callers must invoke [`Self::validate_entry`] before
    /// treating the entry as posted.
    #[instrument(skip(self, line))]
    pub async fn add_line(
        &self,
        entry_id: EntryId,
        line: NewLine,
    ) -> Result<LineId, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let header: Option<(Uuid, NaiveDate)> =
            sqlx::query_as("SELECT branch_id, accrual_date FROM ledger_entries WHERE id = $1")
                .bind(entry_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(DatabaseError::from)?;
        let (branch_id, accrual_date) = header.ok_or(LedgerError::EntryNotFound(entry_id))?;
        check_period_accepts(&mut tx, BranchId::from_uuid(branch_id), accrual_date).await?;

        let detail = insert_line(&mut tx, entry_id, &line).await?;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(detail.line.id)
    }

    /// Re-runs the full entry validation against the persisted rows.
    ///
    /// "Balanced" is a derived predicate, never a stored status: every code
    /// path that treats an entry as final re-runs this check rather than
    /// trusting a cached flag.
    #[instrument(skip(self))]
    pub async fn validate_entry(&self, entry_id: EntryId) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;

        let entry = load_entry(&mut conn, entry_id)
            .await?
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        let mut details = load_line_details(&mut conn, entry_id).await?;
        attach_classifications(&mut conn, &mut details).await?;

        validate_entry(&entry, &details)?;
        Ok(())
    }

    /// Soft-deletes an entry; its lines stay for audit but leave the
    /// posted ledger.
    #[instrument(skip(self))]
    pub async fn deactivate_entry(&self, entry_id: EntryId) -> Result<(), LedgerError> {
        let result = sqlx::query(
            "UPDATE ledger_entries SET active = FALSE, updated_at = $2 WHERE id = $1",
        )
        .bind(entry_id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::EntryNotFound(entry_id));
        }
        Ok(())
    }
}

impl NewEntry {
    fn into_entry(self, id: EntryId) -> Entry {
        Entry {
            id,
            posting_date: self.posting_date,
            accrual_date: self.accrual_date,
            entry_type: self.entry_type,
            origin: self.origin,
            document_number: self.document_number,
            description: self.description,
            external_code: self.external_code,
            branch_id: self.branch_id,
            user_id: self.user_id,
            active: true,
            created_at: Utc::now(),
        }
    }
}

/// Rejects postings whose accrual date falls in a period that is closed,
/// locked, or flagged against postings. Entries dated outside any defined
/// period pass; period coverage is an operational choice, not a core rule.
async fn check_period_accepts(
    tx: &mut Transaction<'_, Postgres>,
    branch_id: BranchId,
    accrual_date: NaiveDate,
) -> Result<(), LedgerError> {
    let row: Option<(String, String, bool)> = sqlx::query_as(
        r#"
        SELECT p.code, p.status, p.posting_locked
        FROM periods p
        WHERE p.active
          AND p.start_date <= $2 AND p.end_date >= $2
          AND (p.legal_entity_id IS NULL
               OR p.legal_entity_id = (SELECT legal_entity_id FROM branches WHERE id = $1))
        ORDER BY p.legal_entity_id NULLS LAST
        LIMIT 1
        "#,
    )
    .bind(branch_id.as_uuid())
    .bind(accrual_date)
    .fetch_optional(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;

    if let Some((code, status, posting_locked)) = row {
        let status = codes::period_status_from_code(&status)?;
        if status != PeriodStatus::Open || posting_locked {
            return Err(LedgerError::PeriodLocked { code });
        }
    }
    Ok(())
}

async fn insert_header(
    tx: &mut Transaction<'_, Postgres>,
    header: &NewEntry,
) -> Result<EntryId, LedgerError> {
    let id = EntryId::new_v7();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO ledger_entries
            (id, posting_date, accrual_date, entry_type, origin, document_number,
             description, external_code, branch_id, user_id, active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, TRUE, $11, $11)
        "#,
    )
    .bind(id.as_uuid())
    .bind(header.posting_date)
    .bind(header.accrual_date)
    .bind(codes::entry_type_code(header.entry_type))
    .bind(codes::origin_code(header.origin))
    .bind(&header.document_number)
    .bind(&header.description)
    .bind(&header.external_code)
    .bind(header.branch_id.as_uuid())
    .bind(header.user_id.as_uuid())
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;
    Ok(id)
}

async fn replace_header(
    tx: &mut Transaction<'_, Postgres>,
    id: EntryId,
    header: &NewEntry,
) -> Result<(), LedgerError> {
    let result = sqlx::query(
        r#"
        UPDATE ledger_entries
        SET posting_date = $2, accrual_date = $3, entry_type = $4, origin = $5,
            document_number = $6, description = $7, external_code = $8,
            branch_id = $9, user_id = $10, updated_at = $11
        WHERE id = $1
        "#,
    )
    .bind(id.as_uuid())
    .bind(header.posting_date)
    .bind(header.accrual_date)
    .bind(codes::entry_type_code(header.entry_type))
    .bind(codes::origin_code(header.origin))
    .bind(&header.document_number)
    .bind(&header.description)
    .bind(&header.external_code)
    .bind(header.branch_id.as_uuid())
    .bind(header.user_id.as_uuid())
    .bind(Utc::now())
    .execute(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;

    if result.rows_affected() == 0 {
        return Err(LedgerError::EntryNotFound(id));
    }
    Ok(())
}

async fn insert_line(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: EntryId,
    line: &NewLine,
) -> Result<LineDetail, LedgerError> {
    let line_id = LineId::new_v7();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO entry_lines
            (id, entry_id, account_id, branch_id, currency_id, history_code_id,
             external_code, amount, side, active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10, $10)
        "#,
    )
    .bind(line_id.as_uuid())
    .bind(entry_id.as_uuid())
    .bind(line.account_id.as_uuid())
    .bind(line.branch_id.as_uuid())
    .bind(line.currency_id.as_uuid())
    .bind(line.history_code_id.as_uuid())
    .bind(&line.external_code)
    .bind(line.amount.as_decimal())
    .bind(codes::side_code(line.side))
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;

    let mut cost_centers = Vec::with_capacity(line.cost_centers.len());
    for (cost_center_id, amount) in &line.cost_centers {
        let allocation_id = AllocationId::new_v7();
        sqlx::query(
            r#"
            INSERT INTO line_cost_center_allocations (id, line_id, cost_center_id, amount)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(allocation_id.as_uuid())
        .bind(line_id.as_uuid())
        .bind(cost_center_id.as_uuid())
        .bind(amount.as_decimal())
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;
        cost_centers.push(CostCenterAllocation {
            id: allocation_id,
            line_id,
            cost_center_id: *cost_center_id,
            amount: *amount,
        });
    }

    let mut projects = Vec::with_capacity(line.projects.len());
    for (project_id, amount) in &line.projects {
        let allocation_id = AllocationId::new_v7();
        sqlx::query(
            r#"
            INSERT INTO line_project_allocations (id, line_id, project_id, amount)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(allocation_id.as_uuid())
        .bind(line_id.as_uuid())
        .bind(project_id.as_uuid())
        .bind(amount.as_decimal())
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;
        projects.push(ProjectAllocation {
            id: allocation_id,
            line_id,
            project_id: *project_id,
            amount: *amount,
        });
    }

    Ok(LineDetail {
        line: Line {
            id: line_id,
            entry_id,
            account_id: line.account_id,
            branch_id: line.branch_id,
            currency_id: line.currency_id,
            history_code_id: line.history_code_id,
            external_code: line.external_code.clone(),
            amount: line.amount,
            side: line.side,
            active: true,
        },
        // Placeholder until attach_classifications resolves the account.
        classification: domain_chart::Classification::Other,
        cost_centers,
        projects,
    })
}

/// Resolves each detail's account classification from the chart.
async fn attach_classifications(
    conn: &mut PgConnection,
    details: &mut [LineDetail],
) -> Result<(), LedgerError> {
    let account_ids: Vec<Uuid> = details
        .iter()
        .map(|detail| *detail.line.account_id.as_uuid())
        .collect();
    let classifications = chart::load_classifications(conn, &account_ids).await?;

    for detail in details.iter_mut() {
        let account_uuid = detail.line.account_id.as_uuid();
        detail.classification = *classifications
            .get(account_uuid)
            .ok_or(LedgerError::AccountNotFound(detail.line.account_id))?;
    }
    Ok(())
}

async fn load_entry(
    conn: &mut PgConnection,
    entry_id: EntryId,
) -> Result<Option<Entry>, LedgerError> {
    let row: Option<EntryRow> = sqlx::query_as(
        r#"
        SELECT id, posting_date, accrual_date, entry_type, origin, document_number,
               description, external_code, branch_id, user_id, active, created_at
        FROM ledger_entries
        WHERE id = $1
        "#,
    )
    .bind(entry_id.as_uuid())
    .fetch_optional(conn)
    .await
    .map_err(DatabaseError::from)?;

    row.map(EntryRow::into_domain).transpose()
}

async fn load_line_details(
    conn: &mut PgConnection,
    entry_id: EntryId,
) -> Result<Vec<LineDetail>, LedgerError> {
    let rows: Vec<LineRow> = sqlx::query_as(
        r#"
        SELECT id, entry_id, account_id, branch_id, currency_id, history_code_id,
               external_code, amount, side, active
        FROM entry_lines
        WHERE entry_id = $1
        ORDER BY created_at
        "#,
    )
    .bind(entry_id.as_uuid())
    .fetch_all(&mut *conn)
    .await
    .map_err(DatabaseError::from)?;

    let mut details = Vec::with_capacity(rows.len());
    for row in rows {
        let line = row.into_domain()?;
        let line_uuid = *line.id.as_uuid();

        let cc_rows: Vec<(Uuid, Uuid, rust_decimal::Decimal)> = sqlx::query_as(
            "SELECT id, cost_center_id, amount FROM line_cost_center_allocations WHERE line_id = $1",
        )
        .bind(line_uuid)
        .fetch_all(&mut *conn)
        .await
        .map_err(DatabaseError::from)?;

        let project_rows: Vec<(Uuid, Uuid, rust_decimal::Decimal)> = sqlx::query_as(
            "SELECT id, project_id, amount FROM line_project_allocations WHERE line_id = $1",
        )
        .bind(line_uuid)
        .fetch_all(&mut *conn)
        .await
        .map_err(DatabaseError::from)?;

        details.push(LineDetail {
            cost_centers: cc_rows
                .into_iter()
                .map(|(id, cost_center_id, amount)| CostCenterAllocation {
                    id: AllocationId::from_uuid(id),
                    line_id: line.id,
                    cost_center_id: CostCenterId::from_uuid(cost_center_id),
                    amount: Amount::new(amount),
                })
                .collect(),
            projects: project_rows
                .into_iter()
                .map(|(id, project_id, amount)| ProjectAllocation {
                    id: AllocationId::from_uuid(id),
                    line_id: line.id,
                    project_id: ProjectId::from_uuid(project_id),
                    amount: Amount::new(amount),
                })
                .collect(),
            classification: domain_chart::Classification::Other,
            line,
        });
    }
    Ok(details)
}

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    posting_date: NaiveDate,
    accrual_date: NaiveDate,
    entry_type: String,
    origin: String,
    document_number: String,
    description: String,
    external_code: String,
    branch_id: Uuid,
    user_id: Uuid,
    active: bool,
    created_at: chrono::DateTime<Utc>,
}

impl EntryRow {
    fn into_domain(self) -> Result<Entry, LedgerError> {
        Ok(Entry {
            id: EntryId::from_uuid(self.id),
            posting_date: self.posting_date,
            accrual_date: self.accrual_date,
            entry_type: codes::entry_type_from_code(&self.entry_type)?,
            origin: codes::origin_from_code(&self.origin)?,
            document_number: self.document_number,
            description: self.description,
            external_code: self.external_code,
            branch_id: BranchId::from_uuid(self.branch_id),
            user_id: UserId::from_uuid(self.user_id),
            active: self.active,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: Uuid,
    entry_id: Uuid,
    account_id: Uuid,
    branch_id: Uuid,
    currency_id: Uuid,
    history_code_id: Uuid,
    external_code: String,
    amount: rust_decimal::Decimal,
    side: String,
    active: bool,
}

impl LineRow {
    fn into_domain(self) -> Result<Line, LedgerError> {
        Ok(Line {
            id: LineId::from_uuid(self.id),
            entry_id: EntryId::from_uuid(self.entry_id),
            account_id: AccountId::from_uuid(self.account_id),
            branch_id: BranchId::from_uuid(self.branch_id),
            currency_id: CurrencyId::from_uuid(self.currency_id),
            history_code_id: HistoryCodeId::from_uuid(self.history_code_id),
            external_code: self.external_code,
            amount: Amount::new(self.amount),
            side: codes::side_from_code(&self.side)?,
            active: self.active,
        })
    }
}
