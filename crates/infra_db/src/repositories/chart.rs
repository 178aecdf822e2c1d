//! Chart repository
//!
//! Database access for the chart of accounts and the cost center tree.
//! Inserts run the domain validation (level derivation, parent rules, cycle
//! detection) against the persisted tree before writing; deletions rely on
//! the schema's protecting foreign keys and surface violations unretried.

use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{AccountId, CostCenterId};
use domain_chart::{
    validate as validate_account, Account, AccountError, CostCenter, CostCenterError,
    CostCenterTree, Classification,
};

use super::codes;
use crate::error::DatabaseError;

/// Errors surfaced by chart maintenance operations
#[derive(Debug, Error)]
pub enum ChartStoreError {
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    CostCenter(#[from] CostCenterError),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Repository for chart-of-accounts and cost-center reference data
#[derive(Debug, Clone)]
pub struct ChartRepository {
    pool: PgPool,
}

impl ChartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Validates and inserts a chart-of-accounts node.
    ///
    /// The stored level is derived from the code shape; the supplied
    /// `account.level` is ignored. The explicit classification is stored as
    /// given (possibly absent) so later edits to the derivation table never
    /// rewrite explicit choices.
    #[instrument(skip(self, account), fields(code = %account.code))]
    pub async fn insert_account(&self, account: &Account) -> Result<AccountId, ChartStoreError> {
        let parent = match account.parent_id {
            Some(parent_id) => Some(self.fetch_account(parent_id).await?),
            None => None,
        };
        let level = validate_account(account, parent.as_ref())?;

        sqlx::query(
            r#"
            INSERT INTO accounts
                (id, code, description, kind, nature, display_order, level, parent_id, classification)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.code)
        .bind(&account.description)
        .bind(codes::kind_code(account.kind))
        .bind(codes::nature_code(account.nature))
        .bind(account.display_order)
        .bind(i16::from(level))
        .bind(account.parent_id.map(|id| *id.as_uuid()))
        .bind(account.classification.map(codes::classification_code))
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(account.id)
    }

    /// Loads one account row.
    pub async fn fetch_account(&self, id: AccountId) -> Result<Account, ChartStoreError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, code, description, kind, nature, display_order, level, parent_id, classification
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        row.ok_or(ChartStoreError::AccountNotFound(id))?
            .into_domain()
            .map_err(ChartStoreError::Database)
    }

    /// Deletes an account. Children and ledger lines protect the row via
    /// restricting foreign keys; the violation is surfaced as a rejection.
    #[instrument(skip(self))]
    pub async fn delete_account(&self, id: AccountId) -> Result<(), ChartStoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            return Err(ChartStoreError::AccountNotFound(id));
        }
        Ok(())
    }

    /// Validates and inserts a cost center, deriving its level from the
    /// persisted tree and rejecting ancestor cycles.
    #[instrument(skip(self, node), fields(code = %node.code))]
    pub async fn insert_cost_center(
        &self,
        node: &CostCenter,
    ) -> Result<CostCenterId, ChartStoreError> {
        let tree = self.load_cost_center_tree().await?;
        let level = tree.validate(node)?;

        sqlx::query(
            r#"
            INSERT INTO cost_centers (id, code, description, kind, parent_id, level, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(node.id.as_uuid())
        .bind(&node.code)
        .bind(&node.description)
        .bind(cost_center_kind_code(node.kind))
        .bind(node.parent_id.map(|id| *id.as_uuid()))
        .bind(i16::from(level))
        .bind(node.active)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(node.id)
    }

    /// Reparents an existing cost center after re-validating the tree.
    #[instrument(skip(self))]
    pub async fn reparent_cost_center(
        &self,
        id: CostCenterId,
        new_parent: Option<CostCenterId>,
    ) -> Result<(), ChartStoreError> {
        let tree = self.load_cost_center_tree().await?;
        let mut node = tree
            .get(id)
            .ok_or(CostCenterError::UnknownParent(id))?
            .clone();
        node.parent_id = new_parent;
        let level = tree.validate(&node)?;

        sqlx::query("UPDATE cost_centers SET parent_id = $2, level = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(new_parent.map(|p| *p.as_uuid()))
            .bind(i16::from(level))
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        Ok(())
    }

    /// Loads the whole cost center tree. It is small reference data; cycle
    /// detection needs the full ancestor chains anyway.
    pub async fn load_cost_center_tree(&self) -> Result<CostCenterTree, ChartStoreError> {
        let rows: Vec<CostCenterRow> = sqlx::query_as(
            "SELECT id, code, description, kind, parent_id, level, active FROM cost_centers",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let nodes = rows
            .into_iter()
            .map(|row| row.into_domain())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CostCenterTree::from_nodes(nodes))
    }
}

/// Loads effective classifications for a set of accounts within an open
/// transaction. Used by the ledger repository during entry validation.
pub(crate) async fn load_classifications(
    conn: &mut PgConnection,
    account_ids: &[Uuid],
) -> Result<HashMap<Uuid, Classification>, DatabaseError> {
    let rows: Vec<(Uuid, String, Option<String>)> = sqlx::query_as(
        "SELECT id, code, classification FROM accounts WHERE id = ANY($1)",
    )
    .bind(account_ids)
    .fetch_all(conn)
    .await?;

    let mut map = HashMap::with_capacity(rows.len());
    for (id, code, stored) in rows {
        let classification = match stored {
            Some(code_char) => codes::classification_from_code(&code_char)?,
            None => Classification::from_code(&code),
        };
        map.insert(id, classification);
    }
    Ok(map)
}

fn cost_center_kind_code(kind: domain_chart::CostCenterKind) -> &'static str {
    match kind {
        domain_chart::CostCenterKind::Operational => "O",
        domain_chart::CostCenterKind::Administrative => "A",
        domain_chart::CostCenterKind::Commercial => "C",
        domain_chart::CostCenterKind::Other => "K",
    }
}

fn cost_center_kind_from_code(
    code: &str,
) -> Result<domain_chart::CostCenterKind, DatabaseError> {
    match code {
        "O" => Ok(domain_chart::CostCenterKind::Operational),
        "A" => Ok(domain_chart::CostCenterKind::Administrative),
        "C" => Ok(domain_chart::CostCenterKind::Commercial),
        "K" => Ok(domain_chart::CostCenterKind::Other),
        other => Err(DatabaseError::SerializationError(format!(
            "Unknown cost center kind code: {other}"
        ))),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    code: String,
    description: String,
    kind: String,
    nature: String,
    display_order: i32,
    level: i16,
    parent_id: Option<Uuid>,
    classification: Option<String>,
}

impl AccountRow {
    fn into_domain(self) -> Result<Account, DatabaseError> {
        Ok(Account {
            id: AccountId::from_uuid(self.id),
            code: self.code,
            description: self.description,
            kind: codes::kind_from_code(&self.kind)?,
            nature: codes::nature_from_code(&self.nature)?,
            display_order: self.display_order,
            level: self.level as u8,
            parent_id: self.parent_id.map(AccountId::from_uuid),
            classification: self
                .classification
                .as_deref()
                .map(codes::classification_from_code)
                .transpose()?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CostCenterRow {
    id: Uuid,
    code: String,
    description: String,
    kind: String,
    parent_id: Option<Uuid>,
    level: i16,
    active: bool,
}

impl CostCenterRow {
    fn into_domain(self) -> Result<CostCenter, DatabaseError> {
        Ok(CostCenter {
            id: CostCenterId::from_uuid(self.id),
            code: self.code,
            description: self.description,
            kind: cost_center_kind_from_code(&self.kind)?,
            parent_id: self.parent_id.map(CostCenterId::from_uuid),
            level: self.level as u8,
            active: self.active,
        })
    }
}
