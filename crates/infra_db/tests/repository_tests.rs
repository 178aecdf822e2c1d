//! Repository integration tests against a disposable PostgreSQL container.
//!
//! Each test boots its own container via `test_utils`, so tests never share
//! state and can assert on exact row contents.

use chrono::NaiveDate;

use core_kernel::{AccountId, Amount, UserId};
use domain_ledger::{EntryError, EntryOrigin, EntryType, Side};
use infra_db::{
    BalanceRepository, ChartRepository, ChartStoreError, DatabaseError, LedgerError,
    LedgerRepository, NewEntry, NewLine,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use test_utils::{
    seed_accounts, seed_reference_rows, AccountRows, DateFixtures, ReferenceRows, TestDatabase,
    TestResult,
};

async fn setup() -> TestResult<(TestDatabase, ReferenceRows, AccountRows)> {
    let db = TestDatabase::new().await?;
    let refs = seed_reference_rows(db.pool()).await?;
    let accounts = seed_accounts(db.pool()).await?;
    Ok((db, refs, accounts))
}

fn header(refs: &ReferenceRows, accrual_date: NaiveDate) -> NewEntry {
    NewEntry {
        posting_date: accrual_date,
        accrual_date,
        entry_type: EntryType::Normal,
        origin: EntryOrigin::Manual,
        document_number: "DOC-100".to_string(),
        description: "Service invoice".to_string(),
        external_code: String::new(),
        branch_id: refs.branch_id,
        user_id: UserId::new(),
    }
}

fn asset_line(refs: &ReferenceRows, account_id: AccountId, side: Side, cents: i64) -> NewLine {
    NewLine {
        account_id,
        branch_id: refs.branch_id,
        currency_id: refs.currency_id,
        history_code_id: refs.history_code_id,
        external_code: String::new(),
        amount: Amount::from_cents(cents),
        side,
        cost_centers: Vec::new(),
        projects: Vec::new(),
    }
}

/// Revenue lines must carry a cost-center breakdown; allocate the full
/// amount against the seeded cost center.
fn revenue_line(refs: &ReferenceRows, account_id: AccountId, side: Side, cents: i64) -> NewLine {
    let mut line = asset_line(refs, account_id, side, cents);
    line.cost_centers = vec![(refs.cost_center_id, Amount::from_cents(cents))];
    line
}

async fn count(db: &TestDatabase, table: &str) -> TestResult<i64> {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await?;
    Ok(count)
}

#[tokio::test]
async fn balanced_entry_persists_and_validates() -> TestResult<()> {
    let (db, refs, accounts) = setup().await?;
    let repository = LedgerRepository::new(db.pool().clone());

    let entry_id = repository
        .save_entry(
            None,
            header(&refs, DateFixtures::january_5th()),
            vec![
                asset_line(&refs, accounts.asset_leaf, Side::Debit, 10_000),
                revenue_line(&refs, accounts.revenue_leaf, Side::Credit, 10_000),
            ],
        )
        .await?;

    assert_eq!(count(&db, "ledger_entries").await?, 1);
    assert_eq!(count(&db, "entry_lines").await?, 2);
    assert_eq!(count(&db, "line_cost_center_allocations").await?, 1);

    repository.validate_entry(entry_id).await?;
    Ok(())
}

#[tokio::test]
async fn unbalanced_entry_leaves_no_rows() -> TestResult<()> {
    let (db, refs, accounts) = setup().await?;
    let repository = LedgerRepository::new(db.pool().clone());

    let result = repository
        .save_entry(
            None,
            header(&refs, DateFixtures::january_5th()),
            vec![
                asset_line(&refs, accounts.asset_leaf, Side::Debit, 10_000),
                revenue_line(&refs, accounts.revenue_leaf, Side::Credit, 5_000),
            ],
        )
        .await;

    assert!(matches!(
        result,
        Err(LedgerError::Validation(EntryError::Unbalanced { .. }))
    ));
    assert_eq!(count(&db, "ledger_entries").await?, 0);
    assert_eq!(count(&db, "entry_lines").await?, 0);
    assert_eq!(count(&db, "line_cost_center_allocations").await?, 0);
    Ok(())
}

#[tokio::test]
async fn posting_locked_period_rejects_entries() -> TestResult<()> {
    let (db, refs, accounts) = setup().await?;
    let repository = LedgerRepository::new(db.pool().clone());

    let result = repository
        .save_entry(
            None,
            header(&refs, DateFixtures::day(2024, 2, 10)),
            vec![
                asset_line(&refs, accounts.asset_leaf, Side::Debit, 10_000),
                revenue_line(&refs, accounts.revenue_leaf, Side::Credit, 10_000),
            ],
        )
        .await;

    match result {
        Err(LedgerError::PeriodLocked { code }) => assert_eq!(code, "2024-02"),
        other => panic!("expected PeriodLocked, got {other:?}"),
    }
    assert_eq!(count(&db, "ledger_entries").await?, 0);
    Ok(())
}

#[tokio::test]
async fn added_lines_require_revalidation() -> TestResult<()> {
    let (db, refs, accounts) = setup().await?;
    let repository = LedgerRepository::new(db.pool().clone());

    let entry_id = repository
        .save_entry(
            None,
            header(&refs, DateFixtures::january_5th()),
            vec![
                asset_line(&refs, accounts.asset_leaf, Side::Debit, 10_000),
                revenue_line(&refs, accounts.revenue_leaf, Side::Credit, 10_000),
            ],
        )
        .await?;

    repository
        .add_line(
            entry_id,
            asset_line(&refs, accounts.asset_leaf, Side::Debit, 2_500),
        )
        .await?;
    let result = repository.validate_entry(entry_id).await;
    assert!(matches!(
        result,
        Err(LedgerError::Validation(EntryError::Unbalanced { .. }))
    ));

    repository
        .add_line(
            entry_id,
            revenue_line(&refs, accounts.revenue_leaf, Side::Credit, 2_500),
        )
        .await?;
    repository.validate_entry(entry_id).await?;
    Ok(())
}

#[tokio::test]
async fn recomputing_twice_writes_identical_rows() -> TestResult<()> {
    let (db, refs, accounts) = setup().await?;
    let ledger = LedgerRepository::new(db.pool().clone());
    let balances = BalanceRepository::new(db.pool().clone());

    ledger
        .save_entry(
            None,
            header(&refs, DateFixtures::january_5th()),
            vec![
                asset_line(&refs, accounts.asset_leaf, Side::Debit, 10_000),
                revenue_line(&refs, accounts.revenue_leaf, Side::Credit, 10_000),
            ],
        )
        .await?;

    let written = balances
        .recompute_account_balances(refs.branch_id, refs.open_period_id)
        .await?;
    assert_eq!(written, 2);
    let first = fetch_account_balances(&db).await?;

    balances
        .recompute_account_balances(refs.branch_id, refs.open_period_id)
        .await?;
    let second = fetch_account_balances(&db).await?;

    assert_eq!(first, second);

    let hundred = Amount::from_cents(10_000).as_decimal();
    for (account_id, _, debit, credit, closing) in &first {
        if account_id == accounts.asset_leaf.as_uuid() {
            assert_eq!(*debit, hundred);
            assert_eq!(*closing, hundred);
        } else {
            assert_eq!(*credit, hundred);
            assert_eq!(*closing, -hundred);
        }
    }
    Ok(())
}

#[tokio::test]
async fn allocation_recompute_creates_parent_balance_rows() -> TestResult<()> {
    let (db, refs, accounts) = setup().await?;
    let ledger = LedgerRepository::new(db.pool().clone());
    let balances = BalanceRepository::new(db.pool().clone());

    let mut debit = asset_line(&refs, accounts.asset_leaf, Side::Debit, 10_000);
    debit.projects = vec![(refs.project_id, Amount::from_cents(10_000))];
    ledger
        .save_entry(
            None,
            header(&refs, DateFixtures::january_5th()),
            vec![
                debit,
                revenue_line(&refs, accounts.revenue_leaf, Side::Credit, 10_000),
            ],
        )
        .await?;

    // No account recompute first: the breakdown upserts must create their
    // zero-opening parent rows themselves.
    let written = balances
        .recompute_allocation_balances(refs.branch_id, refs.open_period_id)
        .await?;
    assert_eq!(written, 2);

    let hundred = Amount::from_cents(10_000).as_decimal();
    let (cc_credit,): (Decimal,) = sqlx::query_as(
        r#"
        SELECT b.credit
        FROM period_cost_center_balances b
        JOIN period_account_balances p ON p.id = b.account_balance_id
        WHERE p.account_id = $1 AND b.cost_center_id = $2
        "#,
    )
    .bind(accounts.revenue_leaf.as_uuid())
    .bind(refs.cost_center_id.as_uuid())
    .fetch_one(db.pool())
    .await?;
    assert_eq!(cc_credit, hundred);

    let (project_debit,): (Decimal,) = sqlx::query_as(
        r#"
        SELECT b.debit
        FROM period_project_balances b
        JOIN period_account_balances p ON p.id = b.account_balance_id
        WHERE p.account_id = $1 AND b.project_id = $2
        "#,
    )
    .bind(accounts.asset_leaf.as_uuid())
    .bind(refs.project_id.as_uuid())
    .fetch_one(db.pool())
    .await?;
    assert_eq!(project_debit, hundred);
    Ok(())
}

#[tokio::test]
async fn account_referenced_by_lines_cannot_be_deleted() -> TestResult<()> {
    let (db, refs, accounts) = setup().await?;
    let ledger = LedgerRepository::new(db.pool().clone());
    let chart = ChartRepository::new(db.pool().clone());

    ledger
        .save_entry(
            None,
            header(&refs, DateFixtures::january_5th()),
            vec![
                asset_line(&refs, accounts.asset_leaf, Side::Debit, 10_000),
                revenue_line(&refs, accounts.revenue_leaf, Side::Credit, 10_000),
            ],
        )
        .await?;

    let result = chart.delete_account(accounts.asset_leaf).await;
    assert!(matches!(
        result,
        Err(ChartStoreError::Database(
            DatabaseError::ForeignKeyViolation(_)
        ))
    ));
    Ok(())
}

async fn fetch_account_balances(
    db: &TestDatabase,
) -> TestResult<Vec<(Uuid, Decimal, Decimal, Decimal, Decimal)>> {
    let rows = sqlx::query_as(
        r#"
        SELECT account_id, opening, debit, credit, closing
        FROM period_account_balances
        ORDER BY account_id
        "#,
    )
    .fetch_all(db.pool())
    .await?;
    Ok(rows)
}
