//! Period Balance Aggregation Tests
//!
//! The month-end scenario: balanced, allocated entries inside a period roll
//! up into per-account snapshots with matching cost-center breakdowns, and
//! recomputation is idempotent.

use core_kernel::{AccountId, Amount, BranchId, CostCenterId, PeriodId, ProjectId};
use domain_ledger::{
    sum_by_account, sum_by_cost_center, sum_by_project, AccountMovement, AccountPeriodBalance,
    CostCenterMovement, CostCenterPeriodBalance, MovementTotals, ProjectMovement, Side,
};
use test_utils::PeriodFixtures;

fn movement(account_id: AccountId, side: Side, cents: i64) -> AccountMovement {
    AccountMovement {
        account_id,
        side,
        amount: Amount::from_cents(cents),
    }
}

#[test]
fn two_balanced_entries_roll_up_to_zero_closing() {
    // Two entries dated inside January, 100.00 debit/credit in total on the
    // same account.
    let period = PeriodFixtures::january_2024();
    let account = AccountId::new();
    let branch = BranchId::new();
    let movements = vec![
        movement(account, Side::Debit, 6_000),
        movement(account, Side::Credit, 6_000),
        movement(account, Side::Debit, 4_000),
        movement(account, Side::Credit, 4_000),
    ];

    let groups = sum_by_account(&movements);
    assert_eq!(groups.len(), 1);

    let mut balance = AccountPeriodBalance::opening_zero(account, branch, period.id);
    balance.replace_movement(groups[&account]);

    assert_eq!(balance.debit, Amount::from_cents(10_000));
    assert_eq!(balance.credit, Amount::from_cents(10_000));
    assert_eq!(balance.opening, Amount::ZERO);
    assert_eq!(balance.closing, Amount::ZERO);
}

#[test]
fn cost_center_breakdown_mirrors_account_totals() {
    let account = AccountId::new();
    let cost_center = CostCenterId::new();
    let period = PeriodFixtures::january_2024();

    let line_movements = vec![
        movement(account, Side::Debit, 10_000),
        movement(account, Side::Credit, 10_000),
    ];
    let allocation_movements = vec![
        CostCenterMovement {
            account_id: account,
            cost_center_id: cost_center,
            side: Side::Debit,
            amount: Amount::from_cents(10_000),
        },
        CostCenterMovement {
            account_id: account,
            cost_center_id: cost_center,
            side: Side::Credit,
            amount: Amount::from_cents(10_000),
        },
    ];

    let account_groups = sum_by_account(&line_movements);
    let cc_groups = sum_by_cost_center(&allocation_movements);

    let mut account_balance =
        AccountPeriodBalance::opening_zero(account, BranchId::new(), period.id);
    account_balance.replace_movement(account_groups[&account]);

    let mut cc_balance =
        CostCenterPeriodBalance::opening_zero(account_balance.id, cost_center, period.id);
    cc_balance.replace_movement(cc_groups[&(account, cost_center)]);

    assert_eq!(cc_balance.debit, account_balance.debit);
    assert_eq!(cc_balance.credit, account_balance.credit);
    assert_eq!(cc_balance.closing, account_balance.closing);
}

#[test]
fn recompute_is_idempotent() {
    let account = AccountId::new();
    let movements = vec![
        movement(account, Side::Debit, 12_345),
        movement(account, Side::Credit, 2_345),
    ];

    let mut balance =
        AccountPeriodBalance::opening_zero(account, BranchId::new(), PeriodId::new());
    balance.replace_movement(sum_by_account(&movements)[&account]);
    let after_first = balance.clone();

    // No intervening postings: a second recompute yields identical rows.
    balance.replace_movement(sum_by_account(&movements)[&account]);
    assert_eq!(balance, after_first);
}

#[test]
fn recompute_replaces_rather_than_accumulates() {
    let account = AccountId::new();
    let mut balance =
        AccountPeriodBalance::opening_zero(account, BranchId::new(), PeriodId::new());

    balance.replace_movement(MovementTotals {
        debit: Amount::from_cents(50_000),
        credit: Amount::ZERO,
    });
    // The period's lines changed; the fresh totals fully replace the old.
    balance.replace_movement(MovementTotals {
        debit: Amount::from_cents(20_000),
        credit: Amount::from_cents(5_000),
    });

    assert_eq!(balance.debit, Amount::from_cents(20_000));
    assert_eq!(balance.credit, Amount::from_cents(5_000));
    assert_eq!(balance.closing, Amount::from_cents(15_000));
}

#[test]
fn groups_are_split_per_account() {
    let first = AccountId::new();
    let second = AccountId::new();
    let movements = vec![
        movement(first, Side::Debit, 1_000),
        movement(second, Side::Credit, 1_000),
        movement(first, Side::Debit, 500),
    ];

    let groups = sum_by_account(&movements);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[&first].debit, Amount::from_cents(1_500));
    assert_eq!(groups[&first].credit, Amount::ZERO);
    assert_eq!(groups[&second].credit, Amount::from_cents(1_000));
}

#[test]
fn project_groups_key_on_account_and_project() {
    let account = AccountId::new();
    let alpha = ProjectId::new();
    let beta = ProjectId::new();
    let movements = vec![
        ProjectMovement {
            account_id: account,
            project_id: alpha,
            side: Side::Debit,
            amount: Amount::from_cents(3_000),
        },
        ProjectMovement {
            account_id: account,
            project_id: beta,
            side: Side::Debit,
            amount: Amount::from_cents(7_000),
        },
    ];

    let groups = sum_by_project(&movements);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[&(account, alpha)].debit, Amount::from_cents(3_000));
    assert_eq!(groups[&(account, beta)].debit, Amount::from_cents(7_000));
}

#[test]
fn opening_balance_feeds_closing() {
    let account = AccountId::new();
    let mut balance =
        AccountPeriodBalance::opening_zero(account, BranchId::new(), PeriodId::new());
    balance.opening = Amount::from_cents(10_000);
    balance.replace_movement(MovementTotals {
        debit: Amount::from_cents(2_500),
        credit: Amount::from_cents(7_500),
    });

    assert_eq!(balance.closing, Amount::from_cents(5_000));
}
