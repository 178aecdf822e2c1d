//! Period balance aggregation
//!
//! Pure grouping of posted movements into per-period balance snapshots.
//! Snapshots are derived caches, rebuilt as a full replace: each recompute
//! sets debit/credit to freshly computed totals and recomputes
//! `closing = opening + debit - credit`. Opening balances are externally
//! supplied (zero on first insert); carry-forward from the prior period is
//! deliberately not performed here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entry::Side;
use core_kernel::{AccountId, Amount, BalanceId, BranchId, CostCenterId, PeriodId, ProjectId};

/// A posted line movement scoped to one branch/period scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountMovement {
    pub account_id: AccountId,
    pub side: Side,
    pub amount: Amount,
}

/// A cost-center allocation movement joined with its line's account/side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostCenterMovement {
    pub account_id: AccountId,
    pub cost_center_id: CostCenterId,
    pub side: Side,
    pub amount: Amount,
}

/// A project allocation movement joined with its line's account/side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMovement {
    pub account_id: AccountId,
    pub project_id: ProjectId,
    pub side: Side,
    pub amount: Amount,
}

/// Debit/credit totals of one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementTotals {
    pub debit: Amount,
    pub credit: Amount,
}

impl MovementTotals {
    fn absorb(&mut self, side: Side, amount: Amount) {
        match side {
            Side::Debit => self.debit += amount,
            Side::Credit => self.credit += amount,
        }
    }
}

/// Groups movements by account, summing debit and credit separately.
pub fn sum_by_account(movements: &[AccountMovement]) -> BTreeMap<AccountId, MovementTotals> {
    let mut groups: BTreeMap<AccountId, MovementTotals> = BTreeMap::new();
    for movement in movements {
        groups
            .entry(movement.account_id)
            .or_default()
            .absorb(movement.side, movement.amount);
    }
    groups
}

/// Groups allocation movements by (account, cost center).
pub fn sum_by_cost_center(
    movements: &[CostCenterMovement],
) -> BTreeMap<(AccountId, CostCenterId), MovementTotals> {
    let mut groups: BTreeMap<(AccountId, CostCenterId), MovementTotals> = BTreeMap::new();
    for movement in movements {
        groups
            .entry((movement.account_id, movement.cost_center_id))
            .or_default()
            .absorb(movement.side, movement.amount);
    }
    groups
}

/// Groups allocation movements by (account, project).
pub fn sum_by_project(
    movements: &[ProjectMovement],
) -> BTreeMap<(AccountId, ProjectId), MovementTotals> {
    let mut groups: BTreeMap<(AccountId, ProjectId), MovementTotals> = BTreeMap::new();
    for movement in movements {
        groups
            .entry((movement.account_id, movement.project_id))
            .or_default()
            .absorb(movement.side, movement.amount);
    }
    groups
}

/// Aggregated balance of one account for one branch and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPeriodBalance {
    pub id: BalanceId,
    pub account_id: AccountId,
    pub branch_id: BranchId,
    pub period_id: PeriodId,
    pub opening: Amount,
    pub debit: Amount,
    pub credit: Amount,
    pub closing: Amount,
}

impl AccountPeriodBalance {
    /// A fresh snapshot row with zero opening balance.
    pub fn opening_zero(account_id: AccountId, branch_id: BranchId, period_id: PeriodId) -> Self {
        Self {
            id: BalanceId::new_v7(),
            account_id,
            branch_id,
            period_id,
            opening: Amount::ZERO,
            debit: Amount::ZERO,
            credit: Amount::ZERO,
            closing: Amount::ZERO,
        }
    }

    /// Full-replace of the movement totals; opening is preserved.
    pub fn replace_movement(&mut self, totals: MovementTotals) {
        self.debit = totals.debit;
        self.credit = totals.credit;
        self.closing = self.opening + self.debit - self.credit;
    }
}

/// Per-cost-center breakdown hanging off an account balance row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCenterPeriodBalance {
    pub id: BalanceId,
    pub account_balance_id: BalanceId,
    pub cost_center_id: CostCenterId,
    pub period_id: PeriodId,
    pub opening: Amount,
    pub debit: Amount,
    pub credit: Amount,
    pub closing: Amount,
}

impl CostCenterPeriodBalance {
    pub fn opening_zero(
        account_balance_id: BalanceId,
        cost_center_id: CostCenterId,
        period_id: PeriodId,
    ) -> Self {
        Self {
            id: BalanceId::new_v7(),
            account_balance_id,
            cost_center_id,
            period_id,
            opening: Amount::ZERO,
            debit: Amount::ZERO,
            credit: Amount::ZERO,
            closing: Amount::ZERO,
        }
    }

    pub fn replace_movement(&mut self, totals: MovementTotals) {
        self.debit = totals.debit;
        self.credit = totals.credit;
        self.closing = self.opening + self.debit - self.credit;
    }
}

/// Per-project breakdown hanging off an account balance row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPeriodBalance {
    pub id: BalanceId,
    pub account_balance_id: BalanceId,
    pub project_id: ProjectId,
    pub period_id: PeriodId,
    pub opening: Amount,
    pub debit: Amount,
    pub credit: Amount,
    pub closing: Amount,
}

impl ProjectPeriodBalance {
    pub fn opening_zero(
        account_balance_id: BalanceId,
        project_id: ProjectId,
        period_id: PeriodId,
    ) -> Self {
        Self {
            id: BalanceId::new_v7(),
            account_balance_id,
            project_id,
            period_id,
            opening: Amount::ZERO,
            debit: Amount::ZERO,
            credit: Amount::ZERO,
            closing: Amount::ZERO,
        }
    }

    pub fn replace_movement(&mut self, totals: MovementTotals) {
        self.debit = totals.debit;
        self.credit = totals.credit;
        self.closing = self.opening + self.debit - self.credit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_absorb_by_side() {
        let account_id = AccountId::new();
        let movements = vec![
            AccountMovement {
                account_id,
                side: Side::Debit,
                amount: Amount::from_cents(7_000),
            },
            AccountMovement {
                account_id,
                side: Side::Debit,
                amount: Amount::from_cents(3_000),
            },
            AccountMovement {
                account_id,
                side: Side::Credit,
                amount: Amount::from_cents(4_000),
            },
        ];

        let groups = sum_by_account(&movements);
        let totals = groups[&account_id];
        assert_eq!(totals.debit, Amount::from_cents(10_000));
        assert_eq!(totals.credit, Amount::from_cents(4_000));
    }

    #[test]
    fn replace_movement_recomputes_closing_from_opening() {
        let mut balance = AccountPeriodBalance::opening_zero(
            AccountId::new(),
            BranchId::new(),
            PeriodId::new(),
        );
        balance.opening = Amount::from_cents(5_000);
        balance.replace_movement(MovementTotals {
            debit: Amount::from_cents(10_000),
            credit: Amount::from_cents(2_500),
        });
        assert_eq!(balance.closing, Amount::from_cents(12_500));

        // A second replace with the same totals leaves the row unchanged.
        let snapshot = balance.clone();
        balance.replace_movement(MovementTotals {
            debit: Amount::from_cents(10_000),
            credit: Amount::from_cents(2_500),
        });
        assert_eq!(balance, snapshot);
    }
}
