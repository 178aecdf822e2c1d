//! Allocation engine
//!
//! A line's amount may be split across cost centers and projects. Each
//! non-empty split must reconcile exactly to the line amount at two
//! decimals, and lines on Revenue/Expense/Cost accounts must carry a
//! cost-center split. Comparison is exact base-10 fixed-point with zero
//! tolerance.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entry::Line;
use crate::error::AllocationError;
use core_kernel::{AllocationId, Amount, CostCenterId, LineId, ProjectId};
use domain_chart::Classification;

/// Which allocation collection a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationKind {
    CostCenter,
    Project,
}

/// A sub-split of a line's amount against one cost center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostCenterAllocation {
    pub id: AllocationId,
    pub line_id: LineId,
    pub cost_center_id: CostCenterId,
    pub amount: Amount,
}

/// A sub-split of a line's amount against one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAllocation {
    pub id: AllocationId,
    pub line_id: LineId,
    pub project_id: ProjectId,
    pub amount: Amount,
}

/// Validates the allocation sets attached to one line.
///
/// Rules:
/// - cost-center allocations are mandatory when the account classification
///   is Revenue, Expense or Cost;
/// - a non-empty set must sum exactly to the line amount (projects are
///   optional, an empty project set always passes);
/// - amounts are non-negative and targets unique per kind.
pub fn validate_allocations(
    line: &Line,
    classification: Classification,
    cost_centers: &[CostCenterAllocation],
    projects: &[ProjectAllocation],
) -> Result<(), AllocationError> {
    if classification.requires_cost_center() && cost_centers.is_empty() {
        return Err(AllocationError::MissingMandatory { classification });
    }

    check_set(
        AllocationKind::CostCenter,
        line.amount,
        cost_centers.iter().map(|a| (a.cost_center_id, a.amount)),
    )?;
    check_set(
        AllocationKind::Project,
        line.amount,
        projects.iter().map(|a| (a.project_id, a.amount)),
    )?;

    Ok(())
}

fn check_set<T: std::hash::Hash + Eq>(
    kind: AllocationKind,
    line_amount: Amount,
    allocations: impl Iterator<Item = (T, Amount)>,
) -> Result<(), AllocationError> {
    let mut seen = HashSet::new();
    let mut total = Amount::ZERO;
    let mut empty = true;

    for (target, amount) in allocations {
        empty = false;
        if !seen.insert(target) {
            return Err(AllocationError::DuplicateTarget { kind });
        }
        if amount.is_negative() {
            return Err(AllocationError::NegativeAmount { kind, amount });
        }
        total += amount;
    }

    if !empty && total != line_amount {
        return Err(AllocationError::SumMismatch {
            kind,
            expected: line_amount,
            actual: total,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Side;
    use core_kernel::{AccountId, BranchId, CurrencyId, EntryId, HistoryCodeId};

    fn line(amount: Amount) -> Line {
        Line {
            id: LineId::new(),
            entry_id: EntryId::new(),
            account_id: AccountId::new(),
            branch_id: BranchId::new(),
            currency_id: CurrencyId::new(),
            history_code_id: HistoryCodeId::new(),
            external_code: String::new(),
            amount,
            side: Side::Debit,
            active: true,
        }
    }

    fn cc(line_id: LineId, cents: i64) -> CostCenterAllocation {
        CostCenterAllocation {
            id: AllocationId::new(),
            line_id,
            cost_center_id: CostCenterId::new(),
            amount: Amount::from_cents(cents),
        }
    }

    #[test]
    fn asset_line_without_allocations_passes() {
        let line = line(Amount::from_cents(10_000));
        assert_eq!(
            validate_allocations(&line, Classification::Asset, &[], &[]),
            Ok(())
        );
    }

    #[test]
    fn revenue_line_without_cost_centers_fails() {
        let line = line(Amount::from_cents(10_000));
        assert_eq!(
            validate_allocations(&line, Classification::Revenue, &[], &[]),
            Err(AllocationError::MissingMandatory {
                classification: Classification::Revenue
            })
        );
    }

    #[test]
    fn exact_split_reconciles() {
        let line = line(Amount::from_cents(10_000));
        let allocations = [cc(line.id, 2_500), cc(line.id, 7_500)];
        assert_eq!(
            validate_allocations(&line, Classification::Expense, &allocations, &[]),
            Ok(())
        );
    }

    #[test]
    fn one_cent_off_fails() {
        let line = line(Amount::from_cents(10_000));
        let allocations = [cc(line.id, 2_500), cc(line.id, 7_499)];
        assert_eq!(
            validate_allocations(&line, Classification::Expense, &allocations, &[]),
            Err(AllocationError::SumMismatch {
                kind: AllocationKind::CostCenter,
                expected: Amount::from_cents(10_000),
                actual: Amount::from_cents(9_999),
            })
        );
    }

    #[test]
    fn duplicate_cost_center_target_fails() {
        let line = line(Amount::from_cents(100));
        let target = CostCenterId::new();
        let mut first = cc(line.id, 50);
        let mut second = cc(line.id, 50);
        first.cost_center_id = target;
        second.cost_center_id = target;
        assert_eq!(
            validate_allocations(&line, Classification::Cost, &[first, second], &[]),
            Err(AllocationError::DuplicateTarget {
                kind: AllocationKind::CostCenter
            })
        );
    }

    #[test]
    fn negative_allocation_amount_fails() {
        let line = line(Amount::from_cents(100));
        let allocations = [cc(line.id, 200), cc(line.id, -100)];
        assert_eq!(
            validate_allocations(&line, Classification::Cost, &allocations, &[]),
            Err(AllocationError::NegativeAmount {
                kind: AllocationKind::CostCenter,
                amount: Amount::from_cents(-100),
            })
        );
    }
}
