//! Entry validator
//!
//! Checks that an entry's active lines balance debit against credit at two
//! decimals, then runs the allocation engine per line. Validation is a
//! deliberate call: it is not triggered on every line insertion, so callers
//! may build entries incrementally and must validate before treating one as
//! posted.

use crate::allocation::{validate_allocations, CostCenterAllocation, ProjectAllocation};
use crate::entry::{Entry, Line, Side};
use crate::error::EntryError;
use core_kernel::Amount;
use domain_chart::Classification;

/// A line joined with the reference data the validator needs: the account's
/// classification and the allocation rows owned by the line.
#[derive(Debug, Clone)]
pub struct LineDetail {
    pub line: Line,
    pub classification: Classification,
    pub cost_centers: Vec<CostCenterAllocation>,
    pub projects: Vec<ProjectAllocation>,
}

/// Validates a whole entry.
///
/// Inactive (soft-deleted) lines are excluded from both the balance sum and
/// the allocation checks. The debit/credit comparison runs first; the first
/// per-line failure after that short-circuits with the line id attached.
pub fn validate_entry(_entry: &Entry, lines: &[LineDetail]) -> Result<(), EntryError> {
    let active = || lines.iter().filter(|detail| detail.line.active);

    let mut total_debit = Amount::ZERO;
    let mut total_credit = Amount::ZERO;
    for detail in active() {
        let line = &detail.line;
        if line.amount.is_negative() {
            return Err(EntryError::NegativeLineAmount {
                line_id: line.id,
                amount: line.amount,
            });
        }
        match line.side {
            Side::Debit => total_debit += line.amount,
            Side::Credit => total_credit += line.amount,
        }
    }

    if total_debit != total_credit {
        return Err(EntryError::Unbalanced {
            debit: total_debit,
            credit: total_credit,
        });
    }

    for detail in active() {
        validate_allocations(
            &detail.line,
            detail.classification,
            &detail.cost_centers,
            &detail.projects,
        )
        .map_err(|source| EntryError::Line {
            line_id: detail.line.id,
            source,
        })?;
    }

    Ok(())
}
