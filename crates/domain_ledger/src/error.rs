//! Ledger domain errors
//!
//! Every variant reflects a data or business-rule problem; none is
//! transient or retryable. Structured fields carry enough detail (expected
//! vs. actual totals, offending line id) for callers to render a precise
//! message.

use thiserror::Error;

use crate::allocation::AllocationKind;
use core_kernel::{Amount, LineId};
use domain_chart::Classification;

/// Errors raised while validating a single line's allocations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    /// Revenue/Expense/Cost lines must carry cost-center allocations
    #[error("Cost-center allocation is mandatory for {classification:?}-classified accounts")]
    MissingMandatory { classification: Classification },

    /// A non-empty allocation set must reconcile exactly to the line amount
    #[error("{kind:?} allocations sum to {actual}, expected line amount {expected}")]
    SumMismatch {
        kind: AllocationKind,
        expected: Amount,
        actual: Amount,
    },

    /// At most one allocation row per (line, target) pair
    #[error("Duplicate {kind:?} allocation target on the same line")]
    DuplicateTarget { kind: AllocationKind },

    /// Allocation amounts are non-negative magnitudes
    #[error("{kind:?} allocation amount {amount} is negative")]
    NegativeAmount { kind: AllocationKind, amount: Amount },
}

/// Errors raised while validating a whole entry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    /// Active debit and credit totals differ at two decimals
    #[error("Entry is unbalanced: debit {debit}, credit {credit}")]
    Unbalanced { debit: Amount, credit: Amount },

    /// Line amounts are non-negative magnitudes with a separate side flag
    #[error("Line {line_id} has negative amount {amount}")]
    NegativeLineAmount { line_id: LineId, amount: Amount },

    /// Allocation failure surfaced with the offending line attached
    #[error("Line {line_id}: {source}")]
    Line {
        line_id: LineId,
        #[source]
        source: AllocationError,
    },
}
