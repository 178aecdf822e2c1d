//! Chart domain errors

use thiserror::Error;

use crate::account::AccountKind;
use core_kernel::CostCenterId;

/// Errors raised while validating a chart-of-accounts node
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    /// Code does not match exactly one of the level shapes
    #[error("Invalid account code for any level: {0}")]
    InvalidCode(String),

    /// Node level is not parent level + 1
    #[error("Account level {found} is incompatible with parent level {parent_level}")]
    LevelMismatch { parent_level: u8, found: u8 },

    /// Code is not prefixed by the parent code
    #[error("Account code {code} must start with parent code {parent_code}.")]
    CodePrefixMismatch { code: String, parent_code: String },

    /// Parent must be a synthetic (aggregating) account
    #[error("Parent account {0} must be synthetic")]
    ParentMustBeSynthetic(String),

    /// Synthetic accounts are only allowed at levels 1-4, analytic only at 5
    #[error("{kind:?} account is not allowed at level {level}")]
    KindLevelMismatch { kind: AccountKind, level: u8 },

    /// Analytic codes may not end with the all-zero sentinel segment
    #[error("Analytic account code {0} may not end with the reserved all-zero segment")]
    ReservedTerminalSegment(String),
}

/// Errors raised while validating a cost center node
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CostCenterError {
    /// A node may not be its own ancestor
    #[error("Cost center {0} would become its own ancestor")]
    CycleDetected(CostCenterId),

    /// Parent reference does not resolve to a known node
    #[error("Cost center parent {0} not found")]
    UnknownParent(CostCenterId),
}
