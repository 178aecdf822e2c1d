//! Chart domain - hierarchical reference trees consulted by the ledger
//!
//! Two trees live here:
//! - the chart of accounts, with strictly-typed five-level codes, kind/level
//!   coupling and classification rules;
//! - the cost center hierarchy, with cycle detection and derived depth.
//!
//! Both are read-only from the ledger flow's perspective; validation runs
//! when reference data is maintained and when entries are checked.

pub mod account;
pub mod cost_center;
pub mod error;

pub use account::{
    derive_level, validate, Account, AccountKind, AccountNature, Classification, CodeShape,
    CODE_SHAPES, LEAF_LEVEL,
};
pub use cost_center::{CostCenter, CostCenterKind, CostCenterTree};
pub use error::{AccountError, CostCenterError};
