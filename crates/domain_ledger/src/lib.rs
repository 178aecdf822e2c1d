//! Ledger domain - journal entries, allocations and period balances
//!
//! The posting flow: an [`Entry`] owns debit/credit [`Line`]s, each line owns
//! cost-center and project allocation splits. [`validator::validate_entry`]
//! is the deliberate gate before an entry is treated as posted; the
//! [`balance`] module later rolls posted movements up into per-period
//! snapshots.

pub mod allocation;
pub mod balance;
pub mod entry;
pub mod error;
pub mod reference;
pub mod validator;

pub use allocation::{
    validate_allocations, AllocationKind, CostCenterAllocation, ProjectAllocation,
};
pub use balance::{
    sum_by_account, sum_by_cost_center, sum_by_project, AccountMovement, AccountPeriodBalance,
    CostCenterMovement, CostCenterPeriodBalance, MovementTotals, ProjectMovement,
    ProjectPeriodBalance,
};
pub use entry::{Entry, EntryOrigin, EntryType, Line, Side};
pub use error::{AllocationError, EntryError};
pub use reference::{
    Branch, Currency, HistoryCode, HistoryKind, Period, PeriodStatus, Project,
};
pub use validator::{validate_entry, LineDetail};
