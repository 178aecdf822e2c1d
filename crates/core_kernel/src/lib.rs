//! Core Kernel - Foundational types for the ledger system
//!
//! This crate provides the building blocks used across all domain modules:
//! - Fixed-point amounts with exact two-decimal arithmetic
//! - Strongly-typed identifiers
//! - Date ranges for accounting periods

pub mod amount;
pub mod error;
pub mod identifiers;
pub mod temporal;

pub use amount::Amount;
pub use error::CoreError;
pub use identifiers::{
    AccountId, AllocationId, BalanceId, BranchId, CostCenterId, CurrencyId, EntryId,
    HistoryCodeId, LegalEntityId, LineId, PeriodId, ProjectId, UserId,
};
pub use temporal::{DateRange, TemporalError};
