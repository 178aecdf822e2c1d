//! Repository implementations for ledger persistence

pub mod balance;
pub mod chart;
pub mod codes;
pub mod ledger;

pub use balance::{AggregationError, BalanceRepository};
pub use chart::{ChartRepository, ChartStoreError};
pub use ledger::{LedgerError, LedgerRepository, NewEntry, NewLine};
