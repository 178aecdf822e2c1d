//! Test Utilities
//!
//! Shared builders and fixtures used by the ledger test suites.

pub mod builders;
pub mod database;
pub mod fixtures;

pub use builders::{account_chain, EntryBuilder, LineDetailBuilder};
pub use database::{
    seed_accounts, seed_reference_rows, AccountRows, ReferenceRows, TestDatabase, TestResult,
};
pub use fixtures::{DateFixtures, PeriodFixtures};
