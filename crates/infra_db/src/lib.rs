//! Database infrastructure for the ledger
//!
//! PostgreSQL-backed persistence: connection pooling, the chart and ledger
//! repositories, and the period balance recomputation. Queries are issued at
//! runtime so the crate builds without a live database; the schema lives in
//! the workspace `migrations/` directory.

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use repositories::{
    AggregationError, BalanceRepository, ChartRepository, ChartStoreError, LedgerError,
    LedgerRepository, NewEntry, NewLine,
};
