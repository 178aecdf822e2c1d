//! Reference entities consumed by the ledger flow
//!
//! These rows are maintained elsewhere; the ledger core reads them during
//! validation and aggregation. Only the validation that constrains entry
//! validity lives here (period posting locks, date-range sanity).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{
    BranchId, CurrencyId, DateRange, HistoryCodeId, LegalEntityId, PeriodId, ProjectId,
    TemporalError,
};

/// A branch of a legal entity. The (legal entity, code) pair is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub legal_entity_id: LegalEntityId,
    pub code: String,
    pub description: String,
    pub active: bool,
}

/// Lifecycle status of an accounting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodStatus {
    Open,
    Closed,
    Locked,
}

/// A dated accounting window. The (legal entity, code) pair is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    pub code: String,
    pub range: DateRange,
    pub legal_entity_id: Option<LegalEntityId>,
    pub status: PeriodStatus,
    /// Blocks new postings independently of the status.
    pub posting_locked: bool,
    pub note: String,
    pub active: bool,
}

impl Period {
    /// Builds a period, enforcing `end >= start`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: PeriodId,
        code: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        legal_entity_id: Option<LegalEntityId>,
        status: PeriodStatus,
        posting_locked: bool,
    ) -> Result<Self, TemporalError> {
        Ok(Self {
            id,
            code: code.into(),
            range: DateRange::new(start, end)?,
            legal_entity_id,
            status,
            posting_locked,
            note: String::new(),
            active: true,
        })
    }

    /// Returns true if `date` falls within the period, bounds included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.range.contains(date)
    }

    /// Returns true if new postings may target this period.
    pub fn accepts_postings(&self) -> bool {
        self.status == PeriodStatus::Open && !self.posting_locked
    }
}

/// A currency row referenced by lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    pub id: CurrencyId,
    pub code: String,
    pub description: String,
    pub symbol: String,
    pub active: bool,
}

/// Kind of standard history text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryKind {
    Standard,
    Recurring,
    Provision,
}

/// A standard-history code referenced by lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryCode {
    pub id: HistoryCodeId,
    pub code: String,
    pub description: String,
    pub kind: HistoryKind,
    pub active: bool,
}

/// A project, target of optional line allocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub code: String,
    pub description: String,
    pub range: DateRange,
    pub active: bool,
}

impl Project {
    pub fn new(
        id: ProjectId,
        code: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, TemporalError> {
        Ok(Self {
            id,
            code: code.into(),
            description: String::new(),
            range: DateRange::new(start, end)?,
            active: true,
        })
    }
}
