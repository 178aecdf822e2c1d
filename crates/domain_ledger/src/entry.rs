//! Journal entries and their lines
//!
//! An entry owns an ordered set of debit/credit lines. Whether the entry is
//! balanced is a derived predicate recomputed on demand by the validator,
//! never a stored status: lines may be added incrementally to a
//! not-yet-balanced entry, and every consumer that treats an entry as final
//! must re-run validation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{
    AccountId, Amount, BranchId, CurrencyId, EntryId, HistoryCodeId, LineId, UserId,
};

/// Debit/credit flag of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Debit,
    Credit,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Debit => Side::Credit,
            Side::Credit => Side::Debit,
        }
    }
}

/// Nature of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    Normal,
    Corporate,
    Fiscal,
    Budgetary,
    Closing,
    Adjustment,
}

/// Where the entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryOrigin {
    Manual,
    Integrated,
    Imported,
    Generated,
}

/// A journal entry header.
///
/// Owns its lines exclusively (deleting an entry cascades to them). The
/// `accrual_date` decides which accounting period the movement belongs to;
/// the `posting_date` records when it was booked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub posting_date: NaiveDate,
    pub accrual_date: NaiveDate,
    pub entry_type: EntryType,
    pub origin: EntryOrigin,
    pub document_number: String,
    pub description: String,
    /// Correlation key for integrated/imported postings.
    pub external_code: String,
    pub branch_id: BranchId,
    pub user_id: UserId,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// One debit or credit movement within an entry, against one account.
///
/// The amount is a non-negative magnitude; the direction lives in `side`.
/// Account, branch, currency and history code are protected references:
/// those rows cannot be deleted while a line points at them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,
    pub entry_id: EntryId,
    pub account_id: AccountId,
    pub branch_id: BranchId,
    pub currency_id: CurrencyId,
    pub history_code_id: HistoryCodeId,
    pub external_code: String,
    pub amount: Amount,
    pub side: Side,
    pub active: bool,
}
