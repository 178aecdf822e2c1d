//! Single-character storage codes for domain enums
//!
//! The schema stores enums as short codes. Mapping lives here so every
//! repository encodes and decodes them identically; an unknown stored code
//! is a `SerializationError`, never a silent default.

use crate::error::DatabaseError;
use domain_chart::{AccountKind, AccountNature, Classification};
use domain_ledger::{EntryOrigin, EntryType, PeriodStatus, Side};

pub fn side_code(side: Side) -> &'static str {
    match side {
        Side::Debit => "D",
        Side::Credit => "C",
    }
}

pub fn side_from_code(code: &str) -> Result<Side, DatabaseError> {
    match code {
        "D" => Ok(Side::Debit),
        "C" => Ok(Side::Credit),
        other => Err(DatabaseError::SerializationError(format!(
            "Unknown debit/credit code: {other}"
        ))),
    }
}

pub fn entry_type_code(entry_type: EntryType) -> &'static str {
    match entry_type {
        EntryType::Normal => "0",
        EntryType::Corporate => "1",
        EntryType::Fiscal => "2",
        EntryType::Budgetary => "3",
        EntryType::Closing => "4",
        EntryType::Adjustment => "5",
    }
}

pub fn entry_type_from_code(code: &str) -> Result<EntryType, DatabaseError> {
    match code {
        "0" => Ok(EntryType::Normal),
        "1" => Ok(EntryType::Corporate),
        "2" => Ok(EntryType::Fiscal),
        "3" => Ok(EntryType::Budgetary),
        "4" => Ok(EntryType::Closing),
        "5" => Ok(EntryType::Adjustment),
        other => Err(DatabaseError::SerializationError(format!(
            "Unknown entry type code: {other}"
        ))),
    }
}

pub fn origin_code(origin: EntryOrigin) -> &'static str {
    match origin {
        EntryOrigin::Manual => "0",
        EntryOrigin::Integrated => "1",
        EntryOrigin::Imported => "2",
        EntryOrigin::Generated => "3",
    }
}

pub fn origin_from_code(code: &str) -> Result<EntryOrigin, DatabaseError> {
    match code {
        "0" => Ok(EntryOrigin::Manual),
        "1" => Ok(EntryOrigin::Integrated),
        "2" => Ok(EntryOrigin::Imported),
        "3" => Ok(EntryOrigin::Generated),
        other => Err(DatabaseError::SerializationError(format!(
            "Unknown entry origin code: {other}"
        ))),
    }
}

pub fn period_status_code(status: PeriodStatus) -> &'static str {
    match status {
        PeriodStatus::Open => "A",
        PeriodStatus::Closed => "F",
        PeriodStatus::Locked => "B",
    }
}

pub fn period_status_from_code(code: &str) -> Result<PeriodStatus, DatabaseError> {
    match code {
        "A" => Ok(PeriodStatus::Open),
        "F" => Ok(PeriodStatus::Closed),
        "B" => Ok(PeriodStatus::Locked),
        other => Err(DatabaseError::SerializationError(format!(
            "Unknown period status code: {other}"
        ))),
    }
}

pub fn kind_code(kind: AccountKind) -> &'static str {
    match kind {
        AccountKind::Analytic => "A",
        AccountKind::Synthetic => "S",
    }
}

pub fn kind_from_code(code: &str) -> Result<AccountKind, DatabaseError> {
    match code {
        "A" => Ok(AccountKind::Analytic),
        "S" => Ok(AccountKind::Synthetic),
        other => Err(DatabaseError::SerializationError(format!(
            "Unknown account kind code: {other}"
        ))),
    }
}

pub fn nature_code(nature: AccountNature) -> &'static str {
    match nature {
        AccountNature::Debit => "D",
        AccountNature::Credit => "C",
    }
}

pub fn nature_from_code(code: &str) -> Result<AccountNature, DatabaseError> {
    match code {
        "D" => Ok(AccountNature::Debit),
        "C" => Ok(AccountNature::Credit),
        other => Err(DatabaseError::SerializationError(format!(
            "Unknown account nature code: {other}"
        ))),
    }
}

pub fn classification_code(classification: Classification) -> &'static str {
    match classification {
        Classification::Asset => "A",
        Classification::Liability => "P",
        Classification::Equity => "L",
        Classification::Revenue => "R",
        Classification::Expense => "D",
        Classification::Cost => "C",
        Classification::Other => "O",
    }
}

pub fn classification_from_code(code: &str) -> Result<Classification, DatabaseError> {
    match code {
        "A" => Ok(Classification::Asset),
        "P" => Ok(Classification::Liability),
        "L" => Ok(Classification::Equity),
        "R" => Ok(Classification::Revenue),
        "D" => Ok(Classification::Expense),
        "C" => Ok(Classification::Cost),
        "O" => Ok(Classification::Other),
        other => Err(DatabaseError::SerializationError(format!(
            "Unknown classification code: {other}"
        ))),
    }
}
