//! Chart-of-accounts nodes and code-shape validation
//!
//! Account codes encode the tree position: `1`, `1.01`, `1.01.02`,
//! `1.01.02.003`, `1.01.02.003.0001`. Each level has a fixed segment shape,
//! kept as an explicit table so the depth rules stay first-class data rather
//! than open-ended recursion.

use serde::{Deserialize, Serialize};

use crate::error::AccountError;
use core_kernel::AccountId;

/// Leaf (postable) vs. aggregating (non-postable) node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    /// Postable leaf account, level 5 only
    Analytic,
    /// Aggregating account, levels 1-4 only
    Synthetic,
}

/// Normal balance side of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountNature {
    Debit,
    Credit,
}

/// Functional category of an account.
///
/// Drives cost-center allocation mandatoriness: lines on Revenue, Expense
/// and Cost accounts must carry cost-center allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
    Cost,
    Other,
}

impl Classification {
    /// Derives the default classification from the first code character.
    pub fn from_code(code: &str) -> Classification {
        match code.as_bytes().first() {
            Some(b'1') => Classification::Asset,
            Some(b'2') => Classification::Liability,
            Some(b'3') => Classification::Equity,
            Some(b'4') => Classification::Revenue,
            Some(b'5') => Classification::Expense,
            Some(b'6') | Some(b'7') | Some(b'8') => Classification::Cost,
            _ => Classification::Other,
        }
    }

    /// Returns true if lines on accounts of this classification require
    /// cost-center allocations.
    pub fn requires_cost_center(&self) -> bool {
        matches!(
            self,
            Classification::Revenue | Classification::Expense | Classification::Cost
        )
    }
}

/// Shape of a code at one tree depth: the widths of its dot-separated
/// digit segments.
#[derive(Debug, Clone, Copy)]
pub struct CodeShape {
    pub level: u8,
    pub segment_widths: &'static [usize],
}

impl CodeShape {
    /// Returns true if `code` consists of all-digit segments with exactly
    /// these widths.
    pub fn matches(&self, code: &str) -> bool {
        let mut segments = code.split('.');
        let mut widths = self.segment_widths.iter();
        loop {
            match (segments.next(), widths.next()) {
                (Some(seg), Some(&width)) => {
                    if seg.len() != width || !seg.bytes().all(|b| b.is_ascii_digit()) {
                        return false;
                    }
                }
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

/// The five fixed level shapes: 1 / 1.01 / 1.01.02 / 1.01.02.003 /
/// 1.01.02.003.0001.
pub const CODE_SHAPES: [CodeShape; 5] = [
    CodeShape {
        level: 1,
        segment_widths: &[1],
    },
    CodeShape {
        level: 2,
        segment_widths: &[1, 2],
    },
    CodeShape {
        level: 3,
        segment_widths: &[1, 2, 2],
    },
    CodeShape {
        level: 4,
        segment_widths: &[1, 2, 2, 3],
    },
    CodeShape {
        level: 5,
        segment_widths: &[1, 2, 2, 3, 4],
    },
];

/// Only analytic leaves exist at the deepest level.
pub const LEAF_LEVEL: u8 = 5;

/// A chart-of-accounts node.
///
/// `level` is derived from the code shape by [`validate`], never
/// user-supplied. `classification` is the explicit category if one was set;
/// [`Account::effective_classification`] falls back to the code-derived one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub code: String,
    pub description: String,
    pub kind: AccountKind,
    pub nature: AccountNature,
    pub display_order: i32,
    pub level: u8,
    pub parent_id: Option<AccountId>,
    pub classification: Option<Classification>,
}

impl Account {
    /// Returns the explicit classification, or the one derived from the
    /// code's first character. An explicit value is never overridden.
    pub fn effective_classification(&self) -> Classification {
        self.classification
            .unwrap_or_else(|| Classification::from_code(&self.code))
    }
}

/// Derives the tree level of `code` against the shape table.
///
/// Exactly one shape must match; zero or multiple matches fail with
/// [`AccountError::InvalidCode`].
pub fn derive_level(code: &str) -> Result<u8, AccountError> {
    derive_level_with(&CODE_SHAPES, code)
}

/// Level derivation against a caller-supplied shape table.
pub fn derive_level_with(shapes: &[CodeShape], code: &str) -> Result<u8, AccountError> {
    let mut matched = shapes.iter().filter(|shape| shape.matches(code));
    match (matched.next(), matched.next()) {
        (Some(shape), None) => Ok(shape.level),
        _ => Err(AccountError::InvalidCode(code.to_string())),
    }
}

/// Validates an account against its (optional) parent and returns the
/// derived level.
///
/// Checks, in order: code shape, parent level/prefix/kind compatibility,
/// kind/level coupling, and the reserved terminal segment for analytic
/// leaves. Does not mutate the node; callers store the returned level.
pub fn validate(account: &Account, parent: Option<&Account>) -> Result<u8, AccountError> {
    let level = derive_level(&account.code)?;

    if let Some(parent) = parent {
        if parent.level + 1 != level {
            return Err(AccountError::LevelMismatch {
                parent_level: parent.level,
                found: level,
            });
        }
        if !account.code.starts_with(&format!("{}.", parent.code)) {
            return Err(AccountError::CodePrefixMismatch {
                code: account.code.clone(),
                parent_code: parent.code.clone(),
            });
        }
        if parent.kind != AccountKind::Synthetic {
            return Err(AccountError::ParentMustBeSynthetic(parent.code.clone()));
        }
    }

    match account.kind {
        AccountKind::Synthetic if level == LEAF_LEVEL => {
            return Err(AccountError::KindLevelMismatch {
                kind: account.kind,
                level,
            });
        }
        AccountKind::Analytic if level != LEAF_LEVEL => {
            return Err(AccountError::KindLevelMismatch {
                kind: account.kind,
                level,
            });
        }
        _ => {}
    }

    if account.kind == AccountKind::Analytic {
        // The all-zero terminal segment is reserved for "unassigned".
        let last = account.code.rsplit('.').next().unwrap_or(&account.code);
        if last.bytes().all(|b| b == b'0') {
            return Err(AccountError::ReservedTerminalSegment(account.code.clone()));
        }
    }

    Ok(level)
}
