//! Test data builders
//!
//! Builders with sensible defaults so tests only spell out the fields they
//! care about.

use chrono::{NaiveDate, Utc};

use core_kernel::{
    AccountId, AllocationId, Amount, BranchId, CostCenterId, CurrencyId, EntryId, HistoryCodeId,
    LineId, ProjectId, UserId,
};
use domain_chart::{Account, AccountKind, AccountNature, Classification};
use domain_ledger::{
    CostCenterAllocation, Entry, EntryOrigin, EntryType, Line, LineDetail, ProjectAllocation,
    Side,
};

use crate::fixtures::DateFixtures;

/// Builds the full five-level chart chain `1 / 1.01 / 1.01.02 /
/// 1.01.02.003 / 1.01.02.003.NNNN` ending in an analytic leaf.
///
/// Returns the chain root-first; the last element is the leaf.
pub fn account_chain(leaf_segment: &str, classification: Option<Classification>) -> Vec<Account> {
    let codes = ["1", "1.01", "1.01.02", "1.01.02.003"];
    let mut chain: Vec<Account> = Vec::with_capacity(5);

    for (index, code) in codes.iter().enumerate() {
        let parent_id = chain.last().map(|parent: &Account| parent.id);
        chain.push(Account {
            id: AccountId::new(),
            code: code.to_string(),
            description: format!("Synthetic {code}"),
            kind: AccountKind::Synthetic,
            nature: AccountNature::Debit,
            display_order: index as i32,
            level: index as u8 + 1,
            parent_id,
            classification: None,
        });
    }

    let parent_id = chain.last().map(|parent| parent.id);
    chain.push(Account {
        id: AccountId::new(),
        code: format!("1.01.02.003.{leaf_segment}"),
        description: format!("Analytic leaf {leaf_segment}"),
        kind: AccountKind::Analytic,
        nature: AccountNature::Debit,
        display_order: 4,
        level: 5,
        parent_id,
        classification,
    });

    chain
}

/// Builder for journal entry headers
pub struct EntryBuilder {
    id: EntryId,
    posting_date: NaiveDate,
    accrual_date: NaiveDate,
    entry_type: EntryType,
    origin: EntryOrigin,
    branch_id: BranchId,
    active: bool,
}

impl Default for EntryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryBuilder {
    pub fn new() -> Self {
        Self {
            id: EntryId::new(),
            posting_date: DateFixtures::january_5th(),
            accrual_date: DateFixtures::january_5th(),
            entry_type: EntryType::Normal,
            origin: EntryOrigin::Manual,
            branch_id: BranchId::new(),
            active: true,
        }
    }

    pub fn with_branch(mut self, branch_id: BranchId) -> Self {
        self.branch_id = branch_id;
        self
    }

    pub fn with_accrual_date(mut self, date: NaiveDate) -> Self {
        self.accrual_date = date;
        self
    }

    pub fn with_origin(mut self, origin: EntryOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn build(self) -> Entry {
        Entry {
            id: self.id,
            posting_date: self.posting_date,
            accrual_date: self.accrual_date,
            entry_type: self.entry_type,
            origin: self.origin,
            document_number: "DOC-1".to_string(),
            description: "Test entry".to_string(),
            external_code: String::new(),
            branch_id: self.branch_id,
            user_id: UserId::new(),
            active: self.active,
            created_at: Utc::now(),
        }
    }
}

/// Builder for a line together with its classification and allocations
pub struct LineDetailBuilder {
    entry_id: EntryId,
    account_id: AccountId,
    classification: Classification,
    amount: Amount,
    side: Side,
    active: bool,
    cost_centers: Vec<(CostCenterId, Amount)>,
    projects: Vec<(ProjectId, Amount)>,
}

impl LineDetailBuilder {
    pub fn new(entry_id: EntryId, side: Side, cents: i64) -> Self {
        Self {
            entry_id,
            account_id: AccountId::new(),
            classification: Classification::Asset,
            amount: Amount::from_cents(cents),
            side,
            active: true,
            cost_centers: Vec::new(),
            projects: Vec::new(),
        }
    }

    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_id = account_id;
        self
    }

    pub fn classified(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Adds a cost-center allocation of `cents` against `target`.
    pub fn allocate_cost_center(mut self, target: CostCenterId, cents: i64) -> Self {
        self.cost_centers.push((target, Amount::from_cents(cents)));
        self
    }

    /// Adds a project allocation of `cents` against `target`.
    pub fn allocate_project(mut self, target: ProjectId, cents: i64) -> Self {
        self.projects.push((target, Amount::from_cents(cents)));
        self
    }

    pub fn build(self) -> LineDetail {
        let line_id = LineId::new();
        LineDetail {
            line: Line {
                id: line_id,
                entry_id: self.entry_id,
                account_id: self.account_id,
                branch_id: BranchId::new(),
                currency_id: CurrencyId::new(),
                history_code_id: HistoryCodeId::new(),
                external_code: String::new(),
                amount: self.amount,
                side: self.side,
                active: self.active,
            },
            classification: self.classification,
            cost_centers: self
                .cost_centers
                .into_iter()
                .map(|(cost_center_id, amount)| CostCenterAllocation {
                    id: AllocationId::new(),
                    line_id,
                    cost_center_id,
                    amount,
                })
                .collect(),
            projects: self
                .projects
                .into_iter()
                .map(|(project_id, amount)| ProjectAllocation {
                    id: AllocationId::new(),
                    line_id,
                    project_id,
                    amount,
                })
                .collect(),
        }
    }
}
