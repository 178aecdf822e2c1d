//! Cost center hierarchy
//!
//! Cost centers form a free-depth parent/child tree. Validation walks the
//! parent chain to reject cycles and derives the node level from its parent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CostCenterError;
use core_kernel::CostCenterId;

/// Functional grouping of a cost center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostCenterKind {
    Operational,
    Administrative,
    Commercial,
    Other,
}

/// A cost center node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostCenter {
    pub id: CostCenterId,
    pub code: String,
    pub description: String,
    pub kind: CostCenterKind,
    pub parent_id: Option<CostCenterId>,
    pub level: u8,
    pub active: bool,
}

/// In-memory view of the cost center tree, keyed by id.
///
/// Validation needs to resolve ancestor chains; callers load the relevant
/// nodes (typically the full tree, it is small reference data) and validate
/// changed or new nodes against it.
#[derive(Debug, Default)]
pub struct CostCenterTree {
    nodes: HashMap<CostCenterId, CostCenter>,
}

impl CostCenterTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree view from existing nodes.
    pub fn from_nodes(nodes: impl IntoIterator<Item = CostCenter>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
        }
    }

    pub fn get(&self, id: CostCenterId) -> Option<&CostCenter> {
        self.nodes.get(&id)
    }

    /// Adds or replaces a node without validation.
    pub fn upsert(&mut self, node: CostCenter) {
        self.nodes.insert(node.id, node);
    }

    /// Validates `node` against the tree and returns its derived level.
    ///
    /// Detects self-parenting and any-length ancestor cycles by walking
    /// parent links until a root or a repeat of `node.id` is found. The node
    /// itself need not be present in the tree yet.
    pub fn validate(&self, node: &CostCenter) -> Result<u8, CostCenterError> {
        let Some(parent_id) = node.parent_id else {
            return Ok(1);
        };
        if parent_id == node.id {
            return Err(CostCenterError::CycleDetected(node.id));
        }

        let parent = self
            .get(parent_id)
            .ok_or(CostCenterError::UnknownParent(parent_id))?;

        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current.id == node.id {
                return Err(CostCenterError::CycleDetected(node.id));
            }
            ancestor = match current.parent_id {
                Some(id) => Some(self.get(id).ok_or(CostCenterError::UnknownParent(id))?),
                None => None,
            };
        }

        Ok(parent.level + 1)
    }
}
