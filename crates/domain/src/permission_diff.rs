use quorum_core::PermissionId;

use crate::PermissionSet;

/// Minimal grant changes that move a persisted permission set to a desired one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionDiff {
    /// Permissions desired but not persisted.
    pub added: Vec<PermissionId>,
    /// Permissions persisted but no longer desired.
    pub deleted: Vec<PermissionId>,
}

impl PermissionDiff {
    /// Computes `desired - persisted` and `persisted - desired`.
    #[must_use]
    pub fn between(persisted: &PermissionSet, desired: &PermissionSet) -> Self {
        Self {
            added: desired.difference(persisted).copied().collect(),
            deleted: persisted.difference(desired).copied().collect(),
        }
    }

    /// Returns whether no write is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty()
    }

    /// Returns the added list, or `None` when nothing is added.
    #[must_use]
    pub fn added_or_none(&self) -> Option<Vec<PermissionId>> {
        non_empty(&self.added)
    }

    /// Returns the deleted list, or `None` when nothing is deleted.
    #[must_use]
    pub fn deleted_or_none(&self) -> Option<Vec<PermissionId>> {
        non_empty(&self.deleted)
    }
}

fn non_empty(values: &[PermissionId]) -> Option<Vec<PermissionId>> {
    if values.is_empty() {
        None
    } else {
        Some(values.to_vec())
    }
}
