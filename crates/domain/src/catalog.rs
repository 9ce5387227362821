use std::collections::BTreeSet;

use quorum_core::{LocalizedName, PermissionId, RoleId, UserId};
use serde::{Deserialize, Serialize};

/// Ordered set of permission identifiers.
///
/// Presence means granted. Denied permissions are never stored.
pub type PermissionSet = BTreeSet<PermissionId>;

/// Permission catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Catalog identifier.
    pub id: PermissionId,
    /// Display name in both languages.
    pub name: LocalizedName,
    /// Optional description shown next to the toggle.
    pub description: Option<String>,
}

/// Role that can be assigned to a committee or council member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier.
    pub id: RoleId,
    /// Display name in both languages.
    pub name: LocalizedName,
}

/// One default grant row for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrantRow {
    /// Role the row belongs to.
    pub role_id: RoleId,
    /// Permission the row refers to.
    pub permission_id: PermissionId,
    /// Whether the role grants the permission by default.
    pub is_granted: bool,
}

/// Returns the permissions granted by a set of role grant rows.
#[must_use]
pub fn granted_permission_ids(rows: &[RoleGrantRow]) -> PermissionSet {
    rows.iter()
        .filter(|row| row.is_granted)
        .map(|row| row.permission_id)
        .collect()
}

/// Person offered by the member picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignableUser {
    /// Directory identity.
    pub id: UserId,
    /// Display name in both languages.
    pub name: LocalizedName,
    /// Optional contact email.
    pub email: Option<String>,
}
