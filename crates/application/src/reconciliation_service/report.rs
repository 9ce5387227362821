use quorum_core::{DraftKey, MemberId, PermissionId, RoleId, UserId};
use quorum_domain::PermissionDiff;

/// Permission write issued for one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionWrite {
    /// Initial grant rows created for a new member.
    Created {
        /// Member receiving the grants.
        member_id: MemberId,
        /// Role the grants are scoped to.
        role_id: RoleId,
        /// Granted permissions.
        permission_ids: Vec<PermissionId>,
    },
    /// Incremental change applied to an existing member.
    Updated {
        /// Member whose grants changed.
        member_id: MemberId,
        /// Role the grants are scoped to.
        role_id: RoleId,
        /// Applied change.
        diff: PermissionDiff,
    },
}

impl PermissionWrite {
    /// Returns the member the write targeted.
    #[must_use]
    pub fn member_id(&self) -> MemberId {
        match self {
            Self::Created { member_id, .. } | Self::Updated { member_id, .. } => *member_id,
        }
    }
}

/// Outcome of one successful reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Members created by the batch request, in draft order.
    pub created_members: Vec<MemberId>,
    /// Rows skipped because user or role was missing.
    pub skipped_incomplete: Vec<DraftKey>,
    /// New rows whose member could not be found after creation.
    pub skipped_unresolved: Vec<UserId>,
    /// Rows skipped because they grant no permissions.
    pub skipped_empty: Vec<DraftKey>,
    /// Existing members whose persisted grants already matched.
    pub unchanged: Vec<MemberId>,
    /// Permission writes issued, in draft order.
    pub permission_writes: Vec<PermissionWrite>,
}
