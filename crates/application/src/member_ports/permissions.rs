use async_trait::async_trait;

use quorum_core::{AppResult, MemberId, PermissionId, RoleId};
use quorum_domain::{ContainerKind, PermissionSet};

/// Full permission grant for a member that has no persisted rows yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMemberPermissionsInput {
    /// Member receiving the grants.
    pub member_id: MemberId,
    /// Role the grants are scoped to.
    pub role_id: RoleId,
    /// Granted permissions.
    pub permission_ids: Vec<PermissionId>,
}

/// Incremental grant change for an existing member.
///
/// `None` means no change was requested for that side, which the service
/// treats differently from an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMemberPermissionsInput {
    /// Member whose grants change.
    pub member_id: MemberId,
    /// Role the grants are scoped to.
    pub role_id: RoleId,
    /// Permissions to grant.
    pub added: Option<Vec<PermissionId>>,
    /// Permissions to revoke.
    pub deleted: Option<Vec<PermissionId>>,
}

/// Port for per-member, role-scoped permission grants.
#[async_trait]
pub trait MemberPermissionRepository: Send + Sync {
    /// Returns the permissions currently granted to a member under one role.
    async fn list_member_permissions(
        &self,
        kind: ContainerKind,
        member_id: MemberId,
        role_id: RoleId,
    ) -> AppResult<PermissionSet>;

    /// Creates the initial grant rows for a member.
    async fn create_member_permissions(
        &self,
        kind: ContainerKind,
        input: CreateMemberPermissionsInput,
    ) -> AppResult<()>;

    /// Applies added and deleted grants for a member.
    async fn update_member_permissions(
        &self,
        kind: ContainerKind,
        input: UpdateMemberPermissionsInput,
    ) -> AppResult<()>;
}
