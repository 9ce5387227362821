use quorum_domain::ContainerKind;

/// Endpoint paths that differ between committees and councils.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ContainerRoutes {
    pub containers: &'static str,
    pub members: &'static str,
    pub member_batch: String,
    pub member_permissions: &'static str,
    pub container_key: &'static str,
}

impl ContainerRoutes {
    pub(super) fn for_kind(kind: ContainerKind) -> Self {
        let (containers, members, member_permissions, container_key) = match kind {
            ContainerKind::Committee => (
                "/api/Committees",
                "/api/CommitteeMembers",
                "/api/CommitteeMemberRolePermissions",
                "CommitteeId",
            ),
            ContainerKind::Council => (
                "/api/Councils",
                "/api/CouncilMembers",
                "/api/CouncilMemberRolePermissions",
                "CouncilId",
            ),
        };

        Self {
            containers,
            members,
            member_batch: format!("{members}/Batch"),
            member_permissions,
            container_key,
        }
    }
}
