use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use quorum_core::{
    AppError, AppResult, ContainerId, LocalizedName, MemberId, PermissionId, RoleId, UserId,
};
use quorum_domain::{
    AssignableUser, ContainerKind, ContainerRef, Member, NewMemberInput, Permission,
    PermissionSet, Role, RoleGrantRow,
};
use tokio::sync::Mutex;

use crate::member_ports::{
    CatalogRepository, ContainerInput, ContainerRepository, CreateMemberPermissionsInput,
    MemberPermissionRepository, MemberRepository, RoleGrantRepository,
    UpdateMemberPermissionsInput,
};

/// External call recorded by the fake backend, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    AddMembers(Vec<NewMemberInput>),
    ListMembers(ContainerRef),
    ListMemberPermissions(MemberId, RoleId),
    CreateMemberPermissions(CreateMemberPermissionsInput),
    UpdateMemberPermissions(UpdateMemberPermissionsInput),
    CreateContainer(ContainerKind),
    UpdateContainer(ContainerRef),
}

impl Call {
    pub(crate) fn is_permission_write(&self) -> bool {
        matches!(
            self,
            Self::CreateMemberPermissions(_) | Self::UpdateMemberPermissions(_)
        )
    }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub role_grants: HashMap<RoleId, Vec<RoleGrantRow>>,
    pub failing_roles: HashSet<RoleId>,
    pub role_grant_calls: Mutex<Vec<RoleId>>,
    pub members: Mutex<Vec<Member>>,
    pub fail_add_members: bool,
    pub fail_list_members: bool,
    pub fail_list_members_after_add: bool,
    pub silently_dropped_users: HashSet<UserId>,
    pub persisted: Mutex<HashMap<(MemberId, RoleId), PermissionSet>>,
    pub failing_permission_members: HashSet<MemberId>,
    pub failing_grant_reads: HashSet<MemberId>,
    pub fail_container_save: bool,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub(crate) async fn seed_member(
        &self,
        member_id: i64,
        container_id: i64,
        user_id: &str,
        role_id: i64,
        granted: &[i64],
    ) {
        self.members.lock().await.push(Member {
            id: MemberId::new(member_id),
            container_id: ContainerId::new(container_id),
            user_id: UserId::new(user_id),
            role_id: Some(RoleId::new(role_id)),
        });
        if !granted.is_empty() {
            self.persisted.lock().await.insert(
                (MemberId::new(member_id), RoleId::new(role_id)),
                permission_set(granted),
            );
        }
    }

    pub(crate) async fn recorded_calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub(crate) async fn permission_writes(&self) -> Vec<Call> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| call.is_permission_write())
            .cloned()
            .collect()
    }

    async fn next_member_id(&self) -> MemberId {
        let members = self.members.lock().await;
        let next = members
            .iter()
            .map(|member| member.id.value())
            .max()
            .unwrap_or(100)
            .saturating_add(1);
        MemberId::new(next)
    }
}

#[async_trait]
impl CatalogRepository for FakeBackend {
    async fn list_users(&self, application_id: &str) -> AppResult<Vec<AssignableUser>> {
        Ok(vec![AssignableUser {
            id: UserId::new(format!("{application_id}-user")),
            name: LocalizedName::new("مستخدم", "User"),
            email: None,
        }])
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut role_ids: Vec<RoleId> = self.role_grants.keys().copied().collect();
        role_ids.sort();
        Ok(role_ids
            .into_iter()
            .map(|id| Role {
                id,
                name: LocalizedName::new("دور", format!("Role {id}")),
            })
            .collect())
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let ids: PermissionSet = self
            .role_grants
            .values()
            .flatten()
            .map(|row| row.permission_id)
            .collect();
        Ok(ids
            .into_iter()
            .map(|id| Permission {
                id,
                name: LocalizedName::new("صلاحية", format!("Permission {id}")),
                description: None,
            })
            .collect())
    }
}

#[async_trait]
impl RoleGrantRepository for FakeBackend {
    async fn list_role_grants(&self, role_id: RoleId) -> AppResult<Vec<RoleGrantRow>> {
        self.role_grant_calls.lock().await.push(role_id);
        if self.failing_roles.contains(&role_id) {
            return Err(AppError::Transport(format!(
                "role grants for {role_id} unavailable"
            )));
        }

        Ok(self.role_grants.get(&role_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl MemberRepository for FakeBackend {
    async fn list_members(&self, container: ContainerRef) -> AppResult<Vec<Member>> {
        let after_add = {
            let mut calls = self.calls.lock().await;
            let after_add = calls
                .iter()
                .any(|call| matches!(call, Call::AddMembers(_)));
            calls.push(Call::ListMembers(container));
            after_add
        };
        if self.fail_list_members || (self.fail_list_members_after_add && after_add) {
            return Err(AppError::Transport("member listing failed".to_owned()));
        }

        Ok(self
            .members
            .lock()
            .await
            .iter()
            .filter(|member| member.container_id == container.id)
            .cloned()
            .collect())
    }

    async fn add_members(
        &self,
        _container: ContainerRef,
        members: &[NewMemberInput],
    ) -> AppResult<()> {
        self.calls
            .lock()
            .await
            .push(Call::AddMembers(members.to_vec()));
        if self.fail_add_members {
            return Err(AppError::Conflict("member batch rejected".to_owned()));
        }

        for input in members {
            if self.silently_dropped_users.contains(&input.user_id) {
                continue;
            }
            let id = self.next_member_id().await;
            self.members.lock().await.push(Member {
                id,
                container_id: input.container_id,
                user_id: input.user_id.clone(),
                role_id: Some(input.role_id),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl MemberPermissionRepository for FakeBackend {
    async fn list_member_permissions(
        &self,
        _kind: ContainerKind,
        member_id: MemberId,
        role_id: RoleId,
    ) -> AppResult<PermissionSet> {
        self.calls
            .lock()
            .await
            .push(Call::ListMemberPermissions(member_id, role_id));
        if self.failing_grant_reads.contains(&member_id) {
            return Err(AppError::Transport(format!(
                "grants for member {member_id} unavailable"
            )));
        }

        Ok(self
            .persisted
            .lock()
            .await
            .get(&(member_id, role_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_member_permissions(
        &self,
        _kind: ContainerKind,
        input: CreateMemberPermissionsInput,
    ) -> AppResult<()> {
        self.calls
            .lock()
            .await
            .push(Call::CreateMemberPermissions(input.clone()));
        if self.failing_permission_members.contains(&input.member_id) {
            return Err(AppError::Transport(format!(
                "permission create for member {} failed",
                input.member_id
            )));
        }

        self.persisted.lock().await.insert(
            (input.member_id, input.role_id),
            input.permission_ids.into_iter().collect(),
        );
        Ok(())
    }

    async fn update_member_permissions(
        &self,
        _kind: ContainerKind,
        input: UpdateMemberPermissionsInput,
    ) -> AppResult<()> {
        self.calls
            .lock()
            .await
            .push(Call::UpdateMemberPermissions(input.clone()));
        if self.failing_permission_members.contains(&input.member_id) {
            return Err(AppError::Transport(format!(
                "permission update for member {} failed",
                input.member_id
            )));
        }

        let mut persisted = self.persisted.lock().await;
        let granted = persisted
            .entry((input.member_id, input.role_id))
            .or_default();
        for permission_id in input.deleted.unwrap_or_default() {
            granted.remove(&permission_id);
        }
        granted.extend(input.added.unwrap_or_default());
        Ok(())
    }
}

#[async_trait]
impl ContainerRepository for FakeBackend {
    async fn create_container(
        &self,
        kind: ContainerKind,
        _input: &ContainerInput,
    ) -> AppResult<ContainerId> {
        self.calls.lock().await.push(Call::CreateContainer(kind));
        if self.fail_container_save {
            return Err(AppError::Validation("container name taken".to_owned()));
        }

        Ok(ContainerId::new(500))
    }

    async fn update_container(
        &self,
        container: ContainerRef,
        _input: &ContainerInput,
    ) -> AppResult<()> {
        self.calls
            .lock()
            .await
            .push(Call::UpdateContainer(container));
        if self.fail_container_save {
            return Err(AppError::Validation("container name taken".to_owned()));
        }

        Ok(())
    }
}

pub(crate) fn permission_set(values: &[i64]) -> PermissionSet {
    values.iter().copied().map(PermissionId::new).collect()
}

pub(crate) fn grant_rows(
    role_id: RoleId,
    rows: &[(i64, bool)],
) -> HashMap<RoleId, Vec<RoleGrantRow>> {
    HashMap::from([(
        role_id,
        rows.iter()
            .map(|(permission_id, is_granted)| RoleGrantRow {
                role_id,
                permission_id: PermissionId::new(*permission_id),
                is_granted: *is_granted,
            })
            .collect(),
    )])
}
