use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use quorum_core::{AppError, AppResult, DraftKey, MemberId, RoleId, UserId};
use quorum_domain::{ContainerRef, DraftMember, Member, NewMemberInput, PermissionDiff};
use tracing::{debug, info, warn};

use crate::member_ports::{
    CreateMemberPermissionsInput, MemberPermissionRepository, MemberRepository,
    UpdateMemberPermissionsInput,
};

mod report;

#[cfg(test)]
mod tests;

pub use report::{PermissionWrite, ReconciliationReport};

/// Draft row that has both a user and a role.
struct CompleteDraft<'a> {
    draft: &'a DraftMember,
    user_id: &'a UserId,
    role_id: RoleId,
}

/// Application service that persists draft members and their permission grants.
///
/// New members are created in one batch and resolved back to member IDs before
/// any permission write. Permission writes then run one member at a time in
/// draft order; a failure on one member does not stop the others.
#[derive(Clone)]
pub struct ReconciliationService {
    members: Arc<dyn MemberRepository>,
    permissions: Arc<dyn MemberPermissionRepository>,
}

impl ReconciliationService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        members: Arc<dyn MemberRepository>,
        permissions: Arc<dyn MemberPermissionRepository>,
    ) -> Self {
        Self {
            members,
            permissions,
        }
    }

    /// Reconciles drafts against the persisted members of a saved container.
    ///
    /// Returns `AppError::PartialFailure` when any per-member permission write
    /// failed. Member creation is not rolled back in that case.
    pub async fn reconcile(
        &self,
        container: ContainerRef,
        drafts: &[DraftMember],
    ) -> AppResult<ReconciliationReport> {
        let mut report = ReconciliationReport::default();
        let mut complete = Vec::new();

        for draft in drafts {
            match (draft.user_id(), draft.role_id()) {
                (Some(user_id), Some(role_id)) => complete.push(CompleteDraft {
                    draft,
                    user_id,
                    role_id,
                }),
                _ => report.skipped_incomplete.push(draft.key()),
            }
        }

        let created = self
            .create_new_members(container, &complete, drafts, &mut report)
            .await?;

        let mut failed_members = Vec::new();
        for entry in &complete {
            let key = entry.draft.key();
            let (member_id, is_new) = match entry.draft.id() {
                Some(member_id) => (member_id, false),
                None => match created.get(&key) {
                    Some(member_id) => (*member_id, true),
                    None => continue,
                },
            };

            if entry.draft.permissions().is_empty() {
                debug!(
                    container = %container,
                    member_id = %member_id,
                    "member grants no permissions; nothing to save"
                );
                report.skipped_empty.push(key);
                continue;
            }

            let result = if is_new {
                self.create_permissions(container, member_id, entry)
                    .await
                    .map(Some)
            } else {
                self.update_permissions(container, member_id, entry).await
            };

            match result {
                Ok(Some(write)) => report.permission_writes.push(write),
                Ok(None) => report.unchanged.push(member_id),
                Err(error) => {
                    warn!(
                        container = %container,
                        member_id = %member_id,
                        role_id = %entry.role_id,
                        error = %error,
                        "failed to save member permissions"
                    );
                    failed_members.push(member_id);
                }
            }
        }

        info!(
            container = %container,
            created = report.created_members.len(),
            written = report.permission_writes.len(),
            unchanged = report.unchanged.len(),
            skipped_incomplete = report.skipped_incomplete.len(),
            skipped_unresolved = report.skipped_unresolved.len(),
            failed = failed_members.len(),
            "member reconciliation finished"
        );

        if failed_members.is_empty() {
            return Ok(report);
        }

        let failed = failed_members
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Err(AppError::PartialFailure(format!(
            "permissions were not saved for {} of {} members in {container} (members {failed})",
            failed_members.len(),
            complete.len()
        )))
    }

    async fn create_new_members(
        &self,
        container: ContainerRef,
        complete: &[CompleteDraft<'_>],
        drafts: &[DraftMember],
        report: &mut ReconciliationReport,
    ) -> AppResult<HashMap<DraftKey, MemberId>> {
        let new_drafts: Vec<&CompleteDraft<'_>> = complete
            .iter()
            .filter(|entry| entry.draft.id().is_none())
            .collect();
        if new_drafts.is_empty() {
            return Ok(HashMap::new());
        }

        let inputs: Vec<NewMemberInput> = new_drafts
            .iter()
            .map(|entry| NewMemberInput {
                container_id: container.id,
                user_id: entry.user_id.clone(),
                role_id: entry.role_id,
            })
            .collect();

        self.members.add_members(container, &inputs).await?;
        let persisted = self.members.list_members(container).await?;

        let mut claimed: HashSet<MemberId> = drafts.iter().filter_map(DraftMember::id).collect();
        let mut created = HashMap::new();
        for entry in new_drafts {
            match claim_member(&persisted, entry, &mut claimed) {
                Some(member_id) => {
                    report.created_members.push(member_id);
                    created.insert(entry.draft.key(), member_id);
                }
                None => {
                    warn!(
                        container = %container,
                        user_id = %entry.user_id,
                        role_id = %entry.role_id,
                        "created member not found on re-fetch; skipping its permissions"
                    );
                    report.skipped_unresolved.push(entry.user_id.clone());
                }
            }
        }

        info!(
            container = %container,
            requested = inputs.len(),
            resolved = created.len(),
            "created container members"
        );

        Ok(created)
    }

    async fn create_permissions(
        &self,
        container: ContainerRef,
        member_id: MemberId,
        entry: &CompleteDraft<'_>,
    ) -> AppResult<PermissionWrite> {
        let permission_ids: Vec<_> = entry.draft.permissions().iter().copied().collect();

        self.permissions
            .create_member_permissions(
                container.kind,
                CreateMemberPermissionsInput {
                    member_id,
                    role_id: entry.role_id,
                    permission_ids: permission_ids.clone(),
                },
            )
            .await?;

        info!(
            container = %container,
            member_id = %member_id,
            role_id = %entry.role_id,
            granted = permission_ids.len(),
            "created member permissions"
        );

        Ok(PermissionWrite::Created {
            member_id,
            role_id: entry.role_id,
            permission_ids,
        })
    }

    async fn update_permissions(
        &self,
        container: ContainerRef,
        member_id: MemberId,
        entry: &CompleteDraft<'_>,
    ) -> AppResult<Option<PermissionWrite>> {
        let persisted = self
            .permissions
            .list_member_permissions(container.kind, member_id, entry.role_id)
            .await?;
        let diff = PermissionDiff::between(&persisted, entry.draft.permissions());

        if diff.is_empty() {
            debug!(
                container = %container,
                member_id = %member_id,
                "member permissions already up to date"
            );
            return Ok(None);
        }

        self.permissions
            .update_member_permissions(
                container.kind,
                UpdateMemberPermissionsInput {
                    member_id,
                    role_id: entry.role_id,
                    added: diff.added_or_none(),
                    deleted: diff.deleted_or_none(),
                },
            )
            .await?;

        info!(
            container = %container,
            member_id = %member_id,
            role_id = %entry.role_id,
            added = diff.added.len(),
            deleted = diff.deleted.len(),
            "updated member permissions"
        );

        Ok(Some(PermissionWrite::Updated {
            member_id,
            role_id: entry.role_id,
            diff,
        }))
    }
}

/// Picks the persisted member created for a draft.
///
/// Members already claimed by other drafts are excluded. A member whose role
/// matches wins over one that does not, then the most recently created row.
fn claim_member(
    persisted: &[Member],
    entry: &CompleteDraft<'_>,
    claimed: &mut HashSet<MemberId>,
) -> Option<MemberId> {
    let member_id = persisted
        .iter()
        .filter(|member| &member.user_id == entry.user_id && !claimed.contains(&member.id))
        .max_by_key(|member| (member.role_id == Some(entry.role_id), member.id))
        .map(|member| member.id)?;

    claimed.insert(member_id);
    Some(member_id)
}
