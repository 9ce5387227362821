use std::sync::Arc;

use quorum_core::{AppError, AppResult, DraftKey, PermissionId, RoleId, UserId};
use quorum_domain::{ContainerRef, DraftMember, LoadedMemberState, PermissionSet};
use tracing::{info, warn};

use crate::DefaultResolver;
use crate::member_ports::{MemberPermissionRepository, MemberRepository, RoleGrantRepository};


/// Draft member rows and role default caches owned by one editing session.
///
/// The session is the only writer of its drafts. It ends when it is consumed
/// by [`MemberDraftSession::into_drafts`] or dropped.
pub struct MemberDraftSession {
    defaults: DefaultResolver,
    drafts: Vec<DraftMember>,
}

impl MemberDraftSession {
    /// Starts an empty session, as used when creating a new container.
    #[must_use]
    pub fn new(role_grants: Arc<dyn RoleGrantRepository>) -> Self {
        Self {
            defaults: DefaultResolver::new(role_grants),
            drafts: Vec::new(),
        }
    }

    /// Starts a session seeded with the persisted members of a container.
    ///
    /// A failed permission lookup for one member leaves that row without loaded
    /// permissions instead of failing the whole load.
    pub async fn load_existing(
        role_grants: Arc<dyn RoleGrantRepository>,
        members: &dyn MemberRepository,
        permissions: &dyn MemberPermissionRepository,
        container: ContainerRef,
    ) -> AppResult<Self> {
        let mut session = Self::new(role_grants);
        let persisted_members = members.list_members(container).await?;

        for member in persisted_members {
            let (granted, permissions_loaded) = match member.role_id {
                Some(role_id) => match permissions
                    .list_member_permissions(container.kind, member.id, role_id)
                    .await
                {
                    Ok(granted) => (granted, true),
                    Err(error) => {
                        warn!(
                            container = %container,
                            member_id = %member.id,
                            role_id = %role_id,
                            error = %error,
                            "failed to load member permissions"
                        );
                        (PermissionSet::new(), false)
                    }
                },
                None => (PermissionSet::new(), false),
            };

            if granted.is_empty()
                && let Some(role_id) = member.role_id
            {
                let _ = session.defaults.resolve_defaults(role_id).await;
            }

            session.drafts.push(DraftMember::from_persisted(
                DraftKey::new(),
                LoadedMemberState {
                    member_id: member.id,
                    user_id: member.user_id,
                    role_id: member.role_id,
                    granted,
                    permissions_loaded,
                },
            ));
        }

        info!(
            container = %container,
            members = session.drafts.len(),
            "loaded members for editing"
        );

        Ok(session)
    }

    /// Appends an empty row and returns its key.
    pub fn add_member(&mut self) -> DraftKey {
        let key = DraftKey::new();
        self.drafts.push(DraftMember::new(key));
        key
    }

    /// Removes a row and returns it.
    pub fn remove_member(&mut self, key: DraftKey) -> AppResult<DraftMember> {
        let index = self.position(key)?;
        Ok(self.drafts.remove(index))
    }

    /// Changes the user of a row, dropping its role and permissions.
    pub fn set_user(&mut self, key: DraftKey, user_id: Option<UserId>) -> AppResult<()> {
        self.draft_mut(key)?.set_user(user_id);
        Ok(())
    }

    /// Changes the role of a row and applies the role defaults.
    pub async fn set_role(&mut self, key: DraftKey, role_id: Option<RoleId>) -> AppResult<()> {
        let has_user = self.draft(key)?.user_id().is_some();
        let defaults = match role_id {
            Some(role_id) if has_user => self.defaults.resolve_defaults(role_id).await,
            _ => PermissionSet::new(),
        };

        self.draft_mut(key)?.assign_role(role_id, &defaults)
    }

    /// Flips one permission of a row and returns whether it is now granted.
    ///
    /// Operates on the row's stored permissions, which may be empty while
    /// [`Self::effective_permissions`] shows the role defaults.
    pub fn toggle_permission(
        &mut self,
        key: DraftKey,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        self.draft_mut(key)?.toggle_permission(permission_id)
    }

    /// Restores the role defaults of a row.
    pub async fn reset_to_default(&mut self, key: DraftKey) -> AppResult<()> {
        let Some(role_id) = self.draft(key)?.role_id() else {
            return Ok(());
        };

        let defaults = self.defaults.resolve_defaults(role_id).await;
        self.draft_mut(key)?.reset_to_default(&defaults);
        Ok(())
    }

    /// Returns the permissions a row renders and saves.
    pub fn effective_permissions(&self, key: DraftKey) -> AppResult<PermissionSet> {
        let draft = self.draft(key)?;
        Ok(draft.effective_permissions(&self.defaults.cached_defaults(draft.role_id())))
    }

    /// Returns one row.
    #[must_use]
    pub fn member(&self, key: DraftKey) -> Option<&DraftMember> {
        self.drafts.iter().find(|draft| draft.key() == key)
    }

    /// Returns all rows in display order.
    #[must_use]
    pub fn members(&self) -> &[DraftMember] {
        &self.drafts
    }

    /// Ends the session and returns its rows.
    #[must_use]
    pub fn into_drafts(self) -> Vec<DraftMember> {
        self.drafts
    }

    fn position(&self, key: DraftKey) -> AppResult<usize> {
        self.drafts
            .iter()
            .position(|draft| draft.key() == key)
            .ok_or_else(|| AppError::NotFound(format!("draft member '{key}' does not exist")))
    }

    fn draft(&self, key: DraftKey) -> AppResult<&DraftMember> {
        self.member(key)
            .ok_or_else(|| AppError::NotFound(format!("draft member '{key}' does not exist")))
    }

    fn draft_mut(&mut self, key: DraftKey) -> AppResult<&mut DraftMember> {
        self.drafts
            .iter_mut()
            .find(|draft| draft.key() == key)
            .ok_or_else(|| AppError::NotFound(format!("draft member '{key}' does not exist")))
    }
}
