//! Draft member rows edited in one form session.
//!
//! A draft moves through three permission states:
//! `NoRole -> RoleDefaults -> Customized`. Only an explicit reset returns a
//! customized draft to role defaults, and only a change of user clears the
//! role again.

use quorum_core::{AppError, AppResult, DraftKey, MemberId, PermissionId, RoleId, UserId};

use crate::PermissionSet;

/// Permission sub-state of a draft member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// No role chosen; no permissions apply.
    NoRole,
    /// Role chosen and permissions mirror its defaults.
    RoleDefaults,
    /// Operator has toggled at least one permission.
    Customized,
}

/// Transient member assignment edited before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftMember {
    key: DraftKey,
    id: Option<MemberId>,
    user_id: Option<UserId>,
    role_id: Option<RoleId>,
    permissions: PermissionSet,
    is_customized: bool,
    permissions_loaded: bool,
}

/// Persisted state used to seed a draft for an existing member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedMemberState {
    /// Persisted member identifier.
    pub member_id: MemberId,
    /// Assigned person.
    pub user_id: UserId,
    /// Assigned role, if any.
    pub role_id: Option<RoleId>,
    /// Granted permissions read from persisted rows.
    pub granted: PermissionSet,
    /// Whether the persisted rows were actually fetched.
    pub permissions_loaded: bool,
}

impl DraftMember {
    /// Creates an empty row for a member that does not exist yet.
    #[must_use]
    pub fn new(key: DraftKey) -> Self {
        Self {
            key,
            id: None,
            user_id: None,
            role_id: None,
            permissions: PermissionSet::new(),
            is_customized: false,
            permissions_loaded: false,
        }
    }

    /// Creates a row for an existing member from its persisted state.
    ///
    /// A non-empty persisted grant set is treated as an intentional override.
    #[must_use]
    pub fn from_persisted(key: DraftKey, state: LoadedMemberState) -> Self {
        let permissions = if state.role_id.is_some() {
            state.granted
        } else {
            PermissionSet::new()
        };

        Self {
            key,
            id: Some(state.member_id),
            user_id: Some(state.user_id),
            role_id: state.role_id,
            is_customized: !permissions.is_empty(),
            permissions,
            permissions_loaded: state.permissions_loaded,
        }
    }

    /// Returns the session key for this row.
    #[must_use]
    pub fn key(&self) -> DraftKey {
        self.key
    }

    /// Returns the persisted member identifier, if the member exists.
    #[must_use]
    pub fn id(&self) -> Option<MemberId> {
        self.id
    }

    /// Returns the assigned person, if chosen.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Returns the assigned role, if chosen.
    #[must_use]
    pub fn role_id(&self) -> Option<RoleId> {
        self.role_id
    }

    /// Returns the explicitly granted permissions.
    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Returns whether the operator has hand-edited permissions.
    #[must_use]
    pub fn is_customized(&self) -> bool {
        self.is_customized
    }

    /// Returns whether persisted permission rows were fetched for this row.
    #[must_use]
    pub fn permissions_loaded(&self) -> bool {
        self.permissions_loaded
    }

    /// Returns whether the row has both a user and a role.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.user_id.is_some() && self.role_id.is_some()
    }

    /// Returns the permission sub-state.
    #[must_use]
    pub fn permission_state(&self) -> PermissionState {
        match (self.role_id, self.is_customized) {
            (None, _) => PermissionState::NoRole,
            (Some(_), false) => PermissionState::RoleDefaults,
            (Some(_), true) => PermissionState::Customized,
        }
    }

    /// Changes the assigned person.
    ///
    /// Any change of identity drops role and permission state.
    pub fn set_user(&mut self, user_id: Option<UserId>) {
        if self.user_id == user_id {
            return;
        }

        self.user_id = user_id;
        self.role_id = None;
        self.permissions.clear();
        self.is_customized = false;
        self.permissions_loaded = false;
    }

    /// Changes the assigned role and applies its defaults.
    ///
    /// Clearing the role clears permissions. Choosing a role requires a user.
    pub fn assign_role(
        &mut self,
        role_id: Option<RoleId>,
        defaults: &PermissionSet,
    ) -> AppResult<()> {
        let Some(role_id) = role_id else {
            self.role_id = None;
            self.permissions.clear();
            self.is_customized = false;
            return Ok(());
        };

        if self.user_id.is_none() {
            return Err(AppError::Validation(format!(
                "draft '{}' needs a user before role {role_id} can be assigned",
                self.key
            )));
        }

        self.role_id = Some(role_id);
        self.permissions = defaults.clone();
        self.is_customized = false;
        Ok(())
    }

    /// Flips one permission and returns whether it is now granted.
    ///
    /// The flip applies to the stored set, not to [`Self::effective_permissions`]:
    /// on a row whose stored set is empty, toggling a displayed default grants
    /// that single permission. The draft is marked customized even when the
    /// result equals the defaults.
    pub fn toggle_permission(&mut self, permission_id: PermissionId) -> AppResult<bool> {
        if self.role_id.is_none() {
            return Err(AppError::Validation(format!(
                "draft '{}' needs a role before permission {permission_id} can change",
                self.key
            )));
        }

        let granted = if self.permissions.remove(&permission_id) {
            false
        } else {
            self.permissions.insert(permission_id);
            true
        };
        self.is_customized = true;

        Ok(granted)
    }

    /// Restores role defaults. Does nothing when no role is chosen.
    pub fn reset_to_default(&mut self, defaults: &PermissionSet) {
        if self.role_id.is_none() {
            return;
        }

        self.permissions = defaults.clone();
        self.is_customized = false;
    }

    /// Returns the permissions to render and save.
    ///
    /// An empty explicit set falls back to the role defaults.
    #[must_use]
    pub fn effective_permissions(&self, defaults: &PermissionSet) -> PermissionSet {
        if self.role_id.is_none() {
            return PermissionSet::new();
        }

        if self.permissions.is_empty() {
            defaults.clone()
        } else {
            self.permissions.clone()
        }
    }
}
