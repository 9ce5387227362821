use std::path::Path;

use quorum_application::{ContainerInput, MemberDraftSession, PermissionCatalog};
use quorum_core::{AppError, AppResult, ContainerId, LocalizedName, PermissionId, RoleId, UserId};
use quorum_domain::{AssignableUser, ContainerKind};
use serde::Deserialize;
use tracing::{info, warn};

/// Member assignments to apply to one committee or council.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct AssignmentPlan {
    pub container: ContainerPlan,
    #[serde(default)]
    pub members: Vec<MemberPlan>,
}

/// Container record to create or update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ContainerPlan {
    pub kind: ContainerKind,
    #[serde(default)]
    pub id: Option<ContainerId>,
    pub name_ar: String,
    pub name_en: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Edits for one member row, matched by user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct MemberPlan {
    pub user_id: UserId,
    #[serde(default)]
    pub role_id: Option<RoleId>,
    #[serde(default)]
    pub reset_to_default: bool,
    #[serde(default)]
    pub toggle: Vec<PermissionId>,
    #[serde(default)]
    pub remove: bool,
}

impl AssignmentPlan {
    pub(crate) fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            AppError::Validation(format!(
                "failed to read plan '{}': {error}",
                path.display()
            ))
        })?;

        Self::from_json(raw.as_str())
    }

    pub(crate) fn from_json(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw)
            .map_err(|error| AppError::Validation(format!("invalid assignment plan: {error}")))
    }

    pub(crate) fn container_input(&self) -> ContainerInput {
        ContainerInput {
            name: LocalizedName::new(
                self.container.name_ar.as_str(),
                self.container.name_en.as_str(),
            ),
            description: self
                .container
                .description
                .clone()
                .filter(|description| !description.trim().is_empty()),
        }
    }

    /// Applies every member edit to the session.
    ///
    /// Users missing from the directory are skipped. Unknown role or
    /// permission identifiers fail the whole plan before anything is saved.
    pub(crate) async fn apply(
        &self,
        session: &mut MemberDraftSession,
        catalog: &PermissionCatalog,
        users: &[AssignableUser],
    ) -> AppResult<()> {
        self.validate_references(catalog)?;

        for member in &self.members {
            if !users.iter().any(|user| user.id == member.user_id) {
                warn!(
                    user_id = %member.user_id,
                    "user is not assignable for this application, skipping"
                );
                continue;
            }

            let existing = session
                .members()
                .iter()
                .find(|draft| draft.user_id() == Some(&member.user_id))
                .map(|draft| draft.key());

            if member.remove {
                match existing {
                    Some(key) => {
                        session.remove_member(key)?;
                        info!(user_id = %member.user_id, "removed member row");
                    }
                    None => warn!(user_id = %member.user_id, "no member row to remove"),
                }
                continue;
            }

            let key = match existing {
                Some(key) => key,
                None => {
                    let key = session.add_member();
                    session.set_user(key, Some(member.user_id.clone()))?;
                    key
                }
            };

            let current_role = session.member(key).and_then(|draft| draft.role_id());
            if let Some(role) = member.role_id.and_then(|role_id| catalog.role(role_id))
                && Some(role.id) != current_role
            {
                session.set_role(key, Some(role.id)).await?;
                info!(
                    user_id = %member.user_id,
                    role = role.name.preferred(),
                    "assigned role"
                );
            }

            if member.reset_to_default {
                session.reset_to_default(key).await?;
            }

            for permission_id in &member.toggle {
                let granted = session.toggle_permission(key, *permission_id)?;
                info!(
                    user_id = %member.user_id,
                    permission = catalog
                        .permission(*permission_id)
                        .map_or("unknown", |permission| permission.name.preferred()),
                    granted,
                    "toggled permission"
                );
            }
        }

        Ok(())
    }

    fn validate_references(&self, catalog: &PermissionCatalog) -> AppResult<()> {
        for member in &self.members {
            if let Some(role_id) = member.role_id
                && catalog.role(role_id).is_none()
            {
                return Err(AppError::Validation(format!(
                    "plan for user '{}' names unknown role {role_id}",
                    member.user_id
                )));
            }

            if let Some(permission_id) = member
                .toggle
                .iter()
                .find(|permission_id| catalog.permission(**permission_id).is_none())
            {
                return Err(AppError::Validation(format!(
                    "plan for user '{}' names unknown permission {permission_id}",
                    member.user_id
                )));
            }
        }

        Ok(())
    }
}
