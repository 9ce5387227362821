use std::sync::Arc;

use quorum_core::{AppResult, NonEmptyString, PermissionId, RoleId};
use quorum_domain::{AssignableUser, Permission, Role};
use tracing::info;

use crate::member_ports::CatalogRepository;

/// Read-only permission and role reference data for one editing session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionCatalog {
    /// Assignable roles.
    pub roles: Vec<Role>,
    /// Full permission catalog.
    pub permissions: Vec<Permission>,
}

impl PermissionCatalog {
    /// Finds a role by identifier.
    #[must_use]
    pub fn role(&self, role_id: RoleId) -> Option<&Role> {
        self.roles.iter().find(|role| role.id == role_id)
    }

    /// Finds a permission by identifier.
    #[must_use]
    pub fn permission(&self, permission_id: PermissionId) -> Option<&Permission> {
        self.permissions
            .iter()
            .find(|permission| permission.id == permission_id)
    }
}

/// Application service for picker data.
#[derive(Clone)]
pub struct CatalogService {
    repository: Arc<dyn CatalogRepository>,
    application_id: NonEmptyString,
}

impl CatalogService {
    /// Creates a new service scoped to one application's user directory.
    #[must_use]
    pub fn new(repository: Arc<dyn CatalogRepository>, application_id: NonEmptyString) -> Self {
        Self {
            repository,
            application_id,
        }
    }

    /// Lists users that can be assigned as members.
    pub async fn list_assignable_users(&self) -> AppResult<Vec<AssignableUser>> {
        self.repository
            .list_users(self.application_id.as_str())
            .await
    }

    /// Loads roles and permissions for rendering toggle rows.
    pub async fn load_permission_catalog(&self) -> AppResult<PermissionCatalog> {
        let roles = self.repository.list_roles().await?;
        let permissions = self.repository.list_permissions().await?;

        info!(
            roles = roles.len(),
            permissions = permissions.len(),
            "loaded permission catalog"
        );

        Ok(PermissionCatalog { roles, permissions })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quorum_core::{NonEmptyString, PermissionId, RoleId, UserId};

    use super::CatalogService;
    use crate::test_support::{FakeBackend, grant_rows};

    fn service() -> Option<CatalogService> {
        let backend = Arc::new(FakeBackend {
            role_grants: grant_rows(RoleId::new(7), &[(1, true), (4, false)]),
            ..FakeBackend::default()
        });
        NonEmptyString::new("council-portal")
            .ok()
            .map(|application_id| CatalogService::new(backend, application_id))
    }

    #[tokio::test]
    async fn users_are_filtered_by_application() {
        let Some(service) = service() else {
            panic!("application id should be valid");
        };

        let users = service.list_assignable_users().await.unwrap_or_default();

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, UserId::new("council-portal-user"));
    }

    #[tokio::test]
    async fn catalog_supports_lookup_by_id() {
        let Some(service) = service() else {
            panic!("application id should be valid");
        };

        let catalog = service.load_permission_catalog().await.unwrap_or_default();

        assert!(catalog.role(RoleId::new(7)).is_some());
        assert!(catalog.permission(PermissionId::new(4)).is_some());
        assert!(catalog.permission(PermissionId::new(99)).is_none());
    }
}
