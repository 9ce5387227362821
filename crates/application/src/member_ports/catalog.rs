use async_trait::async_trait;

use quorum_core::{AppResult, RoleId};
use quorum_domain::{AssignableUser, Permission, Role, RoleGrantRow};

/// Read port for picker reference data.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Lists users that can be assigned within one application.
    async fn list_users(&self, application_id: &str) -> AppResult<Vec<AssignableUser>>;

    /// Lists assignable roles.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Lists the full permission catalog.
    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;
}

/// Read port for per-role default grant rows.
#[async_trait]
pub trait RoleGrantRepository: Send + Sync {
    /// Lists default grant rows for one role.
    async fn list_role_grants(&self, role_id: RoleId) -> AppResult<Vec<RoleGrantRow>>;
}
