use std::collections::HashMap;
use std::sync::Arc;

use quorum_core::RoleId;
use quorum_domain::{PermissionSet, RoleGrantRow, granted_permission_ids};
use tracing::{debug, warn};

use crate::member_ports::RoleGrantRepository;

/// Session-scoped resolver for role default permissions.
///
/// Grant rows are fetched once per role and kept for the rest of the editing
/// session. Failed fetches are not cached, so a later lookup retries.
pub struct DefaultResolver {
    repository: Arc<dyn RoleGrantRepository>,
    grant_rows: HashMap<RoleId, Vec<RoleGrantRow>>,
}

impl DefaultResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new(repository: Arc<dyn RoleGrantRepository>) -> Self {
        Self {
            repository,
            grant_rows: HashMap::new(),
        }
    }

    /// Returns the default permission set for a role, fetching it on first use.
    ///
    /// A failed fetch is logged and resolves to no defaults so the operator can
    /// still grant permissions by hand.
    pub async fn resolve_defaults(&mut self, role_id: RoleId) -> PermissionSet {
        if let Some(rows) = self.grant_rows.get(&role_id) {
            debug!(role_id = %role_id, "role defaults served from session cache");
            return granted_permission_ids(rows);
        }

        match self.repository.list_role_grants(role_id).await {
            Ok(rows) => {
                let defaults = granted_permission_ids(&rows);
                debug!(
                    role_id = %role_id,
                    rows = rows.len(),
                    granted = defaults.len(),
                    "role defaults fetched"
                );
                self.grant_rows.insert(role_id, rows);
                defaults
            }
            Err(error) => {
                warn!(
                    role_id = %role_id,
                    error = %error,
                    "failed to fetch role defaults; continuing without defaults"
                );
                PermissionSet::new()
            }
        }
    }

    /// Returns cached defaults without fetching; empty when not yet resolved.
    #[must_use]
    pub fn cached_defaults(&self, role_id: Option<RoleId>) -> PermissionSet {
        role_id
            .and_then(|role_id| self.grant_rows.get(&role_id))
            .map(|rows| granted_permission_ids(rows))
            .unwrap_or_default()
    }

    /// Returns the raw grant rows cached for a role.
    #[must_use]
    pub fn role_grant_rows(&self, role_id: RoleId) -> Option<&[RoleGrantRow]> {
        self.grant_rows.get(&role_id).map(Vec::as_slice)
    }
}
