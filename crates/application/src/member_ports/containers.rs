use async_trait::async_trait;

use quorum_core::{AppResult, ContainerId, LocalizedName};
use quorum_domain::{ContainerKind, ContainerRef};

/// Editable fields of a committee or council record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInput {
    /// Display name in both languages.
    pub name: LocalizedName,
    /// Optional description.
    pub description: Option<String>,
}

/// Write port for committee and council records.
#[async_trait]
pub trait ContainerRepository: Send + Sync {
    /// Creates a container record and returns its identifier.
    async fn create_container(
        &self,
        kind: ContainerKind,
        input: &ContainerInput,
    ) -> AppResult<ContainerId>;

    /// Updates an existing container record.
    async fn update_container(
        &self,
        container: ContainerRef,
        input: &ContainerInput,
    ) -> AppResult<()>;
}
