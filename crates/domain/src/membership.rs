use std::fmt::{Display, Formatter};

use quorum_core::{ContainerId, MemberId, RoleId, UserId};
use serde::{Deserialize, Serialize};

/// Kind of entity that owns members and their permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// A committee.
    Committee,
    /// A council.
    Council,
}

impl ContainerKind {
    /// Returns a stable transport value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Committee => "committee",
            Self::Council => "council",
        }
    }
}

impl Display for ContainerKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Reference to one committee or council.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerRef {
    /// Container kind.
    pub kind: ContainerKind,
    /// Container identifier.
    pub id: ContainerId,
}

impl ContainerRef {
    /// Creates a committee reference.
    #[must_use]
    pub fn committee(id: ContainerId) -> Self {
        Self {
            kind: ContainerKind::Committee,
            id,
        }
    }

    /// Creates a council reference.
    #[must_use]
    pub fn council(id: ContainerId) -> Self {
        Self {
            kind: ContainerKind::Council,
            id,
        }
    }
}

impl Display for ContainerRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.kind, self.id)
    }
}

/// Persisted member row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Member identifier.
    pub id: MemberId,
    /// Owning container identifier.
    pub container_id: ContainerId,
    /// Assigned person.
    pub user_id: UserId,
    /// Assigned role, when the row carries one.
    pub role_id: Option<RoleId>,
}

/// One entry of a batch member creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMemberInput {
    /// Owning container identifier.
    pub container_id: ContainerId,
    /// Assigned person.
    pub user_id: UserId,
    /// Assigned role.
    pub role_id: RoleId,
}
