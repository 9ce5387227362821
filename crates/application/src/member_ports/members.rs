use async_trait::async_trait;

use quorum_core::AppResult;
use quorum_domain::{ContainerRef, Member, NewMemberInput};

/// Port for container member rows.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Lists all members of one container.
    async fn list_members(&self, container: ContainerRef) -> AppResult<Vec<Member>>;

    /// Creates members in one batch request.
    ///
    /// The service does not return identifiers for batch-created rows.
    async fn add_members(
        &self,
        container: ContainerRef,
        members: &[NewMemberInput],
    ) -> AppResult<()>;
}
