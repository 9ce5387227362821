use std::sync::Arc;

use quorum_core::{AppResult, ContainerId, NonEmptyString};
use quorum_domain::{ContainerKind, ContainerRef};
use tracing::{info, warn};

use crate::member_ports::{ContainerInput, ContainerRepository};
use crate::{MemberDraftSession, ReconciliationReport, ReconciliationService};

/// Saved container and the reconciliation outcome for its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    /// Container the members were saved against.
    pub container: ContainerRef,
    /// Member and permission changes applied.
    pub report: ReconciliationReport,
}

/// Application service for submitting a committee or council form.
#[derive(Clone)]
pub struct MemberFormService {
    containers: Arc<dyn ContainerRepository>,
    reconciliation: ReconciliationService,
}

impl MemberFormService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        containers: Arc<dyn ContainerRepository>,
        reconciliation: ReconciliationService,
    ) -> Self {
        Self {
            containers,
            reconciliation,
        }
    }

    /// Saves the container record, then reconciles the session's members.
    ///
    /// Members are never touched when the container save fails. The session
    /// ends here whatever the outcome.
    pub async fn submit(
        &self,
        kind: ContainerKind,
        existing_id: Option<ContainerId>,
        input: ContainerInput,
        session: MemberDraftSession,
    ) -> AppResult<SubmissionOutcome> {
        NonEmptyString::new(input.name.arabic.as_str())?;
        NonEmptyString::new(input.name.english.as_str())?;

        let container = match existing_id {
            Some(id) => {
                let container = ContainerRef { kind, id };
                self.containers.update_container(container, &input).await?;
                container
            }
            None => ContainerRef {
                kind,
                id: self.containers.create_container(kind, &input).await?,
            },
        };

        info!(
            container = %container,
            created = existing_id.is_none(),
            "saved container record"
        );

        let drafts = session.into_drafts();
        let report = self
            .reconciliation
            .reconcile(container, &drafts)
            .await
            .inspect_err(|error| {
                warn!(
                    container = %container,
                    error = %error,
                    "container saved but member reconciliation failed"
                );
            })?;

        Ok(SubmissionOutcome { container, report })
    }
}
