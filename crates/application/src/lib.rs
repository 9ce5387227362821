//! Application services and ports.

#![forbid(unsafe_code)]

mod catalog_service;
mod default_resolver;
mod member_draft_session;
mod member_form_service;
mod member_ports;
mod reconciliation_service;

#[cfg(test)]
mod test_support;

pub use catalog_service::{CatalogService, PermissionCatalog};
pub use default_resolver::DefaultResolver;
pub use member_draft_session::MemberDraftSession;
pub use member_form_service::{MemberFormService, SubmissionOutcome};
pub use member_ports::{
    CatalogRepository, ContainerInput, ContainerRepository, CreateMemberPermissionsInput,
    MemberPermissionRepository, MemberRepository, RoleGrantRepository,
    UpdateMemberPermissionsInput,
};
pub use reconciliation_service::{PermissionWrite, ReconciliationReport, ReconciliationService};
