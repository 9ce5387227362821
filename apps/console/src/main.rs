//! Quorum member assignment console.

#![forbid(unsafe_code)]

mod plan;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use quorum_application::{
    CatalogService, MemberDraftSession, MemberFormService, PermissionWrite,
    ReconciliationService, SubmissionOutcome,
};
use quorum_core::{AppError, AppResult, NonEmptyString};
use quorum_domain::ContainerRef;
use quorum_infrastructure::{ApiClientConfig, HttpCouncilApi};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::plan::AssignmentPlan;

#[derive(Debug, Clone)]
struct ConsoleConfig {
    api: ApiClientConfig,
    application_id: NonEmptyString,
    plan_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ConsoleConfig::load()?;
    let plan = AssignmentPlan::load(config.plan_path.as_path())?;
    let api = Arc::new(HttpCouncilApi::new(config.api.clone())?);

    info!(
        api_base_url = %config.api.base_url,
        application_id = %config.application_id.as_str(),
        plan_path = %config.plan_path.display(),
        "quorum-console started"
    );

    let catalog_service = CatalogService::new(api.clone(), config.application_id.clone());
    let users = catalog_service.list_assignable_users().await?;
    let catalog = catalog_service.load_permission_catalog().await?;

    let mut session = match plan.container.id {
        Some(id) => {
            let container = ContainerRef {
                kind: plan.container.kind,
                id,
            };
            MemberDraftSession::load_existing(api.clone(), api.as_ref(), api.as_ref(), container)
                .await?
        }
        None => MemberDraftSession::new(api.clone()),
    };
    plan.apply(&mut session, &catalog, &users).await?;

    let form_service = MemberFormService::new(
        api.clone(),
        ReconciliationService::new(api.clone(), api.clone()),
    );
    let outcome = form_service
        .submit(
            plan.container.kind,
            plan.container.id,
            plan.container_input(),
            session,
        )
        .await
        .inspect_err(|error| {
            warn!(error = %error, "member assignment was not fully saved");
        })?;

    log_outcome(&outcome);
    Ok(())
}

impl ConsoleConfig {
    fn load() -> AppResult<Self> {
        let base_url = env::var("QUORUM_API_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:5000".to_owned());
        let bearer_token = env::var("QUORUM_API_TOKEN")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        let application_id = NonEmptyString::new(required_env("QUORUM_APPLICATION_ID")?)?;
        let plan_path = PathBuf::from(required_env("QUORUM_PLAN_PATH")?);
        let page_size = parse_env_u32("QUORUM_PAGE_SIZE", ApiClientConfig::DEFAULT_PAGE_SIZE)?;
        let timeout_seconds = parse_env_u64(
            "QUORUM_HTTP_TIMEOUT_SECONDS",
            ApiClientConfig::DEFAULT_TIMEOUT_SECONDS,
        )?;

        if page_size == 0 {
            return Err(AppError::Validation(
                "QUORUM_PAGE_SIZE must be greater than zero".to_owned(),
            ));
        }

        if timeout_seconds == 0 {
            return Err(AppError::Validation(
                "QUORUM_HTTP_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            api: ApiClientConfig {
                bearer_token,
                page_size,
                timeout_seconds,
                ..ApiClientConfig::new(base_url)
            },
            application_id,
            plan_path,
        })
    }
}

fn log_outcome(outcome: &SubmissionOutcome) {
    let report = &outcome.report;
    for write in &report.permission_writes {
        match write {
            PermissionWrite::Created {
                member_id,
                role_id,
                permission_ids,
            } => info!(
                container = %outcome.container,
                member_id = %member_id,
                role_id = %role_id,
                granted = permission_ids.len(),
                "created member permissions"
            ),
            PermissionWrite::Updated {
                member_id,
                role_id,
                diff,
            } => info!(
                container = %outcome.container,
                member_id = %member_id,
                role_id = %role_id,
                added = diff.added.len(),
                deleted = diff.deleted.len(),
                "updated member permissions"
            ),
        }
    }

    info!(
        container = %outcome.container,
        created_members = report.created_members.len(),
        skipped_incomplete = report.skipped_incomplete.len(),
        skipped_unresolved = report.skipped_unresolved.len(),
        skipped_empty = report.skipped_empty.len(),
        unchanged = report.unchanged.len(),
        "member assignment saved"
    );
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
