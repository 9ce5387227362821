use std::time::Duration;

use async_trait::async_trait;
use quorum_application::{
    CatalogRepository, ContainerInput, ContainerRepository, CreateMemberPermissionsInput,
    MemberPermissionRepository, MemberRepository, RoleGrantRepository,
    UpdateMemberPermissionsInput,
};
use quorum_core::{AppError, AppResult, ContainerId, MemberId, RoleId};
use quorum_domain::{
    AssignableUser, ContainerKind, ContainerRef, Member, NewMemberInput, Permission,
    PermissionSet, Role, RoleGrantRow,
};
use reqwest::{Method, StatusCode, Url, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

mod dto;
mod routes;


use dto::{
    ContainerBody, CreateMemberPermissionsBody, CreatedId, GrantDto, ListEnvelope, MemberDto,
    PermissionDto, RoleDto, UpdateMemberPermissionsBody, UserDto,
};
use routes::ContainerRoutes;

/// Connection settings for the committee and council services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClientConfig {
    /// Service base URL without a trailing slash.
    pub base_url: String,
    /// Optional bearer token sent on every request.
    pub bearer_token: Option<String>,
    /// Page size requested from list endpoints.
    pub page_size: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl ApiClientConfig {
    /// Default page size, large enough to return reference data in one page.
    pub const DEFAULT_PAGE_SIZE: u32 = 1000;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

    /// Creates a config with default paging and timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            bearer_token: None,
            page_size: Self::DEFAULT_PAGE_SIZE,
            timeout_seconds: Self::DEFAULT_TIMEOUT_SECONDS,
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(AppError::Validation(
                "api base url must not be empty".to_owned(),
            ));
        }

        if self.page_size == 0 {
            return Err(AppError::Validation(
                "api page size must be greater than zero".to_owned(),
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::Validation(
                "api timeout must be greater than zero".to_owned(),
            ));
        }

        Ok(())
    }
}

/// HTTP adapter for the users, roles, permissions, members and grants services.
#[derive(Debug, Clone)]
pub struct HttpCouncilApi {
    http_client: reqwest::Client,
    config: ApiClientConfig,
}

impl HttpCouncilApi {
    /// Creates an adapter with its own HTTP client.
    pub fn new(config: ApiClientConfig) -> AppResult<Self> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build HTTP client: {error}"))
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<reqwest::RequestBuilder> {
        let endpoint = format!("{}{path}", self.config.base_url);
        let url = Url::parse_with_params(&endpoint, params).map_err(|error| {
            AppError::Validation(format!("invalid endpoint '{endpoint}': {error}"))
        })?;

        let request = self.http_client.request(method, url);
        Ok(match self.config.bearer_token.as_deref() {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        })
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> AppResult<reqwest::Response> {
        let response = request.send().await.map_err(|error| {
            AppError::Transport(format!("failed to call {operation} endpoint: {error}"))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_owned());
        Err(status_error(status, operation, body))
    }

    async fn get_list<T, U>(
        &self,
        path: &str,
        mut params: Vec<(&str, String)>,
        operation: &str,
    ) -> AppResult<Vec<U>>
    where
        T: DeserializeOwned,
        U: From<T>,
    {
        params.push(("PageNumber", "1".to_owned()));
        params.push(("PageSize", self.config.page_size.to_string()));
        let request = self.request(Method::GET, path, &params)?;

        let items = self
            .execute(request, operation)
            .await?
            .json::<ListEnvelope<T>>()
            .await
            .map_err(|error| {
                AppError::Transport(format!(
                    "failed to parse {operation} response body: {error}"
                ))
            })?
            .into_items();

        debug!(operation, count = items.len(), "listed resources");
        Ok(items.into_iter().map(U::from).collect())
    }

    async fn write<B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        operation: &str,
    ) -> AppResult<reqwest::Response>
    where
        B: Serialize + Sync + ?Sized,
    {
        let request = self.request(method, path, &[])?.json(body);
        let response = self.execute(request, operation).await?;

        debug!(operation, "write accepted");
        Ok(response)
    }
}

fn status_error(status: StatusCode, operation: &str, body: String) -> AppError {
    let message = format!(
        "{operation} endpoint returned status {}: {body}",
        status.as_u16()
    );
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::Validation(message)
        }
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
        StatusCode::FORBIDDEN => AppError::Forbidden(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        _ => AppError::Transport(message),
    }
}

#[async_trait]
impl CatalogRepository for HttpCouncilApi {
    async fn list_users(&self, application_id: &str) -> AppResult<Vec<AssignableUser>> {
        self.get_list::<UserDto, AssignableUser>(
            "/api/Users",
            vec![("ApplicationId", application_id.to_owned())],
            "users",
        )
        .await
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.get_list::<RoleDto, Role>("/api/Roles", Vec::new(), "roles")
            .await
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        self.get_list::<PermissionDto, Permission>(
            "/api/Permissions",
            Vec::new(),
            "permissions",
        )
        .await
    }
}

#[async_trait]
impl RoleGrantRepository for HttpCouncilApi {
    async fn list_role_grants(&self, role_id: RoleId) -> AppResult<Vec<RoleGrantRow>> {
        let grants = self
            .get_list::<GrantDto, GrantDto>(
                "/api/RolePermissions",
                vec![("RoleId", role_id.to_string())],
                "role permissions",
            )
            .await?;

        Ok(dto::role_grant_rows(role_id, grants))
    }
}

#[async_trait]
impl MemberRepository for HttpCouncilApi {
    async fn list_members(&self, container: ContainerRef) -> AppResult<Vec<Member>> {
        let routes = ContainerRoutes::for_kind(container.kind);
        let members = self
            .get_list::<MemberDto, MemberDto>(
                routes.members,
                vec![(routes.container_key, container.id.to_string())],
                "members",
            )
            .await?;

        Ok(members
            .into_iter()
            .map(|member| member.into_member(container.id))
            .collect())
    }

    async fn add_members(
        &self,
        container: ContainerRef,
        members: &[NewMemberInput],
    ) -> AppResult<()> {
        let routes = ContainerRoutes::for_kind(container.kind);
        let body: Vec<_> = members
            .iter()
            .map(|member| {
                dto::new_member_body(
                    routes.container_key,
                    member.container_id,
                    &member.user_id,
                    member.role_id,
                )
            })
            .collect();

        self.write(
            Method::POST,
            routes.member_batch.as_str(),
            &body,
            "member batch create",
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MemberPermissionRepository for HttpCouncilApi {
    async fn list_member_permissions(
        &self,
        kind: ContainerKind,
        member_id: MemberId,
        role_id: RoleId,
    ) -> AppResult<PermissionSet> {
        let routes = ContainerRoutes::for_kind(kind);
        let grants = self
            .get_list::<GrantDto, GrantDto>(
                routes.member_permissions,
                vec![
                    ("MemberId", member_id.to_string()),
                    ("RoleId", role_id.to_string()),
                ],
                "member role permissions",
            )
            .await?;

        Ok(dto::granted_permissions(grants))
    }

    async fn create_member_permissions(
        &self,
        kind: ContainerKind,
        input: CreateMemberPermissionsInput,
    ) -> AppResult<()> {
        let routes = ContainerRoutes::for_kind(kind);
        let body = CreateMemberPermissionsBody {
            member_id: input.member_id.value(),
            role_id: input.role_id.value(),
            permissions_ids: input.permission_ids.iter().map(|id| id.value()).collect(),
        };

        self.write(
            Method::POST,
            routes.member_permissions,
            &body,
            "member role permissions create",
        )
        .await?;
        Ok(())
    }

    async fn update_member_permissions(
        &self,
        kind: ContainerKind,
        input: UpdateMemberPermissionsInput,
    ) -> AppResult<()> {
        let routes = ContainerRoutes::for_kind(kind);
        let body = UpdateMemberPermissionsBody {
            member_id: input.member_id.value(),
            role_id: input.role_id.value(),
            added: input
                .added
                .map(|ids| ids.iter().map(|id| id.value()).collect()),
            deleted: input
                .deleted
                .map(|ids| ids.iter().map(|id| id.value()).collect()),
        };

        self.write(
            Method::PUT,
            routes.member_permissions,
            &body,
            "member role permissions update",
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ContainerRepository for HttpCouncilApi {
    async fn create_container(
        &self,
        kind: ContainerKind,
        input: &ContainerInput,
    ) -> AppResult<ContainerId> {
        let routes = ContainerRoutes::for_kind(kind);
        let response = self
            .write(
                Method::POST,
                routes.containers,
                &container_body(input),
                "container create",
            )
            .await?;

        response
            .json::<CreatedId>()
            .await
            .map(CreatedId::into_container_id)
            .map_err(|error| {
                AppError::Transport(format!(
                    "failed to parse container create response body: {error}"
                ))
            })
    }

    async fn update_container(
        &self,
        container: ContainerRef,
        input: &ContainerInput,
    ) -> AppResult<()> {
        let routes = ContainerRoutes::for_kind(container.kind);
        self.write(
            Method::PUT,
            format!("{}/{}", routes.containers, container.id).as_str(),
            &container_body(input),
            "container update",
        )
        .await?;
        Ok(())
    }
}

fn container_body(input: &ContainerInput) -> ContainerBody<'_> {
    ContainerBody {
        name_ar: input.name.arabic.as_str(),
        name_en: input.name.english.as_str(),
        description: input.description.as_deref(),
    }
}
