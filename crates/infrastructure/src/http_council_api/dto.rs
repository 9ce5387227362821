//! Wire shapes returned by the committee and council services.
//!
//! Field casing differs between endpoint versions, so every field accepts its
//! camelCase and PascalCase spelling. Everything is converted to domain types
//! here; nothing past this module sees wire casing.

use quorum_core::{ContainerId, LocalizedName, MemberId, PermissionId, RoleId, UserId};
use quorum_domain::{AssignableUser, Member, Permission, PermissionSet, Role, RoleGrantRow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// List response, either a bare array or an envelope around one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped(WrappedList<T>),
}

#[derive(Debug, Deserialize)]
pub(super) struct WrappedList<T> {
    #[serde(
        alias = "Items",
        alias = "data",
        alias = "Data",
        alias = "result",
        alias = "Result"
    )]
    items: Vec<T>,
}

impl<T> ListEnvelope<T> {
    pub(super) fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) => items,
            Self::Wrapped(list) => list.items,
        }
    }
}

/// Identifier that may arrive as a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum FlexibleId {
    Number(i64),
    Text(String),
}

impl FlexibleId {
    fn into_user_id(self) -> UserId {
        match self {
            Self::Number(value) => UserId::new(value.to_string()),
            Self::Text(value) => UserId::new(value),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct IdRef {
    #[serde(alias = "Id")]
    id: i64,
}

/// Identifier returned by a create call.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum CreatedId {
    Bare(i64),
    Object(IdRef),
    Nested {
        #[serde(alias = "Data")]
        data: IdRef,
    },
}

impl CreatedId {
    pub(super) fn into_container_id(self) -> ContainerId {
        match self {
            Self::Bare(id) => ContainerId::new(id),
            Self::Object(reference) | Self::Nested { data: reference } => {
                ContainerId::new(reference.id)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserDto {
    #[serde(alias = "Id", alias = "userId", alias = "UserId")]
    id: FlexibleId,
    #[serde(default, alias = "NameAr", alias = "fullNameAr", alias = "FullNameAr")]
    name_ar: Option<String>,
    #[serde(default, alias = "NameEn", alias = "fullNameEn", alias = "FullNameEn")]
    name_en: Option<String>,
    #[serde(default, alias = "Email")]
    email: Option<String>,
}

impl From<UserDto> for AssignableUser {
    fn from(value: UserDto) -> Self {
        Self {
            id: value.id.into_user_id(),
            name: localized(value.name_ar, value.name_en),
            email: value.email.filter(|email| !email.trim().is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RoleDto {
    #[serde(alias = "Id", alias = "roleId", alias = "RoleId")]
    id: i64,
    #[serde(default, alias = "NameAr")]
    name_ar: Option<String>,
    #[serde(default, alias = "NameEn")]
    name_en: Option<String>,
}

impl From<RoleDto> for Role {
    fn from(value: RoleDto) -> Self {
        Self {
            id: RoleId::new(value.id),
            name: localized(value.name_ar, value.name_en),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PermissionDto {
    #[serde(alias = "Id", alias = "permissionId", alias = "PermissionId")]
    id: i64,
    #[serde(default, alias = "NameAr")]
    name_ar: Option<String>,
    #[serde(default, alias = "NameEn")]
    name_en: Option<String>,
    #[serde(default, alias = "Description", alias = "descriptionEn", alias = "DescriptionEn")]
    description: Option<String>,
}

impl From<PermissionDto> for Permission {
    fn from(value: PermissionDto) -> Self {
        Self {
            id: PermissionId::new(value.id),
            name: localized(value.name_ar, value.name_en),
            description: value
                .description
                .filter(|description| !description.trim().is_empty()),
        }
    }
}

/// Grant row for a role or a member.
///
/// Either flat (`permissionId` plus a granted flag), nested
/// (`permission.id`), or a parent row carrying a `permissions` array of IDs
/// or further grant rows. A missing granted flag means granted. A bare `id`
/// names the permission only inside a `permissions` array; on a top-level row
/// it is the row's own identifier.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GrantDto {
    #[serde(default, alias = "Id")]
    id: Option<i64>,
    #[serde(default, alias = "PermissionId")]
    permission_id: Option<i64>,
    #[serde(default, alias = "Permission")]
    permission: Option<IdRef>,
    #[serde(
        default,
        alias = "IsGranted",
        alias = "granted",
        alias = "Granted",
        alias = "hasPermission",
        alias = "HasPermission"
    )]
    is_granted: Option<bool>,
    #[serde(
        default,
        alias = "Permissions",
        alias = "permissionsIds",
        alias = "PermissionsIds"
    )]
    permissions: Option<Vec<GrantEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum GrantEntry {
    Id(i64),
    Grant(GrantDto),
}

impl GrantDto {
    fn collect(self, rows: &mut Vec<(PermissionId, bool)>, nested: bool) {
        let is_granted = self.is_granted.unwrap_or(true);
        let permission_id = self
            .permission_id
            .or(self.permission.map(|reference| reference.id))
            .or(self.id.filter(|_| nested));
        if let Some(permission_id) = permission_id {
            rows.push((PermissionId::new(permission_id), is_granted));
        }

        for entry in self.permissions.unwrap_or_default() {
            match entry {
                GrantEntry::Id(permission_id) => {
                    rows.push((PermissionId::new(permission_id), true));
                }
                GrantEntry::Grant(grant) => grant.collect(rows, true),
            }
        }
    }
}

/// Flattens role grant DTOs into rows for one role.
pub(super) fn role_grant_rows(role_id: RoleId, grants: Vec<GrantDto>) -> Vec<RoleGrantRow> {
    let mut rows = Vec::new();
    for grant in grants {
        grant.collect(&mut rows, false);
    }

    rows.into_iter()
        .map(|(permission_id, is_granted)| RoleGrantRow {
            role_id,
            permission_id,
            is_granted,
        })
        .collect()
}

/// Reduces member grant DTOs to the set of granted permissions.
pub(super) fn granted_permissions(grants: Vec<GrantDto>) -> PermissionSet {
    let mut rows = Vec::new();
    for grant in grants {
        grant.collect(&mut rows, false);
    }

    rows.into_iter()
        .filter(|(_, is_granted)| *is_granted)
        .map(|(permission_id, _)| permission_id)
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MemberDto {
    #[serde(
        alias = "Id",
        alias = "memberId",
        alias = "MemberId",
        alias = "committeeMemberId",
        alias = "CommitteeMemberId",
        alias = "councilMemberId",
        alias = "CouncilMemberId"
    )]
    id: i64,
    #[serde(alias = "UserId")]
    user_id: FlexibleId,
    #[serde(default, alias = "RoleId")]
    role_id: Option<i64>,
    #[serde(
        default,
        alias = "committeeId",
        alias = "CommitteeId",
        alias = "councilId",
        alias = "CouncilId",
        alias = "ContainerId"
    )]
    container_id: Option<i64>,
}

impl MemberDto {
    pub(super) fn into_member(self, requested: ContainerId) -> Member {
        Member {
            id: MemberId::new(self.id),
            container_id: self.container_id.map_or(requested, ContainerId::new),
            user_id: self.user_id.into_user_id(),
            role_id: self.role_id.map(RoleId::new),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct ContainerBody<'a> {
    pub name_ar: &'a str,
    pub name_en: &'a str,
    pub description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct CreateMemberPermissionsBody {
    pub member_id: i64,
    pub role_id: i64,
    pub permissions_ids: Vec<i64>,
}

/// Empty lists are sent as `null`; the service reads an empty list as
/// "change to empty".
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct UpdateMemberPermissionsBody {
    pub member_id: i64,
    pub role_id: i64,
    pub added: Option<Vec<i64>>,
    pub deleted: Option<Vec<i64>>,
}

/// Builds one batch member entry keyed by the container's foreign key name.
pub(super) fn new_member_body(
    container_key: &str,
    container_id: ContainerId,
    user_id: &UserId,
    role_id: RoleId,
) -> Value {
    let mut body = Map::new();
    body.insert(container_key.to_owned(), Value::from(container_id.value()));
    body.insert("UserId".to_owned(), user_id_value(user_id));
    body.insert("RoleId".to_owned(), Value::from(role_id.value()));
    Value::Object(body)
}

/// Sends numeric user identities as JSON numbers.
fn user_id_value(user_id: &UserId) -> Value {
    user_id
        .as_str()
        .parse::<i64>()
        .map_or_else(|_| Value::from(user_id.as_str()), Value::from)
}

fn localized(arabic: Option<String>, english: Option<String>) -> LocalizedName {
    LocalizedName::new(arabic.unwrap_or_default(), english.unwrap_or_default())
}
