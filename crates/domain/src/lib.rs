//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod catalog;
mod draft;
mod membership;
mod permission_diff;

pub use catalog::{
    AssignableUser, Permission, PermissionSet, Role, RoleGrantRow, granted_permission_ids,
};
pub use draft::{DraftMember, LoadedMemberState, PermissionState};
pub use membership::{ContainerKind, ContainerRef, Member, NewMemberInput};
pub use permission_diff::PermissionDiff;
