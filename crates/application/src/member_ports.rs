mod catalog;
mod containers;
mod members;
mod permissions;

pub use catalog::{CatalogRepository, RoleGrantRepository};
pub use containers::{ContainerInput, ContainerRepository};
pub use members::MemberRepository;
pub use permissions::{
    CreateMemberPermissionsInput, MemberPermissionRepository, UpdateMemberPermissionsInput,
};
