//! Roles client models

pub mod permission;
pub mod role;
pub mod warning;

// Re-export for convenience
pub use permission::{
    PermissionLevel, PermissionMatrix, PermissionScope, PermissionScopeType, RolePermissionEntry,
};
pub use role::{NewRole, RoleDetail, RoleSummary, UpdateRole};
pub use warning::{SoDWarning, WarningSeverity};
