//! Role-based permission client for Clover Books
//!
//! The permission catalog, the role data model, the REST repository for
//! `/api/settings/roles/`, a fail-soft store over it and the editor state
//! machine that drives the roles settings screen.

pub mod editor;
pub mod error;
pub mod models;
pub mod registry;
pub mod repositories;
pub mod store;
pub mod validation;

pub use editor::{EditorState, PermissionRow, RoleEditor};
pub use error::{EditorError, EditorResult};
pub use registry::{PERMISSIONS, PermissionCategory, PermissionSpec};
pub use repositories::{RoleRepository, SaveOutcome};
pub use store::{RolesState, RolesStore, SaveResult};
