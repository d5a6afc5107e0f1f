//! Custom error types for the role editor

use thiserror::Error;

/// Local editor error; network failures are reported through the store state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Action is not part of the permission catalog
    #[error("Unknown permission action: {0}")]
    UnknownAction(String),

    /// No role is selected
    #[error("No role selected")]
    NoActiveRole,

    /// Built-in roles cannot be deleted
    #[error("Built-in role {0} cannot be deleted")]
    BuiltinRole(String),

    /// "Save anyway" is only offered after a conflict
    #[error("No segregation-of-duties warnings to override")]
    NotWarned,
}

/// Type alias for editor results
pub type EditorResult<T> = Result<T, EditorError>;
