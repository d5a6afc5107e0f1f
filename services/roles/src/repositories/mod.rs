//! Repositories for the roles REST endpoints

pub mod role;

pub use role::{RoleRepository, SaveOutcome};
