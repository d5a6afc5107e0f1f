//! Role model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::permission::{PermissionMatrix, RolePermissionEntry};
use super::warning::SoDWarning;
use crate::validation::normalize_permissions;

/// Role as listed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub id: i64,
    /// Immutable identifier
    pub key: String,
    /// Editable display name
    pub label: String,
    #[serde(default)]
    pub is_builtin: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Role with its full permission matrix, fetched per selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDetail {
    #[serde(flatten)]
    pub summary: RoleSummary,
    #[serde(default)]
    pub permissions: PermissionMatrix,
    /// Actions filled in with the default grant and not touched since
    #[serde(skip)]
    defaulted: BTreeSet<String>,
}

impl RoleDetail {
    pub fn id(&self) -> i64 {
        self.summary.id
    }

    pub fn key(&self) -> &str {
        &self.summary.key
    }

    pub fn label(&self) -> &str {
        &self.summary.label
    }

    pub fn is_builtin(&self) -> bool {
        self.summary.is_builtin
    }

    /// Grant for `action`; absent entries read as `none` over `all`
    pub fn entry(&self, action: &str) -> RolePermissionEntry {
        self.permissions.get(action).cloned().unwrap_or_default()
    }

    /// Mutable grant for `action`, materialising the default if absent.
    ///
    /// The action counts as touched and is sent on the next save.
    pub fn entry_mut(&mut self, action: &str) -> &mut RolePermissionEntry {
        self.defaulted.remove(action);
        self.permissions.entry(action.to_string()).or_default()
    }

    /// Materialise every catalog action, remembering which ones the server
    /// did not deliver
    pub fn normalize(&mut self) {
        let permissions = std::mem::take(&mut self.permissions);
        let delivered: BTreeSet<String> = permissions.keys().cloned().collect();

        self.permissions = normalize_permissions(permissions);
        self.defaulted = self
            .permissions
            .keys()
            .filter(|action| !delivered.contains(*action))
            .cloned()
            .collect();
    }

    /// Whether `action` only holds the client-side default
    pub fn is_defaulted(&self, action: &str) -> bool {
        self.defaulted.contains(action)
    }

    /// Grants the server delivered plus those edited locally
    pub fn explicit_permissions(&self) -> PermissionMatrix {
        self.permissions
            .iter()
            .filter(|(action, _)| !self.defaulted.contains(*action))
            .map(|(action, entry)| (action.clone(), entry.clone()))
            .collect()
    }
}

/// Role creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRole {
    pub label: String,
    /// Role whose permissions the new role starts from
    pub clone_from_id: Option<i64>,
}

/// Role update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRole {
    pub label: String,
    pub permissions: PermissionMatrix,
    pub ignore_warnings: bool,
}

impl UpdateRole {
    pub fn from_role(role: &RoleDetail, ignore_warnings: bool) -> Self {
        Self {
            label: role.summary.label.clone(),
            permissions: role.explicit_permissions(),
            ignore_warnings,
        }
    }
}

/// `GET /api/settings/roles/` body
#[derive(Debug, Deserialize)]
pub struct RoleListResponse {
    #[serde(default)]
    pub roles: Vec<RoleSummary>,
}

/// `{ "role": ... }` envelope used by detail and create responses
#[derive(Debug, Deserialize)]
pub struct RoleEnvelope<T> {
    pub role: T,
}

/// Successful `PATCH` body
#[derive(Debug, Deserialize)]
pub struct SaveRoleResponse {
    pub role: RoleDetail,
    #[serde(default)]
    pub warnings: Vec<SoDWarning>,
}
