//! Permission grant model: levels, scopes and per-action entries

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Access level granted for one action, ordered `none < view < edit < approve`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    #[default]
    None,
    View,
    Edit,
    Approve,
}

impl PermissionLevel {
    pub const ALL: [PermissionLevel; 4] = [
        PermissionLevel::None,
        PermissionLevel::View,
        PermissionLevel::Edit,
        PermissionLevel::Approve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::None => "none",
            PermissionLevel::View => "view",
            PermissionLevel::Edit => "edit",
            PermissionLevel::Approve => "approve",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which records a granted permission applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScopeType {
    #[default]
    All,
    OwnDepartment,
    OwnCreated,
    SelectedAccounts,
}

impl PermissionScopeType {
    pub const ALL: [PermissionScopeType; 4] = [
        PermissionScopeType::All,
        PermissionScopeType::OwnDepartment,
        PermissionScopeType::OwnCreated,
        PermissionScopeType::SelectedAccounts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionScopeType::All => "all",
            PermissionScopeType::OwnDepartment => "own_department",
            PermissionScopeType::OwnCreated => "own_created",
            PermissionScopeType::SelectedAccounts => "selected_accounts",
        }
    }
}

impl fmt::Display for PermissionScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope of a grant
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionScope {
    #[serde(rename = "type", default)]
    pub scope_type: PermissionScopeType,
    /// Only meaningful for `selected_accounts`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_ids: Option<Vec<i64>>,
}

impl PermissionScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn selected_accounts(account_ids: Vec<i64>) -> Self {
        Self {
            scope_type: PermissionScopeType::SelectedAccounts,
            account_ids: Some(account_ids),
        }
    }

    /// Change the scope type, dropping account ids unless the new type uses them
    pub fn with_type(self, scope_type: PermissionScopeType) -> Self {
        let account_ids = match scope_type {
            PermissionScopeType::SelectedAccounts => Some(self.account_ids.unwrap_or_default()),
            _ => None,
        };
        Self {
            scope_type,
            account_ids,
        }
    }

    /// Account ids, empty unless the scope is `selected_accounts`
    pub fn accounts(&self) -> &[i64] {
        match (self.scope_type, &self.account_ids) {
            (PermissionScopeType::SelectedAccounts, Some(ids)) => ids,
            _ => &[],
        }
    }
}

/// Grant for a single action
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RolePermissionEntry {
    #[serde(default)]
    pub level: PermissionLevel,
    #[serde(default)]
    pub scope: PermissionScope,
}

impl RolePermissionEntry {
    pub fn new(level: PermissionLevel, scope: PermissionScope) -> Self {
        Self { level, scope }
    }

    /// True for entries that grant something
    pub fn is_granted(&self) -> bool {
        self.level > PermissionLevel::None
    }
}

/// A role's grants keyed by action id
pub type PermissionMatrix = BTreeMap<String, RolePermissionEntry>;
