//! Input parsing, normalisation and validation for role edits

use tracing::warn;

use crate::models::{PermissionMatrix, RolePermissionEntry};
use crate::registry::{PERMISSIONS, is_known_action};

/// Maximum length of a role label
pub const MAX_LABEL_LENGTH: usize = 128;

/// Parse a free-text account list such as `"12, 15abc, 19"`.
///
/// Tokens are split on commas and whitespace. Each token is read as a
/// number; unparsable and non-finite tokens are dropped, fractional values
/// are truncated toward zero. Order and duplicates are preserved.
pub fn parse_account_ids(text: &str) -> Vec<i64> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .map(|value| value.trunc() as i64)
        .collect()
}

/// Render account ids back into the free-text form
pub fn format_account_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Materialise every catalog action in `permissions`.
///
/// Absent actions get an explicit `none` over `all`. Entries for actions
/// outside the catalog are dropped, since the client may never send them.
pub fn normalize_permissions(mut permissions: PermissionMatrix) -> PermissionMatrix {
    permissions.retain(|action, _| {
        let known = is_known_action(action);
        if !known {
            warn!("Dropping grant for unknown action {}", action);
        }
        known
    });

    for spec in PERMISSIONS {
        permissions
            .entry(spec.action.to_string())
            .or_insert_with(RolePermissionEntry::default);
    }
    permissions
}

/// Validate role label
pub fn validate_role_label(label: &str) -> Result<(), String> {
    let label = label.trim();

    if label.is_empty() {
        return Err("Role name is required".to_string());
    }

    if label.chars().count() > MAX_LABEL_LENGTH {
        return Err(format!(
            "Role name must be at most {} characters long",
            MAX_LABEL_LENGTH
        ));
    }

    Ok(())
}

/// Validate that only catalog actions are about to be sent
pub fn validate_permissions(permissions: &PermissionMatrix) -> Result<(), String> {
    let unknown: Vec<&str> = permissions
        .keys()
        .map(|action| action.as_str())
        .filter(|action| !is_known_action(action))
        .collect();

    if !unknown.is_empty() {
        return Err(format!("Unknown permission actions: {}", unknown.join(", ")));
    }

    Ok(())
}
