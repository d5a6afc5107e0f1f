//! Role repository for the settings REST endpoints

use common::{ApiClient, ClientResult};
use tracing::{info, warn};

use crate::models::role::{RoleEnvelope, RoleListResponse, SaveRoleResponse};
use crate::models::{NewRole, RoleDetail, RoleSummary, SoDWarning, UpdateRole};

const ROLES_PATH: &str = "/api/settings/roles/";

/// Result of a `PATCH` that the server did not reject outright
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Accepted; `role` is the server's canonical copy
    Saved {
        role: RoleDetail,
        warnings: Vec<SoDWarning>,
    },
    /// 409: segregation-of-duties conflicts need an explicit override
    Conflict { warnings: Vec<SoDWarning> },
}

/// Role repository
#[derive(Clone)]
pub struct RoleRepository {
    client: ApiClient,
}

impl RoleRepository {
    /// Create a new role repository
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn role_path(id: i64) -> String {
        format!("{}{}/", ROLES_PATH, id)
    }

    /// List all roles
    pub async fn list(&self) -> ClientResult<Vec<RoleSummary>> {
        let response = self.client.get(ROLES_PATH).await?.error_for_status()?;
        let list: RoleListResponse = serde_json::from_value(response.body)?;
        Ok(list.roles)
    }

    /// Fetch one role with its permissions
    pub async fn get(&self, id: i64) -> ClientResult<RoleDetail> {
        info!("Fetching role {}", id);

        let response = self
            .client
            .get(&Self::role_path(id))
            .await?
            .error_for_status()?;
        let envelope: RoleEnvelope<RoleDetail> = serde_json::from_value(response.body)?;
        Ok(envelope.role)
    }

    /// Create a role, optionally cloning another role's permissions
    pub async fn create(&self, new_role: &NewRole) -> ClientResult<RoleSummary> {
        info!(
            "Creating role {} (clone from {:?})",
            new_role.label, new_role.clone_from_id
        );

        let response = self
            .client
            .post(ROLES_PATH, new_role)
            .await?
            .error_for_status()?;
        let envelope: RoleEnvelope<RoleSummary> = serde_json::from_value(response.body)?;
        Ok(envelope.role)
    }

    /// Update a role's label and permissions
    pub async fn update(&self, id: i64, update: &UpdateRole) -> ClientResult<SaveOutcome> {
        info!(
            "Saving role {} (ignore_warnings={})",
            id, update.ignore_warnings
        );

        let response = self.client.patch(&Self::role_path(id), update).await?;

        if response.status.as_u16() == 409 {
            let warnings: Vec<SoDWarning> = response
                .field::<Option<Vec<SoDWarning>>>("warnings")?
                .unwrap_or_default();
            warn!(
                "Role {} rejected with {} segregation-of-duties warning(s)",
                id,
                warnings.len()
            );
            return Ok(SaveOutcome::Conflict { warnings });
        }

        let response = response.error_for_status()?;
        let saved: SaveRoleResponse = serde_json::from_value(response.body)?;
        Ok(SaveOutcome::Saved {
            role: saved.role,
            warnings: saved.warnings,
        })
    }

    /// Delete a role
    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        info!("Deleting role {}", id);

        self.client
            .delete(&Self::role_path(id))
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_path() {
        assert_eq!(RoleRepository::role_path(42), "/api/settings/roles/42/");
    }
}
