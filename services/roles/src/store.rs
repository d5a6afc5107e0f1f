//! Fail-soft role store
//!
//! Holds the role list, the role being edited and the status flags a
//! settings screen renders. No operation returns an error: failures are
//! recorded in `RolesState::error` and segregation-of-duties conflicts in
//! `RolesState::warnings`, so callers always stay usable.
//!
//! Every commit to `active_role` is tied to a selection ticket. A response
//! whose ticket has been superseded by a newer selection is discarded, so
//! the most recently requested role always wins.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::models::{NewRole, RoleDetail, RoleSummary, SoDWarning, UpdateRole};
use crate::repositories::{RoleRepository, SaveOutcome};
use crate::validation::{validate_permissions, validate_role_label};

/// Snapshot of the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RolesState {
    pub roles: Vec<RoleSummary>,
    pub active_role: Option<RoleDetail>,
    pub loading_roles: bool,
    pub loading_role: bool,
    pub saving_role: bool,
    pub warnings: Vec<SoDWarning>,
    pub error: Option<String>,
}

/// Result of `save_role`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveResult {
    pub ok: bool,
    pub warnings: Vec<SoDWarning>,
    /// The server answered 409 and an override is possible
    pub conflict: bool,
}

impl SaveResult {
    fn failed() -> Self {
        Self::default()
    }
}

/// Latest selection: the ticket a commit must still hold, and the role it is for
#[derive(Debug, Default)]
struct Selection {
    ticket: u64,
    role_id: Option<i64>,
}

impl Selection {
    fn advance(&mut self, role_id: Option<i64>) -> u64 {
        self.ticket += 1;
        self.role_id = role_id;
        self.ticket
    }
}

/// Role store
#[derive(Clone)]
pub struct RolesStore {
    repository: RoleRepository,
    state: Arc<Mutex<RolesState>>,
    selection: Arc<Mutex<Selection>>,
}

impl RolesStore {
    /// Create a new, empty store
    pub fn new(repository: RoleRepository) -> Self {
        Self {
            repository,
            state: Arc::new(Mutex::new(RolesState::default())),
            selection: Arc::new(Mutex::new(Selection::default())),
        }
    }

    pub async fn snapshot(&self) -> RolesState {
        self.state.lock().await.clone()
    }

    pub async fn roles(&self) -> Vec<RoleSummary> {
        self.state.lock().await.roles.clone()
    }

    pub async fn active_role(&self) -> Option<RoleDetail> {
        self.state.lock().await.active_role.clone()
    }

    pub async fn warnings(&self) -> Vec<SoDWarning> {
        self.state.lock().await.warnings.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.lock().await.error = None;
    }

    /// Surface a locally detected failure
    pub async fn record_error(&self, message: impl Into<String>) {
        self.state.lock().await.error = Some(message.into());
    }

    /// Reload the role list
    pub async fn refresh_roles(&self) {
        {
            let mut state = self.state.lock().await;
            state.loading_roles = true;
            state.error = None;
        }

        let result = self.repository.list().await;

        let mut state = self.state.lock().await;
        state.loading_roles = false;
        match result {
            Ok(roles) => {
                info!("Loaded {} roles", roles.len());
                state.roles = roles;
            }
            Err(e) => {
                error!("Failed to load roles: {}", e);
                state.error = Some(e.user_message());
            }
        }
    }

    /// Load a role's detail and make it the active role
    pub async fn load_role(&self, id: i64) {
        self.fetch_role(id, true).await;
    }

    async fn fetch_role(&self, id: i64, clear_error: bool) {
        let ticket = self.selection.lock().await.advance(Some(id));
        {
            let mut state = self.state.lock().await;
            state.loading_role = true;
            if clear_error {
                state.error = None;
            }
        }

        let result = self.repository.get(id).await;

        let mut state = self.state.lock().await;
        if self.selection.lock().await.ticket != ticket {
            warn!("Discarding stale response for role {}", id);
            return;
        }

        state.loading_role = false;
        match result {
            Ok(mut role) => {
                role.normalize();
                state.active_role = Some(role);
                state.warnings.clear();
            }
            Err(e) => {
                error!("Failed to load role {}: {}", id, e);
                state.error = Some(e.user_message());
            }
        }
    }

    /// Create a role, then refresh the list and select it
    pub async fn create_role(
        &self,
        label: &str,
        clone_from_id: Option<i64>,
    ) -> Option<RoleSummary> {
        if let Err(message) = validate_role_label(label) {
            self.state.lock().await.error = Some(message);
            return None;
        }

        {
            let mut state = self.state.lock().await;
            state.saving_role = true;
            state.error = None;
        }

        let new_role = NewRole {
            label: label.trim().to_string(),
            clone_from_id,
        };
        let result = self.repository.create(&new_role).await;

        self.state.lock().await.saving_role = false;
        match result {
            Ok(created) => {
                info!("Created role {} ({})", created.id, created.key);
                self.refresh_roles().await;
                // Keep a failed refresh visible
                self.fetch_role(created.id, false).await;
                Some(created)
            }
            Err(e) => {
                error!("Failed to create role: {}", e);
                self.state.lock().await.error = Some(e.user_message());
                None
            }
        }
    }

    /// Send `role` to the server.
    ///
    /// A 409 is not a failure of the call: the server's warnings are stored
    /// and returned, and `active_role` is left as it was. Resubmitting with
    /// `ignore_warnings` overrides them.
    pub async fn save_role(&self, role: &RoleDetail, ignore_warnings: bool) -> SaveResult {
        if let Err(message) =
            validate_role_label(role.label()).and_then(|_| validate_permissions(&role.permissions))
        {
            self.state.lock().await.error = Some(message);
            return SaveResult::failed();
        }

        let ticket = self.selection.lock().await.ticket;
        {
            let mut state = self.state.lock().await;
            state.saving_role = true;
            state.error = None;
        }

        let outcome = self
            .repository
            .update(role.id(), &UpdateRole::from_role(role, ignore_warnings))
            .await;

        let result = {
            let mut state = self.state.lock().await;
            state.saving_role = false;

            match outcome {
                Ok(SaveOutcome::Saved {
                    role: mut saved,
                    warnings,
                }) => {
                    let mut selection = self.selection.lock().await;
                    if selection.ticket == ticket {
                        selection.advance(Some(role.id()));
                        saved.normalize();
                        state.active_role = Some(saved);
                        state.loading_role = false;
                        state.warnings = warnings.clone();
                    } else {
                        warn!(
                            "Role {} saved after another role was selected; keeping the selection",
                            role.id()
                        );
                    }
                    SaveResult {
                        ok: true,
                        warnings,
                        conflict: false,
                    }
                }
                Ok(SaveOutcome::Conflict { warnings }) => {
                    state.warnings = warnings.clone();
                    SaveResult {
                        ok: false,
                        warnings,
                        conflict: true,
                    }
                }
                Err(e) => {
                    error!("Failed to save role {}: {}", role.id(), e);
                    state.warnings.clear();
                    state.error = Some(e.user_message());
                    SaveResult::failed()
                }
            }
        };

        if result.ok {
            self.refresh_roles().await;
        }
        result
    }

    /// Delete a role; returns whether the server accepted
    pub async fn delete_role(&self, id: i64) -> bool {
        self.state.lock().await.error = None;

        if let Err(e) = self.repository.delete(id).await {
            error!("Failed to delete role {}: {}", id, e);
            self.state.lock().await.error = Some(e.user_message());
            return false;
        }

        {
            let mut state = self.state.lock().await;
            let mut selection = self.selection.lock().await;
            // Only a pending load of the deleted role is cancelled
            if selection.role_id == Some(id) {
                selection.advance(None);
                state.loading_role = false;
            }
            if state.active_role.as_ref().map(|r| r.id()) == Some(id) {
                state.active_role = None;
                state.warnings.clear();
            }
        }

        self.refresh_roles().await;
        true
    }

    /// Replace the local copy of the active role without a network call.
    ///
    /// Warnings from an earlier save no longer describe the edited role and
    /// are cleared.
    pub async fn set_active_role(&self, role: Option<RoleDetail>) {
        let mut state = self.state.lock().await;
        state.active_role = role;
        state.warnings.clear();
    }

    /// Edit the local copy of the active role in place; false if none is active
    pub async fn update_active_role<F>(&self, edit: F) -> bool
    where
        F: FnOnce(&mut RoleDetail),
    {
        let mut state = self.state.lock().await;
        match state.active_role.as_mut() {
            Some(role) => {
                edit(role);
                state.warnings.clear();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ApiClient, ApiConfig};
    use serde_json::json;

    fn offline_store() -> RolesStore {
        // Port 9 (discard) is not served; no test here reaches the network
        let client = ApiClient::new(&ApiConfig::new("http://127.0.0.1:9")).unwrap();
        RolesStore::new(RoleRepository::new(client))
    }

    fn role(id: i64) -> RoleDetail {
        serde_json::from_value(json!({
            "id": id, "key": format!("role_{id}"), "label": format!("Role {id}")
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_local_edits_clear_warnings() {
        let store = offline_store();
        store.set_active_role(Some(role(2))).await;
        store.state.lock().await.warnings = vec![
            serde_json::from_value(json!({
                "id": "w1", "severity": "high", "message": "conflict",
                "actions": ["invoices.create", "invoices.approve"]
            }))
            .unwrap(),
        ];

        let edited = store
            .update_active_role(|r| r.summary.label = "Renamed".to_string())
            .await;

        assert!(edited);
        assert!(store.warnings().await.is_empty());
        assert_eq!(store.active_role().await.unwrap().label(), "Renamed");
    }

    #[tokio::test]
    async fn test_update_without_active_role() {
        let store = offline_store();
        assert!(!store.update_active_role(|_| {}).await);
    }

    #[tokio::test]
    async fn test_invalid_save_never_reaches_server() {
        let store = offline_store();
        let mut bad = role(3);
        bad.summary.label = "  ".to_string();

        let result = store.save_role(&bad, false).await;

        assert_eq!(result, SaveResult::failed());
        assert_eq!(store.error().await.as_deref(), Some("Role name is required"));
        assert!(!store.snapshot().await.saving_role);
    }

    #[tokio::test]
    async fn test_unknown_action_is_rejected_before_sending() {
        let store = offline_store();
        let mut bad = role(3);
        bad.permissions
            .insert("payroll.run".to_string(), Default::default());

        let result = store.save_role(&bad, false).await;

        assert!(!result.ok);
        assert!(store.error().await.unwrap().contains("payroll.run"));
    }

    #[tokio::test]
    async fn test_network_failure_is_captured() {
        let store = offline_store();
        store.refresh_roles().await;

        let state = store.snapshot().await;
        assert!(!state.loading_roles);
        assert!(state.roles.is_empty());
        assert!(state.error.unwrap().starts_with("Network error"));
    }
}
