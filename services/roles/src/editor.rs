//! Role editor
//!
//! Drives one settings screen on top of a [`RolesStore`]: tracks which
//! category is open, the free-text account lists as typed, the last
//! server-confirmed copy of the role and the screen state.
//!
//! ```text
//! Idle -> Loading -> Loaded -> Editing -> Saving -> Loaded
//!                                              \-> Warned -> (save_anyway) -> Saving
//!                                              \-> Errored
//! ```

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::error::{EditorError, EditorResult};
use crate::models::{
    PermissionLevel, PermissionScope, PermissionScopeType, RoleDetail, RolePermissionEntry,
    RoleSummary, SoDWarning,
};
use crate::registry::{
    PermissionCategory, PermissionSpec, find_permission, permissions_by_category,
};
use crate::store::{RolesStore, SaveResult};
use crate::validation::{format_account_ids, parse_account_ids};

/// Screen state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Editing,
    Saving,
    /// Server reported segregation-of-duties conflicts; "save anyway" is offered
    Warned,
    Errored,
}

/// One rendered line of the permission matrix
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionRow {
    pub spec: &'static PermissionSpec,
    pub entry: RolePermissionEntry,
    /// Account list as typed, or as formatted from the grant
    pub account_ids_text: String,
}

impl PermissionRow {
    /// Whether the account list input applies to this row
    pub fn shows_accounts(&self) -> bool {
        self.entry.scope.scope_type == PermissionScopeType::SelectedAccounts
    }
}

/// Role editor
pub struct RoleEditor {
    store: RolesStore,
    state: EditorState,
    category: PermissionCategory,
    saved_role: Option<RoleDetail>,
    account_inputs: HashMap<String, String>,
}

impl RoleEditor {
    /// Create an idle editor over `store`
    pub fn new(store: RolesStore) -> Self {
        Self {
            store,
            state: EditorState::Idle,
            category: PermissionCategory::Bank,
            saved_role: None,
            account_inputs: HashMap::new(),
        }
    }

    pub fn store(&self) -> &RolesStore {
        &self.store
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn category(&self) -> PermissionCategory {
        self.category
    }

    /// Last server-confirmed copy of the role being edited
    pub fn saved_role(&self) -> Option<&RoleDetail> {
        self.saved_role.as_ref()
    }

    pub async fn warnings(&self) -> Vec<SoDWarning> {
        self.store.warnings().await
    }

    /// Load the role list
    pub async fn init(&mut self) {
        self.store.refresh_roles().await;
    }

    /// Select a role and load its permissions
    pub async fn select_role(&mut self, id: i64) {
        debug!("Selecting role {}", id);
        self.state = EditorState::Loading;
        self.store.load_role(id).await;

        let snapshot = self.store.snapshot().await;
        match snapshot.active_role {
            Some(role) if role.id() == id && snapshot.error.is_none() => self.confirm(role),
            _ => self.state = EditorState::Errored,
        }
    }

    pub fn select_category(&mut self, category: PermissionCategory) {
        self.category = category;
    }

    /// Rows for the selected category, in catalog order
    pub async fn rows(&self) -> Vec<PermissionRow> {
        let role = self.store.active_role().await;

        permissions_by_category(self.category)
            .into_iter()
            .map(|spec| {
                let entry = role
                    .as_ref()
                    .map(|r| r.entry(spec.action))
                    .unwrap_or_default();
                let account_ids_text = self
                    .account_inputs
                    .get(spec.action)
                    .cloned()
                    .unwrap_or_else(|| format_account_ids(entry.scope.accounts()));
                PermissionRow {
                    spec,
                    entry,
                    account_ids_text,
                }
            })
            .collect()
    }

    pub async fn set_level(&mut self, action: &str, level: PermissionLevel) -> EditorResult<()> {
        self.edit_entry(action, |entry| entry.level = level).await
    }

    pub async fn set_scope_type(
        &mut self,
        action: &str,
        scope_type: PermissionScopeType,
    ) -> EditorResult<()> {
        self.edit_entry(action, |entry| {
            entry.scope = entry.scope.clone().with_type(scope_type);
        })
        .await?;

        if scope_type != PermissionScopeType::SelectedAccounts {
            self.account_inputs.remove(action);
        }
        Ok(())
    }

    /// Replace the account list from free text; malformed tokens are dropped
    pub async fn set_account_ids(&mut self, action: &str, text: &str) -> EditorResult<()> {
        let ids = parse_account_ids(text);
        self.edit_entry(action, |entry| {
            entry.scope = PermissionScope::selected_accounts(ids);
        })
        .await?;

        self.account_inputs
            .insert(action.to_string(), text.to_string());
        Ok(())
    }

    /// Change the display label; the key never changes
    pub async fn rename(&mut self, label: &str) -> EditorResult<()> {
        let edited = self
            .store
            .update_active_role(|role| role.summary.label = label.to_string())
            .await;
        if !edited {
            return Err(EditorError::NoActiveRole);
        }
        self.state = EditorState::Editing;
        Ok(())
    }

    /// Save the local copy
    pub async fn save(&mut self) -> EditorResult<SaveResult> {
        self.submit(false).await
    }

    /// Resubmit the warned payload with `ignore_warnings`
    pub async fn save_anyway(&mut self) -> EditorResult<SaveResult> {
        if self.state != EditorState::Warned {
            return Err(EditorError::NotWarned);
        }
        self.submit(true).await
    }

    pub async fn has_unsaved_changes(&self) -> bool {
        self.store.active_role().await.as_ref() != self.saved_role.as_ref()
    }

    pub async fn can_delete(&self) -> bool {
        self.store
            .active_role()
            .await
            .is_some_and(|role| !role.is_builtin())
    }

    /// Keys are assigned by the server and immutable
    pub fn is_key_editable(&self) -> bool {
        false
    }

    /// Delete the selected role
    pub async fn delete_active(&mut self) -> EditorResult<bool> {
        let role = self
            .store
            .active_role()
            .await
            .ok_or(EditorError::NoActiveRole)?;

        if role.is_builtin() {
            let err = EditorError::BuiltinRole(role.key().to_string());
            warn!("Refusing to delete role {}: {}", role.id(), err);
            self.store.record_error(err.to_string()).await;
            return Err(err);
        }

        let deleted = self.store.delete_role(role.id()).await;
        if deleted {
            info!("Deleted role {} ({})", role.id(), role.key());
            self.reset();
        } else {
            self.state = EditorState::Errored;
        }
        Ok(deleted)
    }

    /// Create a role and select it
    pub async fn create_role(
        &mut self,
        label: &str,
        clone_from_id: Option<i64>,
    ) -> Option<RoleSummary> {
        let created = self.store.create_role(label, clone_from_id).await?;

        match self.store.active_role().await {
            Some(role) if role.id() == created.id => self.confirm(role),
            _ => self.state = EditorState::Errored,
        }
        Some(created)
    }

    /// Create a copy of the selected role's permissions under a new label
    pub async fn duplicate_active(&mut self, label: &str) -> EditorResult<Option<RoleSummary>> {
        let source = self
            .store
            .active_role()
            .await
            .ok_or(EditorError::NoActiveRole)?;
        Ok(self.create_role(label, Some(source.id())).await)
    }

    async fn edit_entry<F>(&mut self, action: &str, edit: F) -> EditorResult<()>
    where
        F: FnOnce(&mut RolePermissionEntry),
    {
        if find_permission(action).is_none() {
            return Err(EditorError::UnknownAction(action.to_string()));
        }

        let edited = self
            .store
            .update_active_role(|role| edit(role.entry_mut(action)))
            .await;
        if !edited {
            return Err(EditorError::NoActiveRole);
        }
        self.state = EditorState::Editing;
        Ok(())
    }

    async fn submit(&mut self, ignore_warnings: bool) -> EditorResult<SaveResult> {
        let role = self
            .store
            .active_role()
            .await
            .ok_or(EditorError::NoActiveRole)?;

        self.state = EditorState::Saving;
        let result = self.store.save_role(&role, ignore_warnings).await;

        if result.ok {
            match self.store.active_role().await {
                Some(saved) if saved.id() == role.id() => self.confirm(saved),
                _ => self.state = EditorState::Loaded,
            }
        } else if result.conflict {
            self.state = EditorState::Warned;
        } else {
            self.state = EditorState::Errored;
        }
        Ok(result)
    }

    fn confirm(&mut self, role: RoleDetail) {
        self.saved_role = Some(role);
        self.account_inputs.clear();
        self.state = EditorState::Loaded;
    }

    fn reset(&mut self) {
        self.saved_role = None;
        self.account_inputs.clear();
        self.state = EditorState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::RoleRepository;
    use common::{ApiClient, ApiConfig};
    use serde_json::json;

    async fn editor_with(role: serde_json::Value) -> RoleEditor {
        let client = ApiClient::new(&ApiConfig::new("http://127.0.0.1:9")).unwrap();
        let store = RolesStore::new(RoleRepository::new(client));
        let role: RoleDetail = serde_json::from_value(role).unwrap();
        store.set_active_role(Some(role)).await;
        RoleEditor::new(store)
    }

    #[tokio::test]
    async fn test_rows_render_absent_entries_as_none() {
        let mut editor = editor_with(json!({
            "id": 1, "key": "bookkeeper", "label": "Bookkeeper",
            "permissions": {"bank.view": {"level": "view", "scope": {"type": "all"}}}
        }))
        .await;
        editor.select_category(PermissionCategory::Bank);

        let rows = editor.rows().await;

        assert_eq!(rows.len(), permissions_by_category(PermissionCategory::Bank).len());
        assert_eq!(rows[0].spec.action, "bank.view");
        assert_eq!(rows[0].entry.level, PermissionLevel::View);
        let reconcile = rows.iter().find(|r| r.spec.action == "bank.reconcile").unwrap();
        assert_eq!(reconcile.entry, RolePermissionEntry::default());
        assert!(!reconcile.shows_accounts());
    }

    #[tokio::test]
    async fn test_account_text_is_kept_as_typed() {
        let mut editor = editor_with(json!({"id": 1, "key": "ap", "label": "AP"})).await;

        editor
            .set_account_ids("bank.reconcile", "12, 15abc, 19")
            .await
            .unwrap();

        let role = editor.store().active_role().await.unwrap();
        let entry = role.entry("bank.reconcile");
        assert_eq!(entry.scope.scope_type, PermissionScopeType::SelectedAccounts);
        assert_eq!(entry.scope.accounts(), &[12, 19]);

        let row = editor
            .rows()
            .await
            .into_iter()
            .find(|r| r.spec.action == "bank.reconcile")
            .unwrap();
        assert_eq!(row.account_ids_text, "12, 15abc, 19");
        assert!(row.shows_accounts());

        editor
            .set_scope_type("bank.reconcile", PermissionScopeType::OwnCreated)
            .await
            .unwrap();
        let role = editor.store().active_role().await.unwrap();
        assert_eq!(role.entry("bank.reconcile").scope.account_ids, None);
        assert_eq!(editor.state(), EditorState::Editing);
    }

    #[tokio::test]
    async fn test_unknown_action_rejected() {
        let mut editor = editor_with(json!({"id": 1, "key": "ap", "label": "AP"})).await;

        let err = editor
            .set_level("payroll.run", PermissionLevel::Edit)
            .await
            .unwrap_err();

        assert_eq!(err, EditorError::UnknownAction("payroll.run".to_string()));
        assert!(editor.store().active_role().await.unwrap().permissions.is_empty());
    }

    #[tokio::test]
    async fn test_edits_need_an_active_role() {
        let client = ApiClient::new(&ApiConfig::new("http://127.0.0.1:9")).unwrap();
        let mut editor = RoleEditor::new(RolesStore::new(RoleRepository::new(client)));

        assert_eq!(
            editor.set_level("bank.view", PermissionLevel::View).await,
            Err(EditorError::NoActiveRole)
        );
        assert_eq!(editor.rename("x").await, Err(EditorError::NoActiveRole));
        assert!(!editor.can_delete().await);
    }

    #[tokio::test]
    async fn test_builtin_role_cannot_be_deleted() {
        let mut editor = editor_with(json!({
            "id": 1, "key": "owner", "label": "Owner", "is_builtin": true
        }))
        .await;

        assert!(!editor.can_delete().await);
        assert!(!editor.is_key_editable());

        let err = editor.delete_active().await.unwrap_err();
        assert_eq!(err, EditorError::BuiltinRole("owner".to_string()));
        assert_eq!(
            editor.store().error().await.as_deref(),
            Some("Built-in role owner cannot be deleted")
        );
        assert!(editor.store().active_role().await.is_some());
    }

    #[tokio::test]
    async fn test_save_anyway_requires_warning() {
        let mut editor = editor_with(json!({"id": 1, "key": "ap", "label": "AP"})).await;
        assert_eq!(editor.save_anyway().await, Err(EditorError::NotWarned));
    }

    #[tokio::test]
    async fn test_unsaved_changes_tracking() {
        let mut editor = editor_with(json!({"id": 1, "key": "ap", "label": "AP"})).await;
        // Nothing confirmed by the server yet
        assert!(editor.has_unsaved_changes().await);

        let current = editor.store().active_role().await.unwrap();
        editor.confirm(current);
        assert!(!editor.has_unsaved_changes().await);

        editor.rename("Accounts payable").await.unwrap();
        assert!(editor.has_unsaved_changes().await);
        assert_eq!(editor.saved_role().unwrap().label(), "AP");
    }
}
