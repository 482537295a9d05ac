use std::sync::Arc;

use acctperm_core::AppResult;
use acctperm_domain::{
    AccountOverride, AccountOverrideSnapshot, DraftState, ModuleKeyGroup, OverrideDelta,
    OverrideDiff, OverrideKeyState, PermissionKey, PermissionKeySet, PermissionTree, QuickOp,
    RoleTemplateId, SubtreeSelection, UserId, apply_quick_op, group_keys_by_module,
    is_menu_checked, set_menu_checked,
};
use tracing::{debug, info, warn};

use crate::audit_recorder::AuditRecorder;
use crate::permission_admin_ports::{
    PermissionAdminRepository, PermissionAuditEvent, SaveAccountOverrideInput,
};

/// Draft session over one account override.
///
/// Quick ops and menu toggles record explicit add/remove decisions, so the effective
/// subtree follows the operation regardless of which template is assigned.
pub struct AccountOverrideEditor {
    repository: Arc<dyn PermissionAdminRepository>,
    audit: AuditRecorder,
    tree: Arc<PermissionTree>,
    user_id: UserId,
    state: DraftState<AccountOverrideSnapshot>,
    saved_template_keys: PermissionKeySet,
    draft_template_keys: PermissionKeySet,
}

impl AccountOverrideEditor {
    /// Loads the account override and the keys of its assigned template.
    pub async fn open(
        repository: Arc<dyn PermissionAdminRepository>,
        audit: AuditRecorder,
        tree: Arc<PermissionTree>,
        user_id: UserId,
    ) -> AppResult<Self> {
        let stored = repository.fetch_account_override(user_id).await?;
        let template_keys =
            load_template_keys(repository.as_ref(), stored.role_template_id()).await?;

        Ok(Self {
            repository,
            audit,
            tree,
            user_id,
            state: DraftState::new(stored.snapshot),
            saved_template_keys: template_keys.clone(),
            draft_template_keys: template_keys,
        })
    }

    /// Returns the account being edited.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the tree the editor works against.
    #[must_use]
    pub fn tree(&self) -> &PermissionTree {
        &self.tree
    }

    /// Returns the last persisted snapshot.
    #[must_use]
    pub fn saved(&self) -> &AccountOverrideSnapshot {
        self.state.saved()
    }

    /// Returns the draft snapshot.
    #[must_use]
    pub fn draft(&self) -> &AccountOverrideSnapshot {
        self.state.draft()
    }

    /// Returns the keys of the template assigned in the draft.
    #[must_use]
    pub fn template_keys(&self) -> &PermissionKeySet {
        &self.draft_template_keys
    }

    /// Returns whether the draft has unsaved changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    /// Discards unsaved changes, including a template switch.
    pub fn reset(&mut self) {
        self.state.reset();
        self.draft_template_keys = self.saved_template_keys.clone();
    }

    /// Assigns a different template to the draft and loads its keys. The delta is kept.
    pub async fn select_role_template(
        &mut self,
        role_template_id: Option<RoleTemplateId>,
    ) -> AppResult<()> {
        let template_keys =
            load_template_keys(self.repository.as_ref(), role_template_id).await?;
        debug!(
            user_id = %self.user_id,
            role_template_id = ?role_template_id.map(|id| id.as_i64()),
            key_count = template_keys.len(),
            "override template selected"
        );

        self.state.draft_mut().role_template_id = role_template_id;
        self.draft_template_keys = template_keys;
        Ok(())
    }

    /// Returns the effective set of the draft.
    #[must_use]
    pub fn effective_keys(&self) -> PermissionKeySet {
        self.draft().delta.resolve(&self.draft_template_keys)
    }

    /// Returns the effective set as last persisted.
    #[must_use]
    pub fn saved_effective_keys(&self) -> PermissionKeySet {
        self.saved().delta.resolve(&self.saved_template_keys)
    }

    /// Returns the explicit decision recorded for a key.
    #[must_use]
    pub fn key_state(&self, key: &PermissionKey) -> OverrideKeyState {
        self.draft().delta.state_of(key)
    }

    /// Records an explicit decision for a key.
    pub fn set_key_state(&mut self, key: &PermissionKey, state: OverrideKeyState) {
        self.delta_mut().set_state(key, state);
    }

    /// Applies a quick op to a module subtree.
    pub fn apply_quick_op(&mut self, module_key: &str, op: QuickOp) -> AppResult<()> {
        let node = self.tree.require_module(module_key)?;
        apply_quick_op(&mut self.state.draft_mut().delta, node, op);
        Ok(())
    }

    /// Returns whether the module is visible under the draft's effective set.
    pub fn is_menu_checked(&self, module_key: &str) -> AppResult<bool> {
        let node = self.tree.require_module(module_key)?;
        Ok(is_menu_checked(node, &self.effective_keys()))
    }

    /// Toggles module visibility for a subtree.
    pub fn set_menu_checked(&mut self, module_key: &str, checked: bool) -> AppResult<()> {
        let node = self.tree.require_module(module_key)?;
        set_menu_checked(&mut self.state.draft_mut().delta, node, checked);
        Ok(())
    }

    /// Counts effective keys within a module subtree.
    pub fn selection_summary(&self, module_key: &str) -> AppResult<SubtreeSelection> {
        let node = self.tree.require_module(module_key)?;
        Ok(node.selection_summary(&self.effective_keys()))
    }

    /// Returns the changes relative to the saved snapshot.
    #[must_use]
    pub fn diff(&self) -> OverrideDiff {
        OverrideDiff::between(
            self.saved(),
            &self.saved_template_keys,
            self.draft(),
            &self.draft_template_keys,
        )
    }

    /// Returns the draft's effective keys grouped by module for display.
    #[must_use]
    pub fn grouped_effective_keys(&self) -> Vec<ModuleKeyGroup> {
        group_keys_by_module(&self.effective_keys(), Some(self.tree.label_index()))
    }

    /// Persists the draft. On failure the draft is left as it was.
    pub async fn save(&mut self) -> AppResult<&AccountOverrideSnapshot> {
        let input = SaveAccountOverrideInput::from(self.state.draft());
        let persisted = match self
            .repository
            .save_account_override(self.user_id, input)
            .await
        {
            Ok(persisted) => persisted,
            Err(error) => {
                warn!(
                    user_id = %self.user_id,
                    recovery = error.recovery().as_str(),
                    error = %error,
                    "account override save failed"
                );
                return Err(error);
            }
        };

        self.commit(persisted).await;
        info!(
            user_id = %self.user_id,
            add_count = self.saved().delta.add_keys().len(),
            remove_count = self.saved().delta.remove_keys().len(),
            "account override saved"
        );
        self.audit
            .record(PermissionAuditEvent::account_override(
                self.user_id,
                self.saved().delta.add_keys().len(),
                self.saved().delta.remove_keys().len(),
            ))
            .await;
        Ok(self.state.saved())
    }

    /// Adopts the persisted override, then reloads template keys if the backend
    /// assigned a different template. A failed reload keeps the previous keys.
    async fn commit(&mut self, persisted: AccountOverride) {
        let template_changed = persisted.role_template_id() != self.draft().role_template_id;
        let persisted_template_id = persisted.role_template_id();
        self.state.commit(persisted.snapshot);

        if template_changed {
            match load_template_keys(self.repository.as_ref(), persisted_template_id).await {
                Ok(template_keys) => self.draft_template_keys = template_keys,
                Err(error) => warn!(
                    user_id = %self.user_id,
                    error = %error,
                    "template keys reload failed after override save"
                ),
            }
        }
        self.saved_template_keys = self.draft_template_keys.clone();
    }

    fn delta_mut(&mut self) -> &mut OverrideDelta {
        &mut self.state.draft_mut().delta
    }
}

async fn load_template_keys(
    repository: &dyn PermissionAdminRepository,
    role_template_id: Option<RoleTemplateId>,
) -> AppResult<PermissionKeySet> {
    match role_template_id {
        Some(role_template_id) => repository.fetch_role_template_keys(role_template_id).await,
        None => Ok(PermissionKeySet::new()),
    }
}
