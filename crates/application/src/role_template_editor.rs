use std::sync::Arc;

use acctperm_core::AppResult;
use acctperm_domain::{
    DraftState, KeySetDiff, ModuleKeyGroup, PermissionAuditAction, PermissionKey,
    PermissionKeySet, PermissionTree, QuickOp, RoleTemplate, RoleTemplateSnapshot,
    SubtreeSelection, apply_quick_op, group_keys_by_module, is_menu_checked, set_menu_checked,
};
use tracing::{info, warn};

use crate::audit_recorder::AuditRecorder;
use crate::permission_admin_ports::{
    PermissionAdminRepository, PermissionAuditEvent, RoleTemplateWithKeys, SaveRoleTemplateInput,
};

/// Draft session over one role template.
///
/// The draft is the template's full key set; quick ops replace keys inside a subtree.
pub struct RoleTemplateEditor {
    repository: Arc<dyn PermissionAdminRepository>,
    audit: AuditRecorder,
    tree: Arc<PermissionTree>,
    template: RoleTemplate,
    state: DraftState<RoleTemplateSnapshot>,
}

impl RoleTemplateEditor {
    /// Loads the template keys and starts a clean draft.
    pub async fn open(
        repository: Arc<dyn PermissionAdminRepository>,
        audit: AuditRecorder,
        tree: Arc<PermissionTree>,
        template: RoleTemplate,
    ) -> AppResult<Self> {
        let permission_keys = repository.fetch_role_template_keys(template.id()).await?;
        let snapshot = RoleTemplateSnapshot::from_template(&template, permission_keys);

        Ok(Self {
            repository,
            audit,
            tree,
            template,
            state: DraftState::new(snapshot),
        })
    }

    /// Returns the template summary as last persisted.
    #[must_use]
    pub fn template(&self) -> &RoleTemplate {
        &self.template
    }

    /// Returns the tree the editor works against.
    #[must_use]
    pub fn tree(&self) -> &PermissionTree {
        &self.tree
    }

    /// Returns the last persisted snapshot.
    #[must_use]
    pub fn saved(&self) -> &RoleTemplateSnapshot {
        self.state.saved()
    }

    /// Returns the draft snapshot.
    #[must_use]
    pub fn draft(&self) -> &RoleTemplateSnapshot {
        self.state.draft()
    }

    /// Returns whether the draft has unsaved changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    /// Discards unsaved changes.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Sets the draft label. Blank labels are rejected on save.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.state.draft_mut().label = label.into();
    }

    /// Sets whether the template is enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.state.draft_mut().enabled = enabled;
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: Option<String>) {
        self.state.draft_mut().description = description;
    }

    /// Grants or revokes a single key.
    pub fn set_key_granted(&mut self, key: &PermissionKey, granted: bool) {
        let keys = &mut self.state.draft_mut().permission_keys;
        if granted {
            keys.insert(key.clone());
        } else {
            keys.remove(key);
        }
    }

    /// Returns whether the draft grants a key.
    #[must_use]
    pub fn has_key(&self, key: &PermissionKey) -> bool {
        self.draft().permission_keys.contains(key)
    }

    /// Applies a quick op to a module subtree.
    pub fn apply_quick_op(&mut self, module_key: &str, op: QuickOp) -> AppResult<()> {
        let node = self.tree.require_module(module_key)?;
        apply_quick_op(&mut self.state.draft_mut().permission_keys, node, op);
        Ok(())
    }

    /// Returns whether the module is visible under the draft.
    pub fn is_menu_checked(&self, module_key: &str) -> AppResult<bool> {
        let node = self.tree.require_module(module_key)?;
        Ok(is_menu_checked(node, &self.draft().permission_keys))
    }

    /// Toggles module visibility for a subtree.
    pub fn set_menu_checked(&mut self, module_key: &str, checked: bool) -> AppResult<()> {
        let node = self.tree.require_module(module_key)?;
        set_menu_checked(&mut self.state.draft_mut().permission_keys, node, checked);
        Ok(())
    }

    /// Counts granted keys within a module subtree.
    pub fn selection_summary(&self, module_key: &str) -> AppResult<SubtreeSelection> {
        let node = self.tree.require_module(module_key)?;
        Ok(node.selection_summary(&self.draft().permission_keys))
    }

    /// Returns the key changes relative to the saved snapshot.
    #[must_use]
    pub fn diff(&self) -> KeySetDiff {
        KeySetDiff::between(&self.saved().permission_keys, &self.draft().permission_keys)
    }

    /// Returns the draft keys grouped by module for display.
    #[must_use]
    pub fn grouped_keys(&self) -> Vec<ModuleKeyGroup> {
        group_keys_by_module(
            &self.draft().permission_keys,
            Some(self.tree.label_index()),
        )
    }

    /// Returns the draft keys.
    #[must_use]
    pub fn permission_keys(&self) -> &PermissionKeySet {
        &self.draft().permission_keys
    }

    /// Persists the draft. On failure the draft is left as it was.
    pub async fn save(&mut self) -> AppResult<&RoleTemplateSnapshot> {
        let input = SaveRoleTemplateInput::from_snapshot(self.state.draft())?;
        let role_template_id = self.template.id();

        let persisted = match self
            .repository
            .save_role_template(role_template_id, input)
            .await
        {
            Ok(persisted) => persisted,
            Err(error) => {
                warn!(
                    role_template_id = %role_template_id,
                    recovery = error.recovery().as_str(),
                    error = %error,
                    "role template save failed"
                );
                return Err(error);
            }
        };

        info!(
            role_template_id = %role_template_id,
            key_count = persisted.permission_keys.len(),
            "role template saved"
        );
        self.audit.record(role_template_saved_event(&persisted)).await;
        self.state.commit(persisted.snapshot());
        self.template = persisted.template;
        Ok(self.state.saved())
    }
}

/// Audit event for a persisted role template replacement.
pub(crate) fn role_template_saved_event(saved: &RoleTemplateWithKeys) -> PermissionAuditEvent {
    PermissionAuditEvent::role_template(
        PermissionAuditAction::RoleTemplateSave,
        &saved.template,
        Some(format!(
            "enabled={}, permissionKeysCount={}",
            saved.template.enabled(),
            saved.permission_keys.len()
        )),
    )
}
