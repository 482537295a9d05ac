use std::sync::Arc;

use acctperm_core::{AppError, AppResult};
use acctperm_domain::{
    AccountOverride, DependencyClosure, ModuleRegistry, PermissionAuditAction, PermissionKey,
    PermissionKeySet, PermissionTree, RoleTemplate, RoleTemplateId, UserId, has_effective_key,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::account_override_editor::AccountOverrideEditor;
use crate::audit_recorder::AuditRecorder;
use crate::permission_admin_ports::{
    AuditLogQuery, AuditLogRepository, CreateRoleTemplateInput, MAX_AUDIT_LOG_LIMIT,
    PermissionAdminRepository, PermissionAuditEntry, PermissionAuditEvent, RoleTemplateWithKeys,
    SaveAccountOverrideInput, SaveRoleTemplateInput,
};
use crate::role_template_editor::{RoleTemplateEditor, role_template_saved_event};

/// Outcome of loading the permission tree for an editing surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeAccess {
    /// The caller may edit permissions against this tree.
    Available(Arc<PermissionTree>),
    /// The backend refused the tree; permission editing should be hidden.
    Unavailable,
}

/// Account override together with its resolved effective keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveOverrideView {
    /// Stored override.
    pub account_override: AccountOverride,
    /// Keys of the assigned template.
    pub template_keys: PermissionKeySet,
    /// `(template ∪ add) \ remove`.
    pub effective_keys: PermissionKeySet,
}

/// Dependency-closure preview with rendered reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSelectionPreview {
    /// Raw closure result.
    pub closure: DependencyClosure,
    /// One labelled message per reason, in reason order.
    pub messages: Vec<String>,
}

/// Application service for permission administration.
#[derive(Clone)]
pub struct PermissionAdminService {
    repository: Arc<dyn PermissionAdminRepository>,
    audit_log_repository: Arc<dyn AuditLogRepository>,
    audit: AuditRecorder,
    registry: Arc<ModuleRegistry>,
    tree: Arc<RwLock<Option<Arc<PermissionTree>>>>,
}

impl PermissionAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn PermissionAdminRepository>,
        audit_log_repository: Arc<dyn AuditLogRepository>,
        registry: ModuleRegistry,
    ) -> Self {
        Self {
            repository,
            audit: AuditRecorder::new(Arc::clone(&audit_log_repository)),
            audit_log_repository,
            registry: Arc::new(registry),
            tree: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the cached permission tree, fetching it on first use.
    pub async fn permission_tree(&self) -> AppResult<Arc<PermissionTree>> {
        if let Some(tree) = self.tree.read().await.as_ref() {
            return Ok(Arc::clone(tree));
        }
        self.refresh_permission_tree().await
    }

    /// Fetches the permission tree again and replaces the cached copy.
    pub async fn refresh_permission_tree(&self) -> AppResult<Arc<PermissionTree>> {
        let mut cached = self.tree.write().await;
        let tree = Arc::new(self.repository.fetch_permission_tree().await?);
        info!(
            module_count = tree.label_index().len(),
            action_count = tree.actions().len(),
            "permission tree loaded"
        );
        *cached = Some(Arc::clone(&tree));
        Ok(tree)
    }

    /// Loads the tree, downgrading a forbidden fetch to [`TreeAccess::Unavailable`].
    pub async fn tree_access(&self) -> AppResult<TreeAccess> {
        match self.permission_tree().await {
            Ok(tree) => Ok(TreeAccess::Available(tree)),
            Err(AppError::Forbidden(message)) => {
                warn!(%message, "permission tree unavailable to caller");
                Ok(TreeAccess::Unavailable)
            }
            Err(error) => Err(error),
        }
    }

    /// Returns the module registry used for dependency previews.
    #[must_use]
    pub fn module_registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Lists role templates ordered by id.
    pub async fn list_role_templates(&self, enabled_only: bool) -> AppResult<Vec<RoleTemplate>> {
        self.repository.list_role_templates(enabled_only).await
    }

    /// Returns a role template summary or reports it missing.
    pub async fn find_role_template(
        &self,
        role_template_id: RoleTemplateId,
    ) -> AppResult<RoleTemplate> {
        self.repository
            .list_role_templates(false)
            .await?
            .into_iter()
            .find(|template| template.id() == role_template_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("role template {role_template_id} does not exist"))
            })
    }

    /// Returns the keys granted by a role template.
    pub async fn role_template_keys(
        &self,
        role_template_id: RoleTemplateId,
    ) -> AppResult<PermissionKeySet> {
        self.repository
            .fetch_role_template_keys(role_template_id)
            .await
    }

    /// Creates a role template.
    pub async fn create_role_template(
        &self,
        input: CreateRoleTemplateInput,
    ) -> AppResult<RoleTemplate> {
        let template = self.repository.create_role_template(input).await?;
        info!(
            role_template_id = %template.id(),
            key = template.key(),
            "role template created"
        );
        self.audit
            .record(PermissionAuditEvent::role_template(
                PermissionAuditAction::RoleTemplateCreate,
                &template,
                Some(format!("enabled={}", template.enabled())),
            ))
            .await;
        Ok(template)
    }

    /// Copies a role template. The copy starts disabled.
    pub async fn clone_role_template(
        &self,
        role_template_id: RoleTemplateId,
    ) -> AppResult<RoleTemplate> {
        let template = self
            .repository
            .clone_role_template(role_template_id)
            .await?;
        info!(
            source_id = %role_template_id,
            role_template_id = %template.id(),
            "role template cloned"
        );
        self.audit
            .record(PermissionAuditEvent::role_template(
                PermissionAuditAction::RoleTemplateClone,
                &template,
                Some(format!("clonedFrom={role_template_id}")),
            ))
            .await;
        Ok(template)
    }

    /// Deletes a role template.
    pub async fn delete_role_template(&self, role_template_id: RoleTemplateId) -> AppResult<()> {
        let template = self.find_role_template(role_template_id).await?;
        self.repository
            .delete_role_template(role_template_id)
            .await?;
        info!(role_template_id = %role_template_id, "role template deleted");
        self.audit
            .record(PermissionAuditEvent::role_template(
                PermissionAuditAction::RoleTemplateDelete,
                &template,
                None,
            ))
            .await;
        Ok(())
    }

    /// Saves a full role template replacement without an editor session.
    pub async fn save_role_template(
        &self,
        role_template_id: RoleTemplateId,
        input: SaveRoleTemplateInput,
    ) -> AppResult<RoleTemplateWithKeys> {
        let saved = self
            .repository
            .save_role_template(role_template_id, input)
            .await?;
        info!(
            role_template_id = %role_template_id,
            key_count = saved.permission_keys.len(),
            "role template saved"
        );
        self.audit.record(role_template_saved_event(&saved)).await;
        Ok(saved)
    }

    /// Starts an editor session for a role template.
    pub async fn open_role_template_editor(
        &self,
        role_template_id: RoleTemplateId,
    ) -> AppResult<RoleTemplateEditor> {
        let template = self.find_role_template(role_template_id).await?;
        let tree = self.permission_tree().await?;
        debug!(role_template_id = %role_template_id, "opening role template editor");
        RoleTemplateEditor::open(
            Arc::clone(&self.repository),
            self.audit.clone(),
            tree,
            template,
        )
        .await
    }

    /// Starts an editor session for an account override.
    pub async fn open_account_override_editor(
        &self,
        user_id: UserId,
    ) -> AppResult<AccountOverrideEditor> {
        let tree = self.permission_tree().await?;
        debug!(user_id = %user_id, "opening account override editor");
        AccountOverrideEditor::open(
            Arc::clone(&self.repository),
            self.audit.clone(),
            tree,
            user_id,
        )
        .await
    }

    /// Returns an account override with its effective keys.
    pub async fn account_effective_keys(&self, user_id: UserId) -> AppResult<EffectiveOverrideView> {
        let account_override = self.repository.fetch_account_override(user_id).await?;
        self.effective_view(account_override).await
    }

    /// Saves a full override replacement and returns the resolved view.
    pub async fn save_account_override(
        &self,
        user_id: UserId,
        input: SaveAccountOverrideInput,
    ) -> AppResult<EffectiveOverrideView> {
        let account_override = self
            .repository
            .save_account_override(user_id, input)
            .await?;
        info!(user_id = %user_id, "account override saved");
        let delta = account_override.delta();
        self.audit
            .record(PermissionAuditEvent::account_override(
                user_id,
                delta.add_keys().len(),
                delta.remove_keys().len(),
            ))
            .await;
        self.effective_view(account_override).await
    }

    /// Fails with a forbidden error unless the account's effective set holds the key.
    ///
    /// A blank key is always allowed.
    pub async fn require_permission(
        &self,
        user_id: UserId,
        permission_key: &str,
    ) -> AppResult<()> {
        let permission_key = permission_key.trim();
        if permission_key.is_empty() {
            return Ok(());
        }

        let account_override = self.repository.fetch_account_override(user_id).await?;
        let template_keys = self.template_keys_for(&account_override).await?;
        let delta = account_override.delta();
        let granted = PermissionKey::parse(permission_key).is_ok_and(|key| {
            has_effective_key(&key, &template_keys, delta.add_keys(), delta.remove_keys())
        });
        if granted {
            return Ok(());
        }

        debug!(user_id = %user_id, permission_key, "permission denied");
        Err(AppError::Forbidden(format!(
            "account {user_id} lacks permission '{permission_key}'"
        )))
    }

    /// Lists recent audit entries. The limit is clamped to `1..=200`.
    pub async fn list_audit_log(
        &self,
        mut query: AuditLogQuery,
    ) -> AppResult<Vec<PermissionAuditEntry>> {
        query.limit = query.limit.clamp(1, MAX_AUDIT_LOG_LIMIT);
        self.audit_log_repository.list_recent_entries(query).await
    }

    /// Expands a raw module selection with its required dependencies.
    #[must_use]
    pub fn preview_module_selection(&self, selected: &[String]) -> ModuleSelectionPreview {
        let closure = self
            .registry
            .resolve_selection(selected.iter().map(String::as_str));
        let messages = closure
            .reasons
            .iter()
            .map(|reason| self.registry.describe_reason(reason))
            .collect();
        debug!(
            selected_count = selected.len(),
            added_count = closure.added.len(),
            "module selection resolved"
        );

        ModuleSelectionPreview { closure, messages }
    }

    async fn effective_view(
        &self,
        account_override: AccountOverride,
    ) -> AppResult<EffectiveOverrideView> {
        let template_keys = self.template_keys_for(&account_override).await?;
        let effective_keys = account_override.delta().resolve(&template_keys);

        Ok(EffectiveOverrideView {
            account_override,
            template_keys,
            effective_keys,
        })
    }

    async fn template_keys_for(
        &self,
        account_override: &AccountOverride,
    ) -> AppResult<PermissionKeySet> {
        match account_override.role_template_id() {
            Some(role_template_id) => {
                self.repository
                    .fetch_role_template_keys(role_template_id)
                    .await
            }
            None => Ok(PermissionKeySet::new()),
        }
    }
}
