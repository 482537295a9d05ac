use async_trait::async_trait;

use acctperm_core::AppResult;
use acctperm_domain::{
    AccountOverride, PermissionKeySet, PermissionTree, RoleTemplate, RoleTemplateId, UserId,
};

use super::inputs::{
    CreateRoleTemplateInput, RoleTemplateWithKeys, SaveAccountOverrideInput,
    SaveRoleTemplateInput,
};

/// Repository port for the permission administration backend.
#[async_trait]
pub trait PermissionAdminRepository: Send + Sync {
    /// Fetches the module tree and action catalog.
    async fn fetch_permission_tree(&self) -> AppResult<PermissionTree>;

    /// Lists role template summaries ordered by id.
    async fn list_role_templates(&self, enabled_only: bool) -> AppResult<Vec<RoleTemplate>>;

    /// Fetches the keys granted by a role template.
    async fn fetch_role_template_keys(
        &self,
        role_template_id: RoleTemplateId,
    ) -> AppResult<PermissionKeySet>;

    /// Fetches an account override. Accounts without one get an empty override;
    /// unknown accounts are not found.
    async fn fetch_account_override(&self, user_id: UserId) -> AppResult<AccountOverride>;

    /// Replaces a role template's summary fields and key set.
    async fn save_role_template(
        &self,
        role_template_id: RoleTemplateId,
        input: SaveRoleTemplateInput,
    ) -> AppResult<RoleTemplateWithKeys>;

    /// Replaces an account override.
    async fn save_account_override(
        &self,
        user_id: UserId,
        input: SaveAccountOverrideInput,
    ) -> AppResult<AccountOverride>;

    /// Creates a role template without keys.
    async fn create_role_template(&self, input: CreateRoleTemplateInput)
    -> AppResult<RoleTemplate>;

    /// Copies a role template under a new key, disabled.
    async fn clone_role_template(&self, role_template_id: RoleTemplateId)
    -> AppResult<RoleTemplate>;

    /// Deletes a role template.
    async fn delete_role_template(&self, role_template_id: RoleTemplateId) -> AppResult<()>;
}
