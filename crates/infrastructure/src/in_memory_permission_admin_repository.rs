use std::collections::BTreeMap;

use async_trait::async_trait;
use acctperm_application::{
    CreateRoleTemplateInput, PermissionAdminRepository, RoleTemplateWithKeys,
    SaveAccountOverrideInput, SaveRoleTemplateInput,
};
use acctperm_core::{AppError, AppResult, NonEmptyString};
use acctperm_domain::{
    AccountOverride, AccountOverrideSnapshot, OverrideDelta, PermissionKey, PermissionKeySet, PermissionTree,
    RoleTemplate, RoleTemplateId, UserId,
};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Prefix of generated role template keys.
pub const ROLE_KEY_PREFIX: &str = "acctperm_";

const ROLE_KEY_SUFFIX_LENGTH: usize = 8;
const ROLE_KEY_ATTEMPTS: usize = 5;
const CLONE_LABEL_SUFFIX: &str = "-copy";

#[derive(Debug, Clone)]
struct StoredRoleTemplate {
    template: RoleTemplate,
    permission_keys: PermissionKeySet,
}

#[derive(Debug, Default)]
struct PermissionAdminState {
    next_role_id: i64,
    role_templates: BTreeMap<RoleTemplateId, StoredRoleTemplate>,
    accounts: BTreeMap<UserId, AccountOverrideSnapshot>,
}

impl PermissionAdminState {
    fn role_template(&self, role_template_id: RoleTemplateId) -> AppResult<&StoredRoleTemplate> {
        self.role_templates.get(&role_template_id).ok_or_else(|| {
            AppError::NotFound(format!("role template {role_template_id} does not exist"))
        })
    }

    fn key_exists(&self, key: &str) -> bool {
        self.role_templates
            .values()
            .any(|stored| stored.template.key() == key)
    }

    fn generate_role_key(&self) -> AppResult<NonEmptyString> {
        let date_part = Utc::now().format("%Y%m%d").to_string();
        for _ in 0..ROLE_KEY_ATTEMPTS {
            let suffix = Uuid::new_v4().simple().to_string();
            let key = format!(
                "{ROLE_KEY_PREFIX}{date_part}_{}",
                &suffix[..ROLE_KEY_SUFFIX_LENGTH]
            );
            if !self.key_exists(&key) {
                return NonEmptyString::new(key);
            }
        }

        Err(AppError::Internal(
            "could not generate a unique role template key".to_owned(),
        ))
    }

    fn insert_role_template(
        &mut self,
        key: NonEmptyString,
        label: NonEmptyString,
        enabled: bool,
        description: Option<String>,
        permission_keys: PermissionKeySet,
    ) -> RoleTemplate {
        self.next_role_id += 1;
        let template = RoleTemplate::new(
            RoleTemplateId::new(self.next_role_id),
            key,
            label,
            enabled,
            description,
        );
        self.role_templates.insert(
            template.id(),
            StoredRoleTemplate {
                template: template.clone(),
                permission_keys,
            },
        );
        template
    }
}

/// In-memory permission administration backend.
///
/// Applies the backend's write rules: keys must name a tree module and a catalog
/// action, role keys are unique, and only enabled templates can be assigned.
#[derive(Debug)]
pub struct InMemoryPermissionAdminRepository {
    tree: RwLock<PermissionTree>,
    state: RwLock<PermissionAdminState>,
}

impl InMemoryPermissionAdminRepository {
    /// Creates an empty repository serving the given tree.
    #[must_use]
    pub fn new(tree: PermissionTree) -> Self {
        Self {
            tree: RwLock::new(tree),
            state: RwLock::new(PermissionAdminState::default()),
        }
    }

    /// Registers an account so its override can be read and written.
    pub async fn register_account(&self, user_id: UserId) {
        self.state
            .write()
            .await
            .accounts
            .entry(user_id)
            .or_default();
    }

    /// Replaces the served tree. Stored keys are not revalidated.
    pub async fn replace_tree(&self, tree: PermissionTree) {
        *self.tree.write().await = tree;
    }

    async fn validate_keys<'a, I>(&self, keys: I) -> AppResult<()>
    where
        I: IntoIterator<Item = &'a PermissionKey>,
    {
        self.tree.read().await.validate_permission_keys(keys)
    }
}

#[async_trait]
impl PermissionAdminRepository for InMemoryPermissionAdminRepository {
    async fn fetch_permission_tree(&self) -> AppResult<PermissionTree> {
        Ok(self.tree.read().await.clone())
    }

    async fn list_role_templates(&self, enabled_only: bool) -> AppResult<Vec<RoleTemplate>> {
        Ok(self
            .state
            .read()
            .await
            .role_templates
            .values()
            .filter(|stored| !enabled_only || stored.template.enabled())
            .map(|stored| stored.template.clone())
            .collect())
    }

    async fn fetch_role_template_keys(
        &self,
        role_template_id: RoleTemplateId,
    ) -> AppResult<PermissionKeySet> {
        Ok(self
            .state
            .read()
            .await
            .role_template(role_template_id)?
            .permission_keys
            .clone())
    }

    async fn fetch_account_override(&self, user_id: UserId) -> AppResult<AccountOverride> {
        let state = self.state.read().await;
        let snapshot = state
            .accounts
            .get(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("account {user_id} does not exist")))?;

        Ok(AccountOverride {
            user_id,
            snapshot: snapshot.clone(),
        })
    }

    async fn save_role_template(
        &self,
        role_template_id: RoleTemplateId,
        input: SaveRoleTemplateInput,
    ) -> AppResult<RoleTemplateWithKeys> {
        self.validate_keys(&input.permission_keys).await?;

        let mut state = self.state.write().await;
        let existing = state.role_template(role_template_id)?;
        let template = RoleTemplate::new(
            role_template_id,
            NonEmptyString::new(existing.template.key())?,
            input.label,
            input.enabled,
            input.description,
        );
        let stored = StoredRoleTemplate {
            template,
            permission_keys: input.permission_keys,
        };
        state.role_templates.insert(role_template_id, stored.clone());

        debug!(
            role_template_id = %role_template_id,
            key_count = stored.permission_keys.len(),
            "stored role template"
        );
        Ok(RoleTemplateWithKeys {
            template: stored.template,
            permission_keys: stored.permission_keys,
        })
    }

    async fn save_account_override(
        &self,
        user_id: UserId,
        input: SaveAccountOverrideInput,
    ) -> AppResult<AccountOverride> {
        self.validate_keys(input.add_keys.iter().chain(&input.remove_keys))
            .await?;

        let mut state = self.state.write().await;
        if !state.accounts.contains_key(&user_id) {
            return Err(AppError::NotFound(format!("account {user_id} does not exist")));
        }
        if let Some(role_template_id) = input.role_template_id {
            let stored = state.role_template(role_template_id)?;
            if !stored.template.enabled() {
                return Err(AppError::Validation(format!(
                    "only enabled role templates can be assigned: {}",
                    stored.template.key()
                )));
            }
        }

        let snapshot = AccountOverrideSnapshot::new(
            input.role_template_id,
            OverrideDelta::new(input.add_keys, input.remove_keys),
        );
        state.accounts.insert(user_id, snapshot.clone());

        debug!(user_id = %user_id, "stored account override");
        Ok(AccountOverride { user_id, snapshot })
    }

    async fn create_role_template(
        &self,
        input: CreateRoleTemplateInput,
    ) -> AppResult<RoleTemplate> {
        let mut state = self.state.write().await;
        let key = match input
            .key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
        {
            Some(key) if state.key_exists(key) => {
                return Err(AppError::Conflict(format!(
                    "role template key '{key}' already exists"
                )));
            }
            Some(key) => NonEmptyString::new(key)?,
            None => state.generate_role_key()?,
        };

        let template = state.insert_role_template(
            key,
            input.label,
            input.enabled,
            input.description,
            PermissionKeySet::new(),
        );
        info!(
            role_template_id = %template.id(),
            key = template.key(),
            "created role template"
        );
        Ok(template)
    }

    async fn clone_role_template(
        &self,
        role_template_id: RoleTemplateId,
    ) -> AppResult<RoleTemplate> {
        let mut state = self.state.write().await;
        let source = state.role_template(role_template_id)?.clone();
        let key = state.generate_role_key()?;
        let label = NonEmptyString::new(format!(
            "{}{CLONE_LABEL_SUFFIX}",
            source.template.label()
        ))?;

        Ok(state.insert_role_template(
            key,
            label,
            false,
            source.template.description().map(str::to_owned),
            source.permission_keys,
        ))
    }

    async fn delete_role_template(&self, role_template_id: RoleTemplateId) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.role_template(role_template_id)?;
        state.role_templates.remove(&role_template_id);

        let mut unassigned = 0_usize;
        for snapshot in state.accounts.values_mut() {
            if snapshot.role_template_id == Some(role_template_id) {
                snapshot.role_template_id = None;
                unassigned += 1;
            }
        }
        info!(
            role_template_id = %role_template_id,
            unassigned,
            "deleted role template"
        );
        Ok(())
    }
}

/// Returns whether a key has the generated `acctperm_<yyyyMMdd>_<8 alnum>` shape.
#[must_use]
pub fn is_generated_role_key(key: &str) -> bool {
    let Some(rest) = key.strip_prefix(ROLE_KEY_PREFIX) else {
        return false;
    };
    let Some((date_part, suffix)) = rest.split_once('_') else {
        return false;
    };

    date_part.len() == 8
        && date_part.chars().all(|character| character.is_ascii_digit())
        && suffix.len() == ROLE_KEY_SUFFIX_LENGTH
        && suffix
            .chars()
            .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit())
}

#[cfg(test)]
mod tests;
