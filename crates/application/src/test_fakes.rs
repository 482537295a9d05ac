use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use acctperm_core::{AppError, AppResult, NonEmptyString};
use acctperm_domain::{
    AccountOverride, AccountOverrideSnapshot, ActionDefinition, ActionKey, ModuleNode,
    OverrideDelta, PermissionAuditAction, PermissionKeySet, PermissionTree, RoleTemplate,
    RoleTemplateId, UserId, parse_permission_keys,
};

use crate::audit_recorder::AuditRecorder;
use crate::permission_admin_ports::{
    AuditLogQuery, AuditLogRepository, CreateRoleTemplateInput, PermissionAdminRepository,
    PermissionAuditEntry, PermissionAuditEvent, RoleTemplateWithKeys, SaveAccountOverrideInput,
    SaveRoleTemplateInput,
};

pub(crate) fn keys(values: &[&str]) -> PermissionKeySet {
    parse_permission_keys(values).unwrap_or_else(|_| unreachable!())
}

/// `sales { VIEW } -> [ orders { VIEW, CREATE, EDIT, DELETE }, reports { VIEW, EXPORT } ]`.
pub(crate) fn sales_tree() -> PermissionTree {
    let orders = ModuleNode::leaf(
        "orders",
        "Orders",
        vec![
            ActionKey::VIEW,
            ActionKey::CREATE,
            ActionKey::EDIT,
            ActionKey::DELETE,
        ],
    )
    .unwrap_or_else(|_| unreachable!());
    let reports = ModuleNode::leaf("reports", "Reports", vec![ActionKey::VIEW, ActionKey::EXPORT])
        .unwrap_or_else(|_| unreachable!());
    let sales = ModuleNode::new("sales", "Sales", vec![ActionKey::VIEW], vec![orders, reports])
        .unwrap_or_else(|_| unreachable!());

    PermissionTree::new(ActionDefinition::default_catalog(), vec![sales])
        .unwrap_or_else(|_| unreachable!())
}

pub(crate) fn template(id: i64, label: &str, enabled: bool) -> RoleTemplate {
    RoleTemplate::new(
        RoleTemplateId::new(id),
        NonEmptyString::new(format!("role_{id}")).unwrap_or_else(|_| unreachable!()),
        NonEmptyString::new(label).unwrap_or_else(|_| unreachable!()),
        enabled,
        None,
    )
}

#[derive(Default)]
pub(crate) struct FakeState {
    pub tree_error: Option<AppError>,
    pub save_error: Option<AppError>,
    pub keys_error: Option<AppError>,
    pub assigned_template_on_save: Option<Option<RoleTemplateId>>,
    pub tree_fetches: usize,
    pub template_saves: usize,
    pub override_saves: usize,
    pub templates: BTreeMap<RoleTemplateId, (RoleTemplate, PermissionKeySet)>,
    pub overrides: BTreeMap<UserId, AccountOverride>,
}

/// Repository fake keeping state behind a mutex and counting boundary calls.
#[derive(Default)]
pub(crate) struct FakePermissionAdminRepository {
    pub state: Mutex<FakeState>,
}

impl FakePermissionAdminRepository {
    /// Seeds template 1 (`orders:VIEW`) and account 10 adding `orders:EDIT`.
    pub(crate) fn seeded() -> Self {
        let mut state = FakeState::default();
        state.templates.insert(
            RoleTemplateId::new(1),
            (template(1, "Sales", true), keys(&["orders:VIEW"])),
        );
        state.templates.insert(
            RoleTemplateId::new(2),
            (
                template(2, "Reports", true),
                keys(&["reports:VIEW", "reports:EXPORT"]),
            ),
        );
        state.overrides.insert(
            UserId::new(10),
            AccountOverride {
                user_id: UserId::new(10),
                snapshot: AccountOverrideSnapshot::new(
                    Some(RoleTemplateId::new(1)),
                    OverrideDelta::new(keys(&["orders:EDIT"]), PermissionKeySet::new()),
                ),
            },
        );

        Self {
            state: Mutex::new(state),
        }
    }
}

#[async_trait]
impl PermissionAdminRepository for FakePermissionAdminRepository {
    async fn fetch_permission_tree(&self) -> AppResult<PermissionTree> {
        let mut state = self.state.lock().await;
        state.tree_fetches += 1;
        match &state.tree_error {
            Some(error) => Err(error.clone()),
            None => Ok(sales_tree()),
        }
    }

    async fn list_role_templates(&self, enabled_only: bool) -> AppResult<Vec<RoleTemplate>> {
        Ok(self
            .state
            .lock()
            .await
            .templates
            .values()
            .filter(|(template, _)| !enabled_only || template.enabled())
            .map(|(template, _)| template.clone())
            .collect())
    }

    async fn fetch_role_template_keys(
        &self,
        role_template_id: RoleTemplateId,
    ) -> AppResult<PermissionKeySet> {
        let state = self.state.lock().await;
        if let Some(error) = &state.keys_error {
            return Err(error.clone());
        }
        state
            .templates
            .get(&role_template_id)
            .map(|(_, keys)| keys.clone())
            .ok_or_else(|| AppError::NotFound(format!("role template {role_template_id}")))
    }

    async fn fetch_account_override(&self, user_id: UserId) -> AppResult<AccountOverride> {
        Ok(self
            .state
            .lock()
            .await
            .overrides
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| AccountOverride::empty(user_id)))
    }

    async fn save_role_template(
        &self,
        role_template_id: RoleTemplateId,
        input: SaveRoleTemplateInput,
    ) -> AppResult<RoleTemplateWithKeys> {
        let mut state = self.state.lock().await;
        state.template_saves += 1;
        if let Some(error) = &state.save_error {
            return Err(error.clone());
        }
        let Some((existing, _)) = state.templates.get(&role_template_id) else {
            return Err(AppError::NotFound(format!("role template {role_template_id}")));
        };

        let updated = RoleTemplate::new(
            role_template_id,
            NonEmptyString::new(existing.key()).unwrap_or_else(|_| unreachable!()),
            input.label,
            input.enabled,
            input.description,
        );
        state.templates.insert(
            role_template_id,
            (updated.clone(), input.permission_keys.clone()),
        );
        Ok(RoleTemplateWithKeys {
            template: updated,
            permission_keys: input.permission_keys,
        })
    }

    async fn save_account_override(
        &self,
        user_id: UserId,
        input: SaveAccountOverrideInput,
    ) -> AppResult<AccountOverride> {
        let mut state = self.state.lock().await;
        state.override_saves += 1;
        if let Some(error) = &state.save_error {
            return Err(error.clone());
        }

        let role_template_id = state
            .assigned_template_on_save
            .unwrap_or(input.role_template_id);
        let saved = AccountOverride {
            user_id,
            snapshot: AccountOverrideSnapshot::new(
                role_template_id,
                OverrideDelta::new(input.add_keys, input.remove_keys),
            ),
        };
        state.overrides.insert(user_id, saved.clone());
        Ok(saved)
    }

    async fn create_role_template(
        &self,
        input: CreateRoleTemplateInput,
    ) -> AppResult<RoleTemplate> {
        let mut state = self.state.lock().await;
        let next_id = state
            .templates
            .keys()
            .map(RoleTemplateId::as_i64)
            .max()
            .unwrap_or(0)
            + 1;
        let key = input.key.unwrap_or_else(|| format!("role_{next_id}"));
        let created = RoleTemplate::new(
            RoleTemplateId::new(next_id),
            NonEmptyString::new(key)?,
            input.label,
            input.enabled,
            input.description,
        );
        state
            .templates
            .insert(created.id(), (created.clone(), PermissionKeySet::new()));
        Ok(created)
    }

    async fn clone_role_template(
        &self,
        role_template_id: RoleTemplateId,
    ) -> AppResult<RoleTemplate> {
        Err(AppError::Internal(format!(
            "clone of {role_template_id} is not supported by the fake"
        )))
    }

    async fn delete_role_template(&self, role_template_id: RoleTemplateId) -> AppResult<()> {
        self.state
            .lock()
            .await
            .templates
            .remove(&role_template_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("role template {role_template_id}")))
    }
}

/// Audit log fake keeping events in memory, optionally refusing writes.
#[derive(Default)]
pub(crate) struct FakeAuditLogRepository {
    pub fail_writes: Mutex<bool>,
    pub events: Mutex<Vec<PermissionAuditEvent>>,
}

impl FakeAuditLogRepository {
    /// Returns the recorded actions in write order.
    pub(crate) async fn actions(&self) -> Vec<PermissionAuditAction> {
        self.events
            .lock()
            .await
            .iter()
            .map(|event| event.action)
            .collect()
    }
}

#[async_trait]
impl AuditLogRepository for FakeAuditLogRepository {
    async fn append_event(&self, event: PermissionAuditEvent) -> AppResult<()> {
        if *self.fail_writes.lock().await {
            return Err(AppError::Internal("audit store offline".to_owned()));
        }
        self.events.lock().await.push(event);
        Ok(())
    }

    async fn list_recent_entries(
        &self,
        query: AuditLogQuery,
    ) -> AppResult<Vec<PermissionAuditEntry>> {
        let events = self.events.lock().await;
        Ok(events
            .iter()
            .enumerate()
            .rev()
            .map(|(index, event)| PermissionAuditEntry {
                event_id: i64::try_from(index).unwrap_or_default() + 1,
                action: event.action,
                target_type: event.target_type,
                target_id: event.target_id,
                target_key: event.target_key.clone(),
                note: event.note.clone(),
                created_at: "2026-01-01T00:00:00Z".to_owned(),
            })
            .filter(|entry| query.matches(entry))
            .take(query.limit)
            .collect())
    }
}

/// Recorder writing into the given audit fake.
pub(crate) fn audit_recorder(audit: &Arc<FakeAuditLogRepository>) -> AuditRecorder {
    AuditRecorder::new(Arc::clone(audit) as Arc<dyn AuditLogRepository>)
}
