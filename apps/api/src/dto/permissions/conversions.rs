use std::collections::BTreeMap;

use acctperm_application::{
    EffectiveOverrideView, ModuleSelectionPreview, PermissionAuditEntry, RoleTemplateWithKeys,
};
use acctperm_domain::{
    ActionDefinition, DependencyReason, ModuleMatch, ModuleNode, ModuleRegistry, PermissionKeySet,
    PermissionTree, RoleTemplate, RoleTemplateId,
};

use super::types::{
    AccountOverrideResponse, ActionDefinitionDto, AuditLogEntryResponse, DependencyReasonDto,
    ModuleGroupDto, ModuleMatchResponse, ModuleNodeDto, ModuleRegistryResponse,
    ModuleSelectionResponse, PermissionTreeResponse, RegisteredModuleDto,
    RolePermissionKeysResponse, RoleTemplateResponse, RoleTemplateWithKeysResponse,
};

fn key_strings(keys: &PermissionKeySet) -> Vec<String> {
    keys.iter().map(|key| key.as_str().to_owned()).collect()
}

impl From<&ActionDefinition> for ActionDefinitionDto {
    fn from(value: &ActionDefinition) -> Self {
        Self {
            key: value.key.as_str().to_owned(),
            label: value.label.clone(),
        }
    }
}

impl From<&ModuleNode> for ModuleNodeDto {
    fn from(value: &ModuleNode) -> Self {
        Self {
            key: value.key().to_owned(),
            label: value.label().to_owned(),
            actions: value
                .actions()
                .iter()
                .map(|action| action.as_str().to_owned())
                .collect(),
            children: value.children().iter().map(Self::from).collect(),
        }
    }
}

impl From<&PermissionTree> for PermissionTreeResponse {
    fn from(value: &PermissionTree) -> Self {
        Self {
            actions: value
                .actions()
                .iter()
                .map(ActionDefinitionDto::from)
                .collect(),
            modules: value.modules().iter().map(ModuleNodeDto::from).collect(),
        }
    }
}

impl From<RoleTemplate> for RoleTemplateResponse {
    fn from(value: RoleTemplate) -> Self {
        Self {
            id: value.id().as_i64(),
            key: value.key().to_owned(),
            label: value.label().to_owned(),
            enabled: value.enabled(),
            description: value.description().map(ToOwned::to_owned),
        }
    }
}

impl From<RoleTemplateWithKeys> for RoleTemplateWithKeysResponse {
    fn from(value: RoleTemplateWithKeys) -> Self {
        Self {
            permission_keys: key_strings(&value.permission_keys),
            template: RoleTemplateResponse::from(value.template),
        }
    }
}

impl RolePermissionKeysResponse {
    /// Creates a response listing the keys of one template.
    #[must_use]
    pub fn new(role_template_id: RoleTemplateId, permission_keys: &PermissionKeySet) -> Self {
        Self {
            role_template_id: role_template_id.as_i64(),
            permission_keys: key_strings(permission_keys),
        }
    }
}

impl From<EffectiveOverrideView> for AccountOverrideResponse {
    fn from(value: EffectiveOverrideView) -> Self {
        let delta = value.account_override.delta();
        Self {
            user_id: value.account_override.user_id.as_i64(),
            role_template_id: value
                .account_override
                .role_template_id()
                .map(|role_template_id| role_template_id.as_i64()),
            add_keys: key_strings(delta.add_keys()),
            remove_keys: key_strings(delta.remove_keys()),
            template_keys: key_strings(&value.template_keys),
            effective_keys: key_strings(&value.effective_keys),
        }
    }
}

impl From<DependencyReason> for DependencyReasonDto {
    fn from(value: DependencyReason) -> Self {
        Self {
            because: value.because,
            added_because_of_this: value.added_because_of_this,
        }
    }
}

impl From<ModuleSelectionPreview> for ModuleSelectionResponse {
    fn from(value: ModuleSelectionPreview) -> Self {
        Self {
            effective: value.closure.effective.into_iter().collect(),
            added: value.closure.added.into_iter().collect(),
            reasons: value
                .closure
                .reasons
                .into_iter()
                .map(DependencyReasonDto::from)
                .collect(),
            messages: value.messages,
        }
    }
}

impl From<&ModuleRegistry> for ModuleRegistryResponse {
    fn from(value: &ModuleRegistry) -> Self {
        let mut dependencies: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (module_id, target) in value.dependencies().edges() {
            dependencies
                .entry(module_id.to_owned())
                .or_default()
                .push(target.to_owned());
        }

        Self {
            groups: value
                .groups()
                .iter()
                .map(|group| ModuleGroupDto {
                    id: group.id.clone(),
                    label: group.label.clone(),
                    modules: group
                        .modules
                        .iter()
                        .map(|module| RegisteredModuleDto {
                            id: module.id.clone(),
                            label: module.label.clone(),
                            route_prefixes: module.route_prefixes.clone(),
                        })
                        .collect(),
                })
                .collect(),
            dependencies,
        }
    }
}

impl From<ModuleMatch> for ModuleMatchResponse {
    fn from(value: ModuleMatch) -> Self {
        Self {
            module_id: value.module_id,
            module_label: value.module_label,
            group_label: value.group_label,
        }
    }
}

impl From<PermissionAuditEntry> for AuditLogEntryResponse {
    fn from(value: PermissionAuditEntry) -> Self {
        Self {
            event_id: value.event_id,
            action_type: value.action.as_str().to_owned(),
            target_type: value.target_type.as_str().to_owned(),
            target_id: value.target_id,
            target_key: value.target_key,
            note: value.note,
            created_at: value.created_at,
        }
    }
}
