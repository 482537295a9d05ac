use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Action catalog entry served with the permission tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/action-definition-dto.ts"
)]
pub struct ActionDefinitionDto {
    pub key: String,
    pub label: String,
}

/// API representation of one module node and its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/module-node-dto.ts"
)]
pub struct ModuleNodeDto {
    pub key: String,
    pub label: String,
    pub actions: Vec<String>,
    pub children: Vec<ModuleNodeDto>,
}

/// API representation of the permission tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-tree-response.ts"
)]
pub struct PermissionTreeResponse {
    pub actions: Vec<ActionDefinitionDto>,
    pub modules: Vec<ModuleNodeDto>,
}

/// Query parameters for role template listing.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/list-role-templates-query.ts"
)]
pub struct ListRoleTemplatesQuery {
    #[serde(default)]
    pub enabled_only: Option<bool>,
}

/// API representation of a role template summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-template-response.ts"
)]
pub struct RoleTemplateResponse {
    pub id: i64,
    pub key: String,
    pub label: String,
    pub enabled: bool,
    pub description: Option<String>,
}

/// Incoming payload for role template creation.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-role-template-request.ts"
)]
pub struct CreateRoleTemplateRequest {
    #[serde(default)]
    pub key: Option<String>,
    pub label: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Incoming payload for a full role template replacement.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/save-role-template-request.ts"
)]
pub struct SaveRoleTemplateRequest {
    pub label: String,
    pub enabled: bool,
    #[serde(default)]
    pub permission_keys: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Saved role template with its keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-template-with-keys-response.ts"
)]
pub struct RoleTemplateWithKeysResponse {
    pub template: RoleTemplateResponse,
    pub permission_keys: Vec<String>,
}

/// Keys granted by one role template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-permission-keys-response.ts"
)]
pub struct RolePermissionKeysResponse {
    pub role_template_id: i64,
    pub permission_keys: Vec<String>,
}

/// Account override with its resolved effective keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/account-override-response.ts"
)]
pub struct AccountOverrideResponse {
    pub user_id: i64,
    pub role_template_id: Option<i64>,
    pub add_keys: Vec<String>,
    pub remove_keys: Vec<String>,
    pub template_keys: Vec<String>,
    pub effective_keys: Vec<String>,
}

/// Incoming payload for a full account override replacement.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/save-account-override-request.ts"
)]
pub struct SaveAccountOverrideRequest {
    #[serde(default)]
    pub role_template_id: Option<i64>,
    #[serde(default)]
    pub add_keys: Vec<String>,
    #[serde(default)]
    pub remove_keys: Vec<String>,
}

/// Incoming raw module selection.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/resolve-module-selection-request.ts"
)]
pub struct ResolveModuleSelectionRequest {
    #[serde(default)]
    pub selected: Vec<String>,
}

/// One first-level attribution of automatically added modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/dependency-reason-dto.ts"
)]
pub struct DependencyReasonDto {
    pub because: String,
    pub added_because_of_this: Vec<String>,
}

/// Expanded module selection with labelled reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/module-selection-response.ts"
)]
pub struct ModuleSelectionResponse {
    pub effective: Vec<String>,
    pub added: Vec<String>,
    pub reasons: Vec<DependencyReasonDto>,
    pub messages: Vec<String>,
}

/// Selectable module with its route prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/registered-module-dto.ts"
)]
pub struct RegisteredModuleDto {
    pub id: String,
    pub label: String,
    pub route_prefixes: Vec<String>,
}

/// Display group of selectable modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/module-group-dto.ts"
)]
pub struct ModuleGroupDto {
    pub id: String,
    pub label: String,
    pub modules: Vec<RegisteredModuleDto>,
}

/// Module registry with its dependency rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/module-registry-response.ts"
)]
pub struct ModuleRegistryResponse {
    pub groups: Vec<ModuleGroupDto>,
    pub dependencies: BTreeMap<String, Vec<String>>,
}

/// Query parameters for route ownership lookup.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/module-match-query.ts"
)]
pub struct ModuleMatchQuery {
    pub path: String,
}

/// Module owning a route path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/module-match-response.ts"
)]
pub struct ModuleMatchResponse {
    pub module_id: String,
    pub module_label: String,
    pub group_label: String,
}

/// Query parameters for the permission audit log.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-query.ts"
)]
pub struct AuditLogQueryParams {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub target_type: Option<String>,
    #[serde(default)]
    pub target_id: Option<i64>,
}

/// One permission audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    pub event_id: i64,
    pub action_type: String,
    pub target_type: String,
    pub target_id: i64,
    pub target_key: Option<String>,
    pub note: Option<String>,
    pub created_at: String,
}

/// Query parameters for an account permission check.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-check-query.ts"
)]
pub struct PermissionCheckQuery {
    #[serde(default)]
    pub permission_key: String,
}

/// Successful account permission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-check-response.ts"
)]
pub struct PermissionCheckResponse {
    pub user_id: i64,
    pub permission_key: String,
    pub allowed: bool,
}
