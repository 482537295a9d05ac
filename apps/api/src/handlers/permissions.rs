use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use acctperm_application::{
    AuditLogQuery, CreateRoleTemplateInput, DEFAULT_AUDIT_LOG_LIMIT, SaveAccountOverrideInput,
    SaveRoleTemplateInput, clamp_audit_log_limit,
};
use acctperm_core::NonEmptyString;
use acctperm_domain::{
    AuditTargetType, PermissionAuditAction, RoleTemplateId, UserId, parse_permission_keys,
};

use crate::dto::{
    AccountOverrideResponse, AuditLogEntryResponse, AuditLogQueryParams,
    CreateRoleTemplateRequest, ListRoleTemplatesQuery, ModuleMatchQuery, ModuleMatchResponse,
    ModuleRegistryResponse, ModuleSelectionResponse, PermissionCheckQuery,
    PermissionCheckResponse, PermissionTreeResponse, ResolveModuleSelectionRequest,
    RolePermissionKeysResponse, RoleTemplateResponse, RoleTemplateWithKeysResponse,
    SaveAccountOverrideRequest, SaveRoleTemplateRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod accounts;
mod audit;
mod modules;
mod roles;
mod tree;

pub use accounts::{
    account_override_handler, permission_check_handler, save_account_override_handler,
};
pub use audit::audit_log_handler;
pub use modules::{
    module_registry_handler, resolve_module_by_path_handler, resolve_module_selection_handler,
};
pub use roles::{
    clone_role_template_handler, create_role_template_handler, delete_role_template_handler,
    list_role_templates_handler, role_template_keys_handler, save_role_template_handler,
};
pub use tree::{permission_tree_handler, refresh_permission_tree_handler};
