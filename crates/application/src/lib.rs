//! Application services, editor sessions and ports for account permissions.

#![forbid(unsafe_code)]

mod account_override_editor;
mod audit_recorder;
mod permission_admin_ports;
mod permission_admin_service;
mod role_template_editor;

#[cfg(test)]
mod test_fakes;

pub use account_override_editor::AccountOverrideEditor;
pub use audit_recorder::AuditRecorder;
pub use permission_admin_ports::{
    AuditLogQuery, AuditLogRepository, CreateRoleTemplateInput, DEFAULT_AUDIT_LOG_LIMIT,
    MAX_AUDIT_LOG_LIMIT, PermissionAdminRepository, PermissionAuditEntry, PermissionAuditEvent,
    RoleTemplateWithKeys, SaveAccountOverrideInput, SaveRoleTemplateInput,
    clamp_audit_log_limit,
};
pub use permission_admin_service::{
    EffectiveOverrideView, ModuleSelectionPreview, PermissionAdminService, TreeAccess,
};
pub use role_template_editor::RoleTemplateEditor;
