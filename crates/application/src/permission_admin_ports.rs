mod audit;
mod inputs;
mod repositories;

pub use audit::{
    AuditLogQuery, AuditLogRepository, DEFAULT_AUDIT_LOG_LIMIT, MAX_AUDIT_LOG_LIMIT,
    PermissionAuditEntry, PermissionAuditEvent, clamp_audit_log_limit,
};
pub use inputs::{
    CreateRoleTemplateInput, RoleTemplateWithKeys, SaveAccountOverrideInput,
    SaveRoleTemplateInput,
};
pub use repositories::PermissionAdminRepository;
