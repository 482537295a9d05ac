//! Infrastructure adapters for the permission administration port.

#![forbid(unsafe_code)]

mod http_permission_admin_repository;
mod in_memory_audit_log_repository;
mod in_memory_permission_admin_repository;

pub use http_permission_admin_repository::{
    HttpPermissionAdminRepository, PERMISSION_ADMIN_BASE_PATH, error_from_status,
};
pub use in_memory_audit_log_repository::InMemoryAuditLogRepository;
pub use in_memory_permission_admin_repository::{
    InMemoryPermissionAdminRepository, ROLE_KEY_PREFIX, is_generated_role_key,
};
