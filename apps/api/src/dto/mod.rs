mod common;
mod permissions;

pub use common::HealthResponse;
pub use permissions::{
    AccountOverrideResponse, ActionDefinitionDto, AuditLogEntryResponse, AuditLogQueryParams,
    CreateRoleTemplateRequest, DependencyReasonDto, ListRoleTemplatesQuery, ModuleGroupDto,
    ModuleMatchQuery, ModuleMatchResponse, ModuleNodeDto, ModuleRegistryResponse,
    ModuleSelectionResponse, PermissionCheckQuery, PermissionCheckResponse, PermissionTreeResponse,
    RegisteredModuleDto, ResolveModuleSelectionRequest, RolePermissionKeysResponse,
    RoleTemplateResponse, RoleTemplateWithKeysResponse, SaveAccountOverrideRequest,
    SaveRoleTemplateRequest,
};
