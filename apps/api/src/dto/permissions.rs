mod conversions;
mod types;

pub use types::{
    AccountOverrideResponse, ActionDefinitionDto, AuditLogEntryResponse, AuditLogQueryParams,
    CreateRoleTemplateRequest, DependencyReasonDto, ListRoleTemplatesQuery, ModuleGroupDto,
    ModuleMatchQuery, ModuleMatchResponse, ModuleNodeDto, ModuleRegistryResponse,
    ModuleSelectionResponse, PermissionCheckQuery, PermissionCheckResponse, PermissionTreeResponse,
    RegisteredModuleDto, ResolveModuleSelectionRequest, RolePermissionKeysResponse,
    RoleTemplateResponse, RoleTemplateWithKeysResponse, SaveAccountOverrideRequest,
    SaveRoleTemplateRequest,
};
