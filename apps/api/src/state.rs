use acctperm_application::PermissionAdminService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub permission_admin_service: PermissionAdminService,
}
