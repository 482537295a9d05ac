use super::*;

pub async fn module_registry_handler(
    State(state): State<AppState>,
) -> Json<ModuleRegistryResponse> {
    Json(ModuleRegistryResponse::from(
        state.permission_admin_service.module_registry(),
    ))
}

pub async fn resolve_module_selection_handler(
    State(state): State<AppState>,
    Json(payload): Json<ResolveModuleSelectionRequest>,
) -> Json<ModuleSelectionResponse> {
    let preview = state
        .permission_admin_service
        .preview_module_selection(&payload.selected);

    Json(ModuleSelectionResponse::from(preview))
}

pub async fn resolve_module_by_path_handler(
    State(state): State<AppState>,
    Query(query): Query<ModuleMatchQuery>,
) -> Json<ModuleMatchResponse> {
    let module_match = state
        .permission_admin_service
        .module_registry()
        .resolve_module_by_path(&query.path);

    Json(ModuleMatchResponse::from(module_match))
}
