use super::*;

pub async fn permission_tree_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<PermissionTreeResponse>> {
    let tree = state.permission_admin_service.permission_tree().await?;

    Ok(Json(PermissionTreeResponse::from(tree.as_ref())))
}

pub async fn refresh_permission_tree_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<PermissionTreeResponse>> {
    let tree = state
        .permission_admin_service
        .refresh_permission_tree()
        .await?;

    Ok(Json(PermissionTreeResponse::from(tree.as_ref())))
}
