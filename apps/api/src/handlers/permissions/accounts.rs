use super::*;

pub async fn account_override_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<AccountOverrideResponse>> {
    let view = state
        .permission_admin_service
        .account_effective_keys(UserId::new(user_id))
        .await?;

    Ok(Json(AccountOverrideResponse::from(view)))
}

pub async fn save_account_override_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<SaveAccountOverrideRequest>,
) -> ApiResult<Json<AccountOverrideResponse>> {
    let view = state
        .permission_admin_service
        .save_account_override(
            UserId::new(user_id),
            SaveAccountOverrideInput {
                role_template_id: payload.role_template_id.map(RoleTemplateId::new),
                add_keys: parse_permission_keys(&payload.add_keys)?,
                remove_keys: parse_permission_keys(&payload.remove_keys)?,
            },
        )
        .await?;

    Ok(Json(AccountOverrideResponse::from(view)))
}

pub async fn permission_check_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<PermissionCheckQuery>,
) -> ApiResult<Json<PermissionCheckResponse>> {
    state
        .permission_admin_service
        .require_permission(UserId::new(user_id), &query.permission_key)
        .await?;

    Ok(Json(PermissionCheckResponse {
        user_id,
        permission_key: query.permission_key.trim().to_owned(),
        allowed: true,
    }))
}
