use super::*;

pub async fn list_role_templates_handler(
    State(state): State<AppState>,
    Query(query): Query<ListRoleTemplatesQuery>,
) -> ApiResult<Json<Vec<RoleTemplateResponse>>> {
    let templates = state
        .permission_admin_service
        .list_role_templates(query.enabled_only.unwrap_or(false))
        .await?
        .into_iter()
        .map(RoleTemplateResponse::from)
        .collect();

    Ok(Json(templates))
}

pub async fn create_role_template_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoleTemplateRequest>,
) -> ApiResult<(StatusCode, Json<RoleTemplateResponse>)> {
    let template = state
        .permission_admin_service
        .create_role_template(CreateRoleTemplateInput {
            key: payload.key,
            label: NonEmptyString::new(payload.label)?,
            enabled: payload.enabled.unwrap_or(true),
            description: payload.description,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(RoleTemplateResponse::from(template))))
}

pub async fn save_role_template_handler(
    State(state): State<AppState>,
    Path(role_template_id): Path<i64>,
    Json(payload): Json<SaveRoleTemplateRequest>,
) -> ApiResult<Json<RoleTemplateWithKeysResponse>> {
    let saved = state
        .permission_admin_service
        .save_role_template(
            RoleTemplateId::new(role_template_id),
            SaveRoleTemplateInput {
                label: NonEmptyString::new(payload.label)?,
                enabled: payload.enabled,
                permission_keys: parse_permission_keys(&payload.permission_keys)?,
                description: payload.description,
            },
        )
        .await?;

    Ok(Json(RoleTemplateWithKeysResponse::from(saved)))
}

pub async fn clone_role_template_handler(
    State(state): State<AppState>,
    Path(role_template_id): Path<i64>,
) -> ApiResult<(StatusCode, Json<RoleTemplateResponse>)> {
    let template = state
        .permission_admin_service
        .clone_role_template(RoleTemplateId::new(role_template_id))
        .await?;

    Ok((StatusCode::CREATED, Json(RoleTemplateResponse::from(template))))
}

pub async fn delete_role_template_handler(
    State(state): State<AppState>,
    Path(role_template_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state
        .permission_admin_service
        .delete_role_template(RoleTemplateId::new(role_template_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn role_template_keys_handler(
    State(state): State<AppState>,
    Path(role_template_id): Path<i64>,
) -> ApiResult<Json<RolePermissionKeysResponse>> {
    let role_template_id = RoleTemplateId::new(role_template_id);
    let keys = state
        .permission_admin_service
        .role_template_keys(role_template_id)
        .await?;

    Ok(Json(RolePermissionKeysResponse::new(role_template_id, &keys)))
}
