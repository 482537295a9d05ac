use super::*;

pub async fn audit_log_handler(
    State(state): State<AppState>,
    Query(query): Query<AuditLogQueryParams>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    let query = AuditLogQuery {
        limit: query
            .limit
            .map_or(DEFAULT_AUDIT_LOG_LIMIT, clamp_audit_log_limit),
        action: non_blank(query.action_type)
            .map(|value| value.parse::<PermissionAuditAction>())
            .transpose()?,
        target_type: non_blank(query.target_type)
            .map(|value| value.parse::<AuditTargetType>())
            .transpose()?,
        target_id: query.target_id,
    };

    let entries = state
        .permission_admin_service
        .list_audit_log(query)
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
