use async_trait::async_trait;
use acctperm_application::{
    CreateRoleTemplateInput, PermissionAdminRepository, RoleTemplateWithKeys,
    SaveAccountOverrideInput, SaveRoleTemplateInput,
};
use acctperm_core::{AppError, AppResult};
use acctperm_domain::{
    AccountOverride, PermissionKeySet, PermissionTree, RoleTemplate, RoleTemplateId, UserId,
};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Base path of the permission administration routes.
pub const PERMISSION_ADMIN_BASE_PATH: &str = "/api/v1/admin/account-permissions";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PermissionKeysBody {
    permission_keys: PermissionKeySet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleTemplateWithKeysBody {
    template: RoleTemplate,
    permission_keys: PermissionKeySet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveRoleTemplateBody<'a> {
    label: &'a str,
    enabled: bool,
    permission_keys: &'a PermissionKeySet,
    description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveAccountOverrideBody<'a> {
    role_template_id: Option<RoleTemplateId>,
    add_keys: &'a PermissionKeySet,
    remove_keys: &'a PermissionKeySet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoleTemplateBody<'a> {
    key: Option<&'a str>,
    label: &'a str,
    enabled: bool,
    description: Option<&'a str>,
}

/// Permission administration backend reached over its HTTP API.
#[derive(Debug, Clone)]
pub struct HttpPermissionAdminRepository {
    http_client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpPermissionAdminRepository {
    /// Creates a client for the backend at `base_url`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        bearer_token: Option<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            bearer_token: bearer_token.filter(|token| !token.trim().is_empty()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{PERMISSION_ADMIN_BASE_PATH}{path}", self.base_url)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http_client.request(method, self.url(path));
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> AppResult<reqwest::Response> {
        let response = builder.send().await.map_err(|error| {
            AppError::Internal(format!("permission backend request failed: {error}"))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = error_from_status(status, &body);
        warn!(status = status.as_u16(), error = %error, "permission backend rejected request");
        Err(error)
    }

    async fn send_json<T>(&self, builder: reqwest::RequestBuilder) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        self.send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|error| {
                AppError::Internal(format!("permission backend returned invalid JSON: {error}"))
            })
    }
}

/// Maps a failed backend response to the matching application error.
///
/// The `{ "message" }` body is used when present, otherwise the raw body or the
/// status reason.
#[must_use]
pub fn error_from_status(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.message)
        .ok()
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_owned()
        });

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::Validation(message)
        }
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
        StatusCode::FORBIDDEN => AppError::Forbidden(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        _ => AppError::Internal(format!("status {}: {message}", status.as_u16())),
    }
}

#[async_trait]
impl PermissionAdminRepository for HttpPermissionAdminRepository {
    async fn fetch_permission_tree(&self) -> AppResult<PermissionTree> {
        debug!("fetching permission tree from backend");
        self.send_json(self.request(reqwest::Method::GET, "/permission-tree"))
            .await
    }

    async fn list_role_templates(&self, enabled_only: bool) -> AppResult<Vec<RoleTemplate>> {
        let path = if enabled_only {
            "/roles?enabledOnly=true"
        } else {
            "/roles"
        };
        self.send_json(self.request(reqwest::Method::GET, path))
            .await
    }

    async fn fetch_role_template_keys(
        &self,
        role_template_id: RoleTemplateId,
    ) -> AppResult<PermissionKeySet> {
        let body: PermissionKeysBody = self
            .send_json(self.request(
                reqwest::Method::GET,
                &format!("/roles/{role_template_id}/permissions"),
            ))
            .await?;
        Ok(body.permission_keys)
    }

    async fn fetch_account_override(&self, user_id: UserId) -> AppResult<AccountOverride> {
        self.send_json(self.request(
            reqwest::Method::GET,
            &format!("/accounts/{user_id}/override"),
        ))
        .await
    }

    async fn save_role_template(
        &self,
        role_template_id: RoleTemplateId,
        input: SaveRoleTemplateInput,
    ) -> AppResult<RoleTemplateWithKeys> {
        let body = SaveRoleTemplateBody {
            label: input.label.as_str(),
            enabled: input.enabled,
            permission_keys: &input.permission_keys,
            description: input.description.as_deref(),
        };
        let saved: RoleTemplateWithKeysBody = self
            .send_json(
                self.request(
                    reqwest::Method::PUT,
                    &format!("/roles/{role_template_id}/template"),
                )
                .json(&body),
            )
            .await?;

        Ok(RoleTemplateWithKeys {
            template: saved.template,
            permission_keys: saved.permission_keys,
        })
    }

    async fn save_account_override(
        &self,
        user_id: UserId,
        input: SaveAccountOverrideInput,
    ) -> AppResult<AccountOverride> {
        let body = SaveAccountOverrideBody {
            role_template_id: input.role_template_id,
            add_keys: &input.add_keys,
            remove_keys: &input.remove_keys,
        };
        self.send_json(
            self.request(
                reqwest::Method::PUT,
                &format!("/accounts/{user_id}/override"),
            )
            .json(&body),
        )
        .await
    }

    async fn create_role_template(
        &self,
        input: CreateRoleTemplateInput,
    ) -> AppResult<RoleTemplate> {
        let body = CreateRoleTemplateBody {
            key: input.key.as_deref(),
            label: input.label.as_str(),
            enabled: input.enabled,
            description: input.description.as_deref(),
        };
        self.send_json(self.request(reqwest::Method::POST, "/roles").json(&body))
            .await
    }

    async fn clone_role_template(
        &self,
        role_template_id: RoleTemplateId,
    ) -> AppResult<RoleTemplate> {
        self.send_json(self.request(
            reqwest::Method::POST,
            &format!("/roles/{role_template_id}/clone"),
        ))
        .await
    }

    async fn delete_role_template(&self, role_template_id: RoleTemplateId) -> AppResult<()> {
        self.send(self.request(
            reqwest::Method::DELETE,
            &format!("/roles/{role_template_id}"),
        ))
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use acctperm_core::{AppError, Recovery};
    use http::StatusCode;

    use super::{HttpPermissionAdminRepository, error_from_status};

    #[test]
    fn statuses_map_to_error_variants() {
        let body = r#"{"message":"role template 4 does not exist"}"#;

        assert_eq!(
            error_from_status(StatusCode::NOT_FOUND, body),
            AppError::NotFound("role template 4 does not exist".to_owned())
        );
        assert!(matches!(
            error_from_status(StatusCode::BAD_REQUEST, body),
            AppError::Validation(_)
        ));
        assert!(matches!(
            error_from_status(StatusCode::CONFLICT, body),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            error_from_status(StatusCode::UNAUTHORIZED, body),
            AppError::Unauthorized(_)
        ));
        assert_eq!(
            error_from_status(StatusCode::FORBIDDEN, "").recovery(),
            Recovery::ReadOnly
        );
    }

    #[test]
    fn unexpected_status_is_internal_with_raw_body() {
        let error = error_from_status(StatusCode::BAD_GATEWAY, "upstream down");

        assert_eq!(
            error,
            AppError::Internal("status 502: upstream down".to_owned())
        );
    }

    #[test]
    fn empty_body_falls_back_to_status_reason() {
        let error = error_from_status(StatusCode::FORBIDDEN, "  ");

        assert_eq!(error, AppError::Forbidden("Forbidden".to_owned()));
    }

    #[test]
    fn urls_are_joined_under_base_path() {
        let repository = HttpPermissionAdminRepository::new(
            reqwest::Client::new(),
            "http://localhost:3001/",
            Some("   ".to_owned()),
        );

        assert_eq!(
            repository.url("/roles/3/clone"),
            "http://localhost:3001/api/v1/admin/account-permissions/roles/3/clone"
        );
        assert!(repository.bearer_token.is_none());
    }
}
