use acctperm_core::AppError;
use acctperm_infrastructure::PERMISSION_ADMIN_BASE_PATH;
use axum::Router;
use axum::routing::{delete, get, post, put};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

mod cors;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let permission_routes = Router::new()
        .route(
            "/permission-tree",
            get(handlers::permissions::permission_tree_handler),
        )
        .route(
            "/permission-tree/refresh",
            post(handlers::permissions::refresh_permission_tree_handler),
        )
        .route(
            "/roles",
            get(handlers::permissions::list_role_templates_handler)
                .post(handlers::permissions::create_role_template_handler),
        )
        .route(
            "/roles/{role_template_id}",
            delete(handlers::permissions::delete_role_template_handler),
        )
        .route(
            "/roles/{role_template_id}/template",
            put(handlers::permissions::save_role_template_handler),
        )
        .route(
            "/roles/{role_template_id}/clone",
            post(handlers::permissions::clone_role_template_handler),
        )
        .route(
            "/roles/{role_template_id}/permissions",
            get(handlers::permissions::role_template_keys_handler),
        )
        .route(
            "/accounts/{user_id}/override",
            get(handlers::permissions::account_override_handler)
                .put(handlers::permissions::save_account_override_handler),
        )
        .route(
            "/accounts/{user_id}/permission-check",
            get(handlers::permissions::permission_check_handler),
        )
        .route(
            "/audit-log",
            get(handlers::permissions::audit_log_handler),
        )
        .route(
            "/module-registry",
            get(handlers::permissions::module_registry_handler),
        )
        .route(
            "/module-registry/match",
            get(handlers::permissions::resolve_module_by_path_handler),
        )
        .route(
            "/module-selection/resolve",
            post(handlers::permissions::resolve_module_selection_handler),
        );

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .nest(PERMISSION_ADMIN_BASE_PATH, permission_routes)
        .layer(cors::build_cors_layer(frontend_url)?)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
