//! Account permission administration API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dev_seed;
mod dto;
mod error;
mod handlers;
mod state;

use std::sync::Arc;

use acctperm_application::PermissionAdminService;
use acctperm_core::AppError;
use acctperm_infrastructure::InMemoryAuditLogRepository;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;
    let seed = dev_seed::load_seed_document(config.seed_file.as_deref())?;
    let (repository, module_registry) = dev_seed::build_repository(seed).await?;

    let permission_admin_service = PermissionAdminService::new(
        Arc::new(repository),
        Arc::new(InMemoryAuditLogRepository::new()),
        module_registry,
    );
    let tree = permission_admin_service.permission_tree().await?;
    info!(
        modules = tree.nodes().count(),
        keys = tree.all_keys().len(),
        "permission tree loaded"
    );

    let app = api_router::build_router(
        AppState {
            permission_admin_service,
        },
        &config.frontend_url,
    )?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;
    info!(%address, "account permission api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server failed: {error}")))
}
