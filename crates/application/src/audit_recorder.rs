use std::sync::Arc;

use tracing::warn;

use crate::permission_admin_ports::{AuditLogRepository, PermissionAuditEvent};

/// Best-effort writer for the permission audit log.
///
/// A failed write is logged and swallowed so the change it describes still succeeds.
#[derive(Clone)]
pub struct AuditRecorder {
    repository: Arc<dyn AuditLogRepository>,
}

impl AuditRecorder {
    /// Creates a recorder over an audit log repository.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditLogRepository>) -> Self {
        Self { repository }
    }

    /// Appends one event, logging instead of failing when the write is refused.
    pub async fn record(&self, event: PermissionAuditEvent) {
        let action = event.action;
        let target_id = event.target_id;
        if let Err(error) = self.repository.append_event(event).await {
            warn!(
                action = action.as_str(),
                target_id,
                error = %error,
                "permission audit write failed"
            );
        }
    }
}
