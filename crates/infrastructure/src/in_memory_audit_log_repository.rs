use async_trait::async_trait;
use acctperm_application::{
    AuditLogQuery, AuditLogRepository, PermissionAuditEntry, PermissionAuditEvent,
};
use acctperm_core::AppResult;
use chrono::{SecondsFormat, Utc};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct AuditLogState {
    next_event_id: i64,
    entries: Vec<PermissionAuditEntry>,
}

/// Append-only in-memory permission audit log.
#[derive(Debug, Default)]
pub struct InMemoryAuditLogRepository {
    state: RwLock<AuditLogState>,
}

impl InMemoryAuditLogRepository {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn append_event(&self, event: PermissionAuditEvent) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.next_event_id += 1;
        let entry = PermissionAuditEntry {
            event_id: state.next_event_id,
            action: event.action,
            target_type: event.target_type,
            target_id: event.target_id,
            target_key: event.target_key,
            note: event.note,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        debug!(
            event_id = entry.event_id,
            action = entry.action.as_str(),
            target_id = entry.target_id,
            "permission audit entry appended"
        );
        state.entries.push(entry);
        Ok(())
    }

    async fn list_recent_entries(
        &self,
        query: AuditLogQuery,
    ) -> AppResult<Vec<PermissionAuditEntry>> {
        Ok(self
            .state
            .read()
            .await
            .entries
            .iter()
            .rev()
            .filter(|entry| query.matches(entry))
            .take(query.limit)
            .cloned()
            .collect())
    }
}
