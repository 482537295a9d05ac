use async_trait::async_trait;

use acctperm_core::AppResult;
use acctperm_domain::{
    AuditTargetType, PermissionAuditAction, RoleTemplate, UserId, truncate_audit_note,
};

/// Rows returned when a listing does not ask for a limit.
pub const DEFAULT_AUDIT_LOG_LIMIT: usize = 50;

/// Most rows a single listing may return.
pub const MAX_AUDIT_LOG_LIMIT: usize = 200;

/// Clamps a requested row count into `1..=MAX_AUDIT_LOG_LIMIT`.
#[must_use]
pub fn clamp_audit_log_limit(requested: i64) -> usize {
    let clamped = requested.clamp(1, MAX_AUDIT_LOG_LIMIT as i64);
    usize::try_from(clamped).unwrap_or(MAX_AUDIT_LOG_LIMIT)
}

/// Audit event payload emitted after a successful administration write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionAuditEvent {
    /// What changed.
    pub action: PermissionAuditAction,
    /// Kind of record that changed.
    pub target_type: AuditTargetType,
    /// Template or account identifier.
    pub target_id: i64,
    /// Stable key of the target, when it has one.
    pub target_key: Option<String>,
    /// Short free-form summary, cut to the note limit.
    pub note: Option<String>,
}

impl PermissionAuditEvent {
    /// Builds an event for a change to a role template.
    #[must_use]
    pub fn role_template(
        action: PermissionAuditAction,
        template: &RoleTemplate,
        note: Option<String>,
    ) -> Self {
        Self {
            action,
            target_type: AuditTargetType::Role,
            target_id: template.id().as_i64(),
            target_key: Some(template.key().to_owned()),
            note: truncate_audit_note(note),
        }
    }

    /// Builds an event for a saved account override.
    #[must_use]
    pub fn account_override(user_id: UserId, add_count: usize, remove_count: usize) -> Self {
        Self {
            action: PermissionAuditAction::AccountOverrideSave,
            target_type: AuditTargetType::User,
            target_id: user_id.as_i64(),
            target_key: None,
            note: Some(format!("addKeys={add_count}, removeKeys={remove_count}")),
        }
    }
}

/// Stored audit entry projection for administrative views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionAuditEntry {
    /// Stable, increasing entry identifier.
    pub event_id: i64,
    /// What changed.
    pub action: PermissionAuditAction,
    /// Kind of record that changed.
    pub target_type: AuditTargetType,
    /// Template or account identifier.
    pub target_id: i64,
    /// Stable key of the target, when it has one.
    pub target_key: Option<String>,
    /// Short free-form summary.
    pub note: Option<String>,
    /// Entry timestamp in RFC3339.
    pub created_at: String,
}

/// Query parameters for audit log listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Maximum rows returned, newest first.
    pub limit: usize,
    /// Optional action filter.
    pub action: Option<PermissionAuditAction>,
    /// Optional target type filter.
    pub target_type: Option<AuditTargetType>,
    /// Optional target identifier filter.
    pub target_id: Option<i64>,
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_AUDIT_LOG_LIMIT,
            action: None,
            target_type: None,
            target_id: None,
        }
    }
}

impl AuditLogQuery {
    /// Returns whether an entry passes every filter that is set.
    #[must_use]
    pub fn matches(&self, entry: &PermissionAuditEntry) -> bool {
        self.action.is_none_or(|action| action == entry.action)
            && self
                .target_type
                .is_none_or(|target_type| target_type == entry.target_type)
            && self
                .target_id
                .is_none_or(|target_id| target_id == entry.target_id)
    }
}

/// Port for the append-only permission audit log.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: PermissionAuditEvent) -> AppResult<()>;

    /// Lists matching entries, newest first, at most `query.limit` of them.
    async fn list_recent_entries(&self, query: AuditLogQuery)
    -> AppResult<Vec<PermissionAuditEntry>>;
}
