use std::fmt::{Display, Formatter};
use std::str::FromStr;

use acctperm_core::AppError;
use serde::{Deserialize, Serialize};

/// Longest note kept on an audit entry, in characters.
pub const AUDIT_NOTE_MAX_CHARS: usize = 512;

/// Permission administration change recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionAuditAction {
    /// A role template was created.
    RoleTemplateCreate,
    /// A role template's summary and keys were replaced.
    RoleTemplateSave,
    /// A role template was copied.
    RoleTemplateClone,
    /// A role template was deleted.
    RoleTemplateDelete,
    /// An account override was replaced.
    AccountOverrideSave,
}

impl PermissionAuditAction {
    /// Returns the stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleTemplateCreate => "ROLE_TEMPLATE_CREATE",
            Self::RoleTemplateSave => "ROLE_TEMPLATE_SAVE",
            Self::RoleTemplateClone => "ROLE_TEMPLATE_CLONE",
            Self::RoleTemplateDelete => "ROLE_TEMPLATE_DELETE",
            Self::AccountOverrideSave => "ACCOUNT_OVERRIDE_SAVE",
        }
    }

    /// Returns the kind of target this action changes.
    #[must_use]
    pub fn target_type(&self) -> AuditTargetType {
        match self {
            Self::AccountOverrideSave => AuditTargetType::User,
            _ => AuditTargetType::Role,
        }
    }
}

impl FromStr for PermissionAuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ROLE_TEMPLATE_CREATE" => Ok(Self::RoleTemplateCreate),
            "ROLE_TEMPLATE_SAVE" => Ok(Self::RoleTemplateSave),
            "ROLE_TEMPLATE_CLONE" => Ok(Self::RoleTemplateClone),
            "ROLE_TEMPLATE_DELETE" => Ok(Self::RoleTemplateDelete),
            "ACCOUNT_OVERRIDE_SAVE" => Ok(Self::AccountOverrideSave),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}

impl Display for PermissionAuditAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Kind of record an audit entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditTargetType {
    /// A role template.
    Role,
    /// An account.
    User,
}

impl AuditTargetType {
    /// Returns the stable storage value for this target type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Role => "ROLE",
            Self::User => "USER",
        }
    }
}

impl FromStr for AuditTargetType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ROLE" => Ok(Self::Role),
            "USER" => Ok(Self::User),
            _ => Err(AppError::Validation(format!(
                "unknown audit target type '{value}'"
            ))),
        }
    }
}

impl Display for AuditTargetType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Cuts a note down to [`AUDIT_NOTE_MAX_CHARS`] characters.
#[must_use]
pub fn truncate_audit_note(note: Option<String>) -> Option<String> {
    note.map(|note| match note.char_indices().nth(AUDIT_NOTE_MAX_CHARS) {
        Some((boundary, _)) => note[..boundary].to_owned(),
        None => note,
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{
        AUDIT_NOTE_MAX_CHARS, AuditTargetType, PermissionAuditAction, truncate_audit_note,
    };

    #[test]
    fn action_roundtrips_storage_value() {
        for action in [
            PermissionAuditAction::RoleTemplateCreate,
            PermissionAuditAction::RoleTemplateSave,
            PermissionAuditAction::RoleTemplateClone,
            PermissionAuditAction::RoleTemplateDelete,
            PermissionAuditAction::AccountOverrideSave,
        ] {
            let restored = PermissionAuditAction::from_str(action.as_str());
            assert_eq!(restored.unwrap_or_else(|_| unreachable!()), action);
        }
        assert!(PermissionAuditAction::from_str("MODULE_CREATE").is_err());
    }

    #[test]
    fn override_saves_target_users() {
        assert_eq!(
            PermissionAuditAction::AccountOverrideSave.target_type(),
            AuditTargetType::User
        );
        assert_eq!(
            PermissionAuditAction::RoleTemplateClone.target_type(),
            AuditTargetType::Role
        );
        assert!(AuditTargetType::from_str("SYSTEM").is_err());
    }

    #[test]
    fn long_notes_are_cut_on_character_boundaries() {
        let note = "é".repeat(AUDIT_NOTE_MAX_CHARS + 10);

        let truncated = truncate_audit_note(Some(note)).unwrap_or_default();

        assert_eq!(truncated.chars().count(), AUDIT_NOTE_MAX_CHARS);
        assert_eq!(truncate_audit_note(Some("short".to_owned())).as_deref(), Some("short"));
        assert_eq!(truncate_audit_note(None), None);
    }
}
