use std::fmt::{Display, Formatter};

use acctperm_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::permission_key::PermissionKeySet;

/// Backend identifier of a role template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleTemplateId(i64);

impl RoleTemplateId {
    /// Wraps a backend id.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw id.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for RoleTemplateId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Role template summary, listed without its permission keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleTemplate {
    id: RoleTemplateId,
    key: NonEmptyString,
    label: NonEmptyString,
    enabled: bool,
    #[serde(default)]
    description: Option<String>,
}

impl RoleTemplate {
    /// Creates a role template summary.
    #[must_use]
    pub fn new(
        id: RoleTemplateId,
        key: NonEmptyString,
        label: NonEmptyString,
        enabled: bool,
        description: Option<String>,
    ) -> Self {
        Self {
            id,
            key,
            label,
            enabled,
            description: normalize_description(description),
        }
    }

    /// Returns the backend id.
    #[must_use]
    pub fn id(&self) -> RoleTemplateId {
        self.id
    }

    /// Returns the unique role key.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns whether the template may be assigned to accounts.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Editable snapshot of a role template: summary fields plus the full key set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleTemplateSnapshot {
    /// Display label. May be blank in a draft; saving rejects it.
    pub label: String,
    /// Whether the template may be assigned.
    pub enabled: bool,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Granted permission keys.
    #[serde(default)]
    pub permission_keys: PermissionKeySet,
}

impl RoleTemplateSnapshot {
    /// Builds a snapshot from a summary and its fetched keys.
    #[must_use]
    pub fn from_template(template: &RoleTemplate, permission_keys: PermissionKeySet) -> Self {
        Self {
            label: template.label().to_owned(),
            enabled: template.enabled(),
            description: template.description.clone(),
            permission_keys,
        }
    }

    /// Returns the trimmed label, rejecting blank values.
    pub fn validated_label(&self) -> AppResult<NonEmptyString> {
        NonEmptyString::new(self.label.as_str())
            .map_err(|_| AppError::Validation("role template label is required".to_owned()))
    }

    /// Returns the description with blank values collapsed to `None`.
    #[must_use]
    pub fn normalized_description(&self) -> Option<String> {
        normalize_description(self.description.clone())
    }
}

/// Trims a description and drops it when blank.
#[must_use]
pub fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use acctperm_core::NonEmptyString;

    use super::{RoleTemplate, RoleTemplateId, RoleTemplateSnapshot};
    use crate::permission_key::parse_permission_keys;

    fn template() -> RoleTemplate {
        RoleTemplate::new(
            RoleTemplateId::new(7),
            NonEmptyString::new("acctperm_20240101_ab12cd34").unwrap_or_else(|_| unreachable!()),
            NonEmptyString::new("Sales").unwrap_or_else(|_| unreachable!()),
            true,
            Some("  ".to_owned()),
        )
    }

    #[test]
    fn blank_description_is_dropped() {
        assert_eq!(template().description(), None);
    }

    #[test]
    fn snapshot_copies_summary_fields() {
        let keys = parse_permission_keys(["orders:VIEW"]).unwrap_or_else(|_| unreachable!());
        let snapshot = RoleTemplateSnapshot::from_template(&template(), keys.clone());

        assert_eq!(snapshot.label, "Sales");
        assert!(snapshot.enabled);
        assert_eq!(snapshot.permission_keys, keys);
    }

    #[test]
    fn blank_label_fails_validation() {
        let snapshot = RoleTemplateSnapshot {
            label: "   ".to_owned(),
            ..RoleTemplateSnapshot::default()
        };
        assert!(snapshot.validated_label().is_err());
    }

    #[test]
    fn summary_deserializes_camel_case() {
        let json = serde_json::json!({
            "id": 3,
            "key": "ops",
            "label": "Operations",
            "enabled": false
        });
        let parsed: RoleTemplate = serde_json::from_value(json).unwrap_or_else(|_| unreachable!());
        assert_eq!(parsed.id(), RoleTemplateId::new(3));
        assert!(!parsed.enabled());
        assert_eq!(parsed.description(), None);
    }
}
