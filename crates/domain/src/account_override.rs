use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::draft::KeySetDiff;
use crate::effective::OverrideDelta;
use crate::permission_key::PermissionKeySet;
use crate::role_template::RoleTemplateId;

/// Backend identifier of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
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

impl Display for UserId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Editable state of an account override: assigned template plus the delta.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOverrideSnapshot {
    /// Assigned role template, if any.
    #[serde(default)]
    pub role_template_id: Option<RoleTemplateId>,
    /// Explicit additions and removals.
    #[serde(flatten)]
    pub delta: OverrideDelta,
}

impl AccountOverrideSnapshot {
    /// Creates a snapshot.
    #[must_use]
    pub fn new(role_template_id: Option<RoleTemplateId>, delta: OverrideDelta) -> Self {
        Self {
            role_template_id,
            delta,
        }
    }
}

/// Persisted override of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOverride {
    /// Account the override belongs to.
    pub user_id: UserId,
    /// Template assignment and delta.
    #[serde(flatten)]
    pub snapshot: AccountOverrideSnapshot,
}

impl AccountOverride {
    /// Returns the default override for an account that has none stored.
    #[must_use]
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            snapshot: AccountOverrideSnapshot::default(),
        }
    }

    /// Returns the assigned template id.
    #[must_use]
    pub fn role_template_id(&self) -> Option<RoleTemplateId> {
        self.snapshot.role_template_id
    }

    /// Returns the delta.
    #[must_use]
    pub fn delta(&self) -> &OverrideDelta {
        &self.snapshot.delta
    }
}

/// Display diff of an override draft against its saved snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideDiff {
    /// Whether the template assignment changed.
    pub role_template_changed: bool,
    /// Changes to explicit additions.
    pub add_keys: KeySetDiff,
    /// Changes to explicit removals.
    pub remove_keys: KeySetDiff,
    /// Changes to the effective set.
    pub effective: KeySetDiff,
}

impl OverrideDiff {
    /// Computes the diff. Template keys are resolved by the caller for each side.
    #[must_use]
    pub fn between(
        saved: &AccountOverrideSnapshot,
        saved_template_keys: &PermissionKeySet,
        draft: &AccountOverrideSnapshot,
        draft_template_keys: &PermissionKeySet,
    ) -> Self {
        Self {
            role_template_changed: saved.role_template_id != draft.role_template_id,
            add_keys: KeySetDiff::between(saved.delta.add_keys(), draft.delta.add_keys()),
            remove_keys: KeySetDiff::between(saved.delta.remove_keys(), draft.delta.remove_keys()),
            effective: KeySetDiff::between(
                &saved.delta.resolve(saved_template_keys),
                &draft.delta.resolve(draft_template_keys),
            ),
        }
    }

    /// Returns whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.role_template_changed
            && self.add_keys.is_empty()
            && self.remove_keys.is_empty()
            && self.effective.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{AccountOverride, AccountOverrideSnapshot, OverrideDiff, UserId};
    use crate::effective::OverrideDelta;
    use crate::permission_key::{PermissionKeySet, parse_permission_keys};
    use crate::role_template::RoleTemplateId;

    fn keys(values: &[&str]) -> PermissionKeySet {
        parse_permission_keys(values).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn empty_override_has_no_template_and_no_delta() {
        let value = AccountOverride::empty(UserId::new(11));
        assert_eq!(value.role_template_id(), None);
        assert!(value.delta().is_empty());
    }

    #[test]
    fn override_serializes_flat_camel_case() {
        let value = AccountOverride {
            user_id: UserId::new(4),
            snapshot: AccountOverrideSnapshot::new(
                Some(RoleTemplateId::new(2)),
                OverrideDelta::new(keys(&["orders:EDIT"]), keys(&["orders:DELETE"])),
            ),
        };

        let json = serde_json::to_value(&value).unwrap_or_else(|_| unreachable!());
        assert_eq!(
            json,
            serde_json::json!({
                "userId": 4,
                "roleTemplateId": 2,
                "addKeys": ["orders:EDIT"],
                "removeKeys": ["orders:DELETE"]
            })
        );
    }

    #[test]
    fn diff_tracks_effective_changes_across_template_switch() {
        let saved = AccountOverrideSnapshot::new(Some(RoleTemplateId::new(1)), OverrideDelta::default());
        let draft = AccountOverrideSnapshot::new(
            Some(RoleTemplateId::new(2)),
            OverrideDelta::new(PermissionKeySet::new(), keys(&["orders:DELETE"])),
        );

        let diff = OverrideDiff::between(
            &saved,
            &keys(&["orders:VIEW"]),
            &draft,
            &keys(&["orders:VIEW", "orders:EDIT", "orders:DELETE"]),
        );

        assert!(diff.role_template_changed);
        assert_eq!(diff.remove_keys.added, keys(&["orders:DELETE"]));
        assert_eq!(diff.effective.added, keys(&["orders:EDIT"]));
        assert!(diff.effective.removed.is_empty());
    }
}
