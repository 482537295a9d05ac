use std::fmt::{Display, Formatter};
use std::str::FromStr;

use acctperm_core::AppError;
use serde::{Deserialize, Serialize};

use crate::permission_key::{PermissionKey, PermissionKeySet};

/// Composes the effective grant set: `(template ∪ add) \ remove`.
///
/// Removal always wins, even when a key sits in both `add` and `remove`.
#[must_use]
pub fn resolve_effective(
    template_keys: &PermissionKeySet,
    add_keys: &PermissionKeySet,
    remove_keys: &PermissionKeySet,
) -> PermissionKeySet {
    template_keys
        .iter()
        .chain(add_keys)
        .filter(|key| !remove_keys.contains(*key))
        .cloned()
        .collect()
}

/// Single-key form of [`resolve_effective`].
#[must_use]
pub fn has_effective_key(
    key: &PermissionKey,
    template_keys: &PermissionKeySet,
    add_keys: &PermissionKeySet,
    remove_keys: &PermissionKeySet,
) -> bool {
    !remove_keys.contains(key) && (template_keys.contains(key) || add_keys.contains(key))
}

/// Explicit per-key decision recorded in an account override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKeyState {
    /// No explicit decision; the template decides.
    #[serde(rename = "none")]
    Inherit,
    /// Explicitly granted.
    Add,
    /// Explicitly revoked.
    Remove,
}

impl OverrideKeyState {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inherit => "none",
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

impl FromStr for OverrideKeyState {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::Inherit),
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            _ => Err(AppError::Validation(format!(
                "unknown override key state '{value}'"
            ))),
        }
    }
}

impl Display for OverrideKeyState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Add/remove delta applied on top of a role template.
///
/// Every mutator keeps `add_keys ∩ remove_keys = ∅`. Values loaded from the backend are
/// kept as received; [`resolve_effective`] still lets removal win if they overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideDelta {
    add_keys: PermissionKeySet,
    remove_keys: PermissionKeySet,
}

impl OverrideDelta {
    /// Creates a delta from explicit sets.
    #[must_use]
    pub fn new(add_keys: PermissionKeySet, remove_keys: PermissionKeySet) -> Self {
        Self {
            add_keys,
            remove_keys,
        }
    }

    /// Returns explicitly granted keys.
    #[must_use]
    pub fn add_keys(&self) -> &PermissionKeySet {
        &self.add_keys
    }

    /// Returns explicitly revoked keys.
    #[must_use]
    pub fn remove_keys(&self) -> &PermissionKeySet {
        &self.remove_keys
    }

    /// Returns whether the delta has no explicit decisions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add_keys.is_empty() && self.remove_keys.is_empty()
    }

    /// Returns whether add and remove sets are disjoint.
    #[must_use]
    pub fn is_disjoint(&self) -> bool {
        self.add_keys.is_disjoint(&self.remove_keys)
    }

    /// Returns the explicit decision for a key. Removal wins on overlapping input.
    #[must_use]
    pub fn state_of(&self, key: &PermissionKey) -> OverrideKeyState {
        if self.remove_keys.contains(key) {
            OverrideKeyState::Remove
        } else if self.add_keys.contains(key) {
            OverrideKeyState::Add
        } else {
            OverrideKeyState::Inherit
        }
    }

    /// Records an explicit decision for a key.
    pub fn set_state(&mut self, key: &PermissionKey, state: OverrideKeyState) {
        match state {
            OverrideKeyState::Inherit => {
                self.add_keys.remove(key);
                self.remove_keys.remove(key);
            }
            OverrideKeyState::Add => self.force_add(key),
            OverrideKeyState::Remove => self.force_remove(key),
        }
    }

    /// Grants a key explicitly, clearing any revocation of it.
    pub fn force_add(&mut self, key: &PermissionKey) {
        self.remove_keys.remove(key);
        self.add_keys.insert(key.clone());
    }

    /// Revokes a key explicitly, clearing any grant of it.
    pub fn force_remove(&mut self, key: &PermissionKey) {
        self.add_keys.remove(key);
        self.remove_keys.insert(key.clone());
    }

    /// Resolves the delta against template keys.
    #[must_use]
    pub fn resolve(&self, template_keys: &PermissionKeySet) -> PermissionKeySet {
        resolve_effective(template_keys, &self.add_keys, &self.remove_keys)
    }

    /// Consumes the delta into its add and remove sets.
    #[must_use]
    pub fn into_parts(self) -> (PermissionKeySet, PermissionKeySet) {
        (self.add_keys, self.remove_keys)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{OverrideDelta, OverrideKeyState, has_effective_key, resolve_effective};
    use crate::permission_key::{PermissionKey, PermissionKeySet, parse_permission_keys};

    fn keys(values: &[&str]) -> PermissionKeySet {
        parse_permission_keys(values).unwrap_or_else(|_| unreachable!())
    }

    fn key(value: &str) -> PermissionKey {
        PermissionKey::parse(value).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn effective_set_merges_template_and_additions() {
        let effective = resolve_effective(
            &keys(&["orders:VIEW"]),
            &keys(&["orders:EDIT"]),
            &PermissionKeySet::new(),
        );
        assert_eq!(effective, keys(&["orders:VIEW", "orders:EDIT"]));
    }

    #[test]
    fn removal_wins_over_template_and_addition() {
        let effective = resolve_effective(
            &keys(&["orders:VIEW"]),
            &keys(&["orders:VIEW", "orders:EDIT"]),
            &keys(&["orders:VIEW"]),
        );
        assert_eq!(effective, keys(&["orders:EDIT"]));
        assert!(!has_effective_key(
            &key("orders:VIEW"),
            &keys(&["orders:VIEW"]),
            &keys(&["orders:VIEW"]),
            &keys(&["orders:VIEW"]),
        ));
    }

    #[test]
    fn override_state_prefers_remove_on_inconsistent_input() {
        let delta = OverrideDelta::new(keys(&["orders:VIEW"]), keys(&["orders:VIEW"]));
        assert_eq!(delta.state_of(&key("orders:VIEW")), OverrideKeyState::Remove);
        assert!(!delta.is_disjoint());
    }

    #[test]
    fn set_state_keeps_sets_disjoint() {
        let mut delta = OverrideDelta::default();
        let view = key("orders:VIEW");

        delta.set_state(&view, OverrideKeyState::Remove);
        delta.set_state(&view, OverrideKeyState::Add);
        assert_eq!(delta.state_of(&view), OverrideKeyState::Add);
        assert!(delta.remove_keys().is_empty());

        delta.set_state(&view, OverrideKeyState::Inherit);
        assert!(delta.is_empty());
    }

    #[test]
    fn override_state_transport_values_roundtrip() {
        for state in [
            OverrideKeyState::Inherit,
            OverrideKeyState::Add,
            OverrideKeyState::Remove,
        ] {
            let parsed = state.as_str().parse::<OverrideKeyState>();
            assert_eq!(parsed.ok(), Some(state));
        }
        assert!("maybe".parse::<OverrideKeyState>().is_err());
    }

    fn key_set_strategy() -> impl Strategy<Value = PermissionKeySet> {
        prop::collection::btree_set(
            (0..4usize, prop::sample::select(vec!["VIEW", "CREATE", "EDIT", "DELETE"])),
            0..10,
        )
        .prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(module, action)| key(&format!("m{module}:{action}")))
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a removed key is never effective, whatever else grants it.
        #[test]
        fn removed_keys_are_never_effective(
            template in key_set_strategy(),
            add in key_set_strategy(),
            remove in key_set_strategy(),
        ) {
            let effective = resolve_effective(&template, &add, &remove);
            prop_assert!(effective.is_disjoint(&remove));
            for granted in template.iter().chain(&add) {
                prop_assert_eq!(
                    effective.contains(granted),
                    !remove.contains(granted)
                );
            }
        }
    }
}
