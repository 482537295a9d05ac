use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use acctperm_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::module_tree::ModuleLabelIndex;

/// Ordered set of permission keys. Ordering keeps rendered sets stable.
pub type PermissionKeySet = BTreeSet<PermissionKey>;

/// Separator between the module and action parts of a permission key.
pub const PERMISSION_KEY_SEPARATOR: char = ':';

/// Action identifier from the permission catalog.
///
/// The catalog is served by the backend and may grow, so actions are validated
/// identifiers rather than a closed enum. The default vocabulary is exposed as constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionKey(Cow<'static, str>);

impl ActionKey {
    /// Gates module visibility.
    pub const VIEW: Self = Self(Cow::Borrowed("VIEW"));
    /// Allows creating records.
    pub const CREATE: Self = Self(Cow::Borrowed("CREATE"));
    /// Allows editing records.
    pub const EDIT: Self = Self(Cow::Borrowed("EDIT"));
    /// Allows submitting records for review.
    pub const SUBMIT: Self = Self(Cow::Borrowed("SUBMIT"));
    /// Allows approving submitted records.
    pub const APPROVE: Self = Self(Cow::Borrowed("APPROVE"));
    /// Allows rejecting submitted records.
    pub const REJECT: Self = Self(Cow::Borrowed("REJECT"));
    /// Allows assigning records to people.
    pub const ASSIGN: Self = Self(Cow::Borrowed("ASSIGN"));
    /// Allows closing records.
    pub const CLOSE: Self = Self(Cow::Borrowed("CLOSE"));
    /// Allows deleting records.
    pub const DELETE: Self = Self(Cow::Borrowed("DELETE"));
    /// Allows exporting records.
    pub const EXPORT: Self = Self(Cow::Borrowed("EXPORT"));

    /// Actions shown inline and granted by the read-write quick op.
    pub const BASIC: [Self; 3] = [Self::VIEW, Self::CREATE, Self::EDIT];

    /// Parses and validates an action identifier.
    pub fn parse(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "action key must not be empty".to_owned(),
            ));
        }
        if trimmed.contains(PERMISSION_KEY_SEPARATOR) || trimmed.contains(char::is_whitespace) {
            return Err(AppError::Validation(format!(
                "action key '{trimmed}' must not contain whitespace or '{PERMISSION_KEY_SEPARATOR}'"
            )));
        }

        Ok(Self(Cow::Owned(trimmed.to_owned())))
    }

    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether this is one of the basic actions (VIEW, CREATE, EDIT).
    #[must_use]
    pub fn is_basic(&self) -> bool {
        Self::BASIC.contains(self)
    }

    /// Returns whether this action gates visibility.
    #[must_use]
    pub fn is_view(&self) -> bool {
        self == &Self::VIEW
    }
}

impl FromStr for ActionKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for ActionKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<ActionKey> for String {
    fn from(value: ActionKey) -> Self {
        value.0.into_owned()
    }
}

impl Display for ActionKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Atomic grant identifier rendered as `<moduleKey>:<actionKey>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey(String);

impl PermissionKey {
    /// Composes a key from a module key and an action.
    ///
    /// Module keys are validated by [`crate::ModuleNode::new`], so composition cannot fail.
    #[must_use]
    pub fn new(module_key: &str, action: &ActionKey) -> Self {
        Self(format!(
            "{module_key}{PERMISSION_KEY_SEPARATOR}{}",
            action.as_str()
        ))
    }

    /// Parses a transport value, requiring a non-empty module and action part.
    pub fn parse(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        match trimmed.split_once(PERMISSION_KEY_SEPARATOR) {
            Some((module_key, action_key)) if !module_key.is_empty() && !action_key.is_empty() => {
                Ok(Self(trimmed.to_owned()))
            }
            _ => Err(AppError::Validation(format!(
                "permission key must use the format moduleKey:actionKey, got '{trimmed}'"
            ))),
        }
    }

    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the module part (text before the first separator).
    #[must_use]
    pub fn module_key(&self) -> &str {
        self.split().0
    }

    /// Returns the action part (text after the first separator).
    #[must_use]
    pub fn action_key(&self) -> &str {
        self.split().1
    }

    fn split(&self) -> (&str, &str) {
        self.0
            .split_once(PERMISSION_KEY_SEPARATOR)
            .unwrap_or((self.0.as_str(), ""))
    }
}

impl FromStr for PermissionKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<PermissionKey> for String {
    fn from(value: PermissionKey) -> Self {
        value.0
    }
}

impl Display for PermissionKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Parses transport values into a key set, dropping blank entries and duplicates.
pub fn parse_permission_keys<I, S>(values: I) -> AppResult<PermissionKeySet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .filter(|value| !value.as_ref().trim().is_empty())
        .map(|value| PermissionKey::parse(value.as_ref()))
        .collect()
}

/// Permission keys of one module, grouped for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleKeyGroup {
    /// Module key shared by every key in the group.
    pub module_key: String,
    /// Module label, or the module key when the label is unknown.
    pub label: String,
    /// Sorted keys in this module.
    pub keys: Vec<PermissionKey>,
}

/// Groups keys by module, ordered by module key, with labels resolved from the index.
#[must_use]
pub fn group_keys_by_module<'a, I>(keys: I, labels: Option<&ModuleLabelIndex>) -> Vec<ModuleKeyGroup>
where
    I: IntoIterator<Item = &'a PermissionKey>,
{
    let mut by_module: BTreeMap<&str, BTreeSet<&PermissionKey>> = BTreeMap::new();
    for key in keys {
        by_module.entry(key.module_key()).or_default().insert(key);
    }

    by_module
        .into_iter()
        .map(|(module_key, module_keys)| ModuleKeyGroup {
            module_key: module_key.to_owned(),
            label: labels
                .and_then(|index| index.label(module_key))
                .unwrap_or(module_key)
                .to_owned(),
            keys: module_keys.into_iter().cloned().collect(),
        })
        .collect()
}
