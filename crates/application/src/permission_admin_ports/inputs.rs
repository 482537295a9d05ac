use acctperm_core::{AppResult, NonEmptyString};
use acctperm_domain::{
    AccountOverrideSnapshot, PermissionKeySet, RoleTemplate, RoleTemplateId, RoleTemplateSnapshot,
};

/// Full replacement payload for saving a role template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRoleTemplateInput {
    /// Display label.
    pub label: NonEmptyString,
    /// Whether the template may be assigned.
    pub enabled: bool,
    /// Complete key set replacing the stored one.
    pub permission_keys: PermissionKeySet,
    /// Optional description.
    pub description: Option<String>,
}

impl SaveRoleTemplateInput {
    /// Builds the payload from an editor snapshot, rejecting a blank label.
    pub fn from_snapshot(snapshot: &RoleTemplateSnapshot) -> AppResult<Self> {
        Ok(Self {
            label: snapshot.validated_label()?,
            enabled: snapshot.enabled,
            permission_keys: snapshot.permission_keys.clone(),
            description: snapshot.normalized_description(),
        })
    }
}

/// Full replacement payload for saving an account override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveAccountOverrideInput {
    /// Assigned template, if any.
    pub role_template_id: Option<RoleTemplateId>,
    /// Complete set of explicit additions.
    pub add_keys: PermissionKeySet,
    /// Complete set of explicit removals.
    pub remove_keys: PermissionKeySet,
}

impl From<&AccountOverrideSnapshot> for SaveAccountOverrideInput {
    fn from(value: &AccountOverrideSnapshot) -> Self {
        Self {
            role_template_id: value.role_template_id,
            add_keys: value.delta.add_keys().clone(),
            remove_keys: value.delta.remove_keys().clone(),
        }
    }
}

/// Payload for creating a role template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleTemplateInput {
    /// Unique role key. Generated by the backend when omitted.
    pub key: Option<String>,
    /// Display label.
    pub label: NonEmptyString,
    /// Whether the template may be assigned.
    pub enabled: bool,
    /// Optional description.
    pub description: Option<String>,
}

/// Role template summary together with its key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTemplateWithKeys {
    /// Template summary.
    pub template: RoleTemplate,
    /// Granted keys.
    pub permission_keys: PermissionKeySet,
}

impl RoleTemplateWithKeys {
    /// Returns the editable snapshot of this template.
    #[must_use]
    pub fn snapshot(&self) -> RoleTemplateSnapshot {
        RoleTemplateSnapshot::from_template(&self.template, self.permission_keys.clone())
    }
}
