//! Domain model and pure composition rules for account permissions.

#![forbid(unsafe_code)]

mod account_override;
mod audit;
mod dependency;
mod draft;
mod effective;
mod grant_editor;
mod menu;
mod module_tree;
mod permission_key;
mod quick_op;
mod role_template;

pub use account_override::{AccountOverride, AccountOverrideSnapshot, OverrideDiff, UserId};
pub use audit::{
    AUDIT_NOTE_MAX_CHARS, AuditTargetType, PermissionAuditAction, truncate_audit_note,
};
pub use dependency::{
    DependencyClosure, DependencyReason, ModuleDependencyGraph, ModuleGroup, ModuleMatch,
    ModuleRegistry, RegisteredModule, UNMAPPED_MODULE_ID, UNMAPPED_MODULE_LABEL,
    resolve_dependency_closure,
};
pub use draft::{DraftState, KeySetDiff, is_dirty};
pub use effective::{OverrideDelta, OverrideKeyState, has_effective_key, resolve_effective};
pub use grant_editor::GrantEditor;
pub use menu::{is_menu_checked, set_menu_checked};
pub use module_tree::{
    ActionDefinition, ModuleLabelIndex, ModuleNode, PermissionTree, SubtreeNodes,
    SubtreeSelection,
};
pub use permission_key::{
    ActionKey, ModuleKeyGroup, PERMISSION_KEY_SEPARATOR, PermissionKey, PermissionKeySet,
    group_keys_by_module, parse_permission_keys,
};
pub use quick_op::{QuickOp, apply_quick_op, keys_for_op};
pub use role_template::{RoleTemplate, RoleTemplateId, RoleTemplateSnapshot, normalize_description};
