use crate::grant_editor::GrantEditor;
use crate::module_tree::ModuleNode;
use crate::permission_key::PermissionKeySet;
use crate::quick_op::{QuickOp, apply_quick_op, keys_for_op};

/// Returns whether a module is visible: its VIEW key is effective.
///
/// Nodes without a VIEW action are never checked.
#[must_use]
pub fn is_menu_checked(node: &ModuleNode, effective: &PermissionKeySet) -> bool {
    node.view_key()
        .is_some_and(|view_key| effective.contains(&view_key))
}

/// Toggles module visibility for a subtree.
///
/// Checking grants VIEW on every subtree node declaring it and leaves every other
/// key as it was. Unchecking behaves as [`QuickOp::Clear`].
pub fn set_menu_checked<E>(editor: &mut E, node: &ModuleNode, checked: bool)
where
    E: GrantEditor + ?Sized,
{
    if checked {
        editor.grant(&keys_for_op(node, QuickOp::ReadOnly));
    } else {
        apply_quick_op(editor, node, QuickOp::Clear);
    }
}
