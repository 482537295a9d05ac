use std::fmt::{Display, Formatter};
use std::str::FromStr;

use acctperm_core::AppError;
use serde::{Deserialize, Serialize};

use crate::grant_editor::GrantEditor;
use crate::module_tree::ModuleNode;
use crate::permission_key::{ActionKey, PermissionKeySet};

/// Coarse bulk operation applied to a module subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickOp {
    /// Every declared action in the subtree.
    All,
    /// VIEW only, on every node declaring it.
    ReadOnly,
    /// VIEW, CREATE and EDIT where declared.
    ReadWrite,
    /// Nothing.
    Clear,
}

impl QuickOp {
    /// Every operation, in menu order.
    pub const ALL_OPS: [Self; 4] = [Self::All, Self::ReadOnly, Self::ReadWrite, Self::Clear];

    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::ReadOnly => "readonly",
            Self::ReadWrite => "readwrite",
            Self::Clear => "clear",
        }
    }

    fn includes(&self, action: &ActionKey) -> bool {
        match self {
            Self::All => true,
            Self::ReadOnly => action.is_view(),
            Self::ReadWrite => action.is_basic(),
            Self::Clear => false,
        }
    }
}

impl FromStr for QuickOp {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "all" => Ok(Self::All),
            "readonly" => Ok(Self::ReadOnly),
            "readwrite" => Ok(Self::ReadWrite),
            "clear" => Ok(Self::Clear),
            _ => Err(AppError::Validation(format!("unknown quick op '{value}'"))),
        }
    }
}

impl Display for QuickOp {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Returns the exact key set an operation implies for a subtree.
#[must_use]
pub fn keys_for_op(node: &ModuleNode, op: QuickOp) -> PermissionKeySet {
    node.nodes()
        .flat_map(|member| {
            member
                .actions()
                .iter()
                .filter(move |action| op.includes(action))
                .filter_map(move |action| member.permission_key(action))
        })
        .collect()
}

/// Applies an operation to a draft, replacing the subtree's grants with [`keys_for_op`].
pub fn apply_quick_op<E>(editor: &mut E, node: &ModuleNode, op: QuickOp)
where
    E: GrantEditor + ?Sized,
{
    let scope = node.subtree_keys();
    if scope.is_empty() {
        return;
    }
    editor.replace_scope(&scope, &keys_for_op(node, op));
}
