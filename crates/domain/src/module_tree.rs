use std::collections::{BTreeSet, HashMap};

use acctperm_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::permission_key::{
    ActionKey, PERMISSION_KEY_SEPARATOR, PermissionKey, PermissionKeySet,
};

/// One action entry in the catalog served with the permission tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// Action identifier.
    pub key: ActionKey,
    /// Display label.
    pub label: String,
}

impl ActionDefinition {
    /// Creates a catalog entry.
    #[must_use]
    pub fn new(key: ActionKey, label: impl Into<String>) -> Self {
        Self {
            key,
            label: label.into(),
        }
    }

    /// Returns the default catalog used when the backend has not configured one.
    #[must_use]
    pub fn default_catalog() -> Vec<Self> {
        vec![
            Self::new(ActionKey::VIEW, "View"),
            Self::new(ActionKey::CREATE, "Create"),
            Self::new(ActionKey::EDIT, "Edit"),
            Self::new(ActionKey::SUBMIT, "Submit"),
            Self::new(ActionKey::APPROVE, "Approve"),
            Self::new(ActionKey::REJECT, "Reject"),
            Self::new(ActionKey::ASSIGN, "Assign"),
            Self::new(ActionKey::CLOSE, "Close"),
            Self::new(ActionKey::DELETE, "Delete"),
            Self::new(ActionKey::EXPORT, "Export"),
        ]
    }
}

/// Module node in the permission tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleNode {
    key: String,
    label: String,
    #[serde(default)]
    actions: Vec<ActionKey>,
    #[serde(default)]
    children: Vec<ModuleNode>,
}

impl ModuleNode {
    /// Creates a validated module node.
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        actions: Vec<ActionKey>,
        children: Vec<ModuleNode>,
    ) -> AppResult<Self> {
        let node = Self {
            key: key.into().trim().to_owned(),
            label: label.into(),
            actions,
            children,
        };
        node.validate_local()?;
        Ok(node)
    }

    /// Creates a validated node without children.
    pub fn leaf(
        key: impl Into<String>,
        label: impl Into<String>,
        actions: Vec<ActionKey>,
    ) -> AppResult<Self> {
        Self::new(key, label, actions, Vec::new())
    }

    /// Returns the globally unique module key.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the actions declared on this node, in catalog order.
    #[must_use]
    pub fn actions(&self) -> &[ActionKey] {
        &self.actions
    }

    /// Returns the direct children.
    #[must_use]
    pub fn children(&self) -> &[ModuleNode] {
        &self.children
    }

    /// Returns whether this node declares the action.
    #[must_use]
    pub fn declares(&self, action: &ActionKey) -> bool {
        self.actions.contains(action)
    }

    /// Returns the key for an action, when the node declares it.
    #[must_use]
    pub fn permission_key(&self, action: &ActionKey) -> Option<PermissionKey> {
        self.declares(action)
            .then(|| PermissionKey::new(self.key(), action))
    }

    /// Returns the visibility key, when the node declares VIEW.
    #[must_use]
    pub fn view_key(&self) -> Option<PermissionKey> {
        self.permission_key(&ActionKey::VIEW)
    }

    /// Returns the keys declared on this node only.
    pub fn own_keys(&self) -> impl Iterator<Item = PermissionKey> + '_ {
        self.actions
            .iter()
            .map(|action| PermissionKey::new(self.key(), action))
    }

    /// Iterates this node and every descendant in pre-order.
    #[must_use]
    pub fn nodes(&self) -> SubtreeNodes<'_> {
        SubtreeNodes { stack: vec![self] }
    }

    /// Returns every key reachable from this node, itself included.
    #[must_use]
    pub fn subtree_keys(&self) -> PermissionKeySet {
        self.nodes().flat_map(ModuleNode::own_keys).collect()
    }

    /// Counts how many subtree keys are present in `keys`.
    #[must_use]
    pub fn selection_summary(&self, keys: &PermissionKeySet) -> SubtreeSelection {
        let mut summary = SubtreeSelection::default();
        for key in self.nodes().flat_map(ModuleNode::own_keys) {
            summary.total += 1;
            if keys.contains(&key) {
                summary.selected += 1;
            }
        }
        summary
    }

    fn validate_local(&self) -> AppResult<()> {
        if self.key.is_empty() || self.key.contains(PERMISSION_KEY_SEPARATOR) {
            return Err(AppError::Validation(format!(
                "module key '{}' must be non-empty and must not contain '{PERMISSION_KEY_SEPARATOR}'",
                self.key
            )));
        }
        NonEmptyString::new(self.label.as_str()).map_err(|_| {
            AppError::Validation(format!("module '{}' requires a label", self.key))
        })?;

        let mut seen = BTreeSet::new();
        for action in &self.actions {
            if !seen.insert(action) {
                return Err(AppError::Validation(format!(
                    "module '{}' declares action '{action}' more than once",
                    self.key
                )));
            }
        }

        Ok(())
    }
}

/// Pre-order iterator over a subtree, driven by an explicit stack.
#[derive(Debug, Clone)]
pub struct SubtreeNodes<'a> {
    stack: Vec<&'a ModuleNode>,
}

impl<'a> Iterator for SubtreeNodes<'a> {
    type Item = &'a ModuleNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Selected and total key counts for one subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubtreeSelection {
    /// Subtree keys present in the inspected set.
    pub selected: usize,
    /// All keys in the subtree.
    pub total: usize,
}

/// Module key to label lookup, rebuilt whenever the tree is fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleLabelIndex {
    labels: HashMap<String, String>,
}

impl ModuleLabelIndex {
    /// Flattens a module forest into a label index.
    #[must_use]
    pub fn from_modules(modules: &[ModuleNode]) -> Self {
        let labels = modules
            .iter()
            .flat_map(ModuleNode::nodes)
            .map(|node| (node.key.clone(), node.label.clone()))
            .collect();
        Self { labels }
    }

    /// Returns the label for a module key.
    #[must_use]
    pub fn label(&self, module_key: &str) -> Option<&str> {
        self.labels.get(module_key).map(String::as_str)
    }

    /// Returns whether the module key exists.
    #[must_use]
    pub fn contains(&self, module_key: &str) -> bool {
        self.labels.contains_key(module_key)
    }

    /// Returns the number of indexed modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Read-only catalog of modules and the action vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PermissionTreeRecord")]
pub struct PermissionTree {
    actions: Vec<ActionDefinition>,
    modules: Vec<ModuleNode>,
    #[serde(skip)]
    labels: ModuleLabelIndex,
}

#[derive(Deserialize)]
struct PermissionTreeRecord {
    #[serde(default)]
    actions: Vec<ActionDefinition>,
    #[serde(default)]
    modules: Vec<ModuleNode>,
}

impl TryFrom<PermissionTreeRecord> for PermissionTree {
    type Error = AppError;

    fn try_from(value: PermissionTreeRecord) -> Result<Self, Self::Error> {
        Self::new(value.actions, value.modules)
    }
}

impl PermissionTree {
    /// Creates a validated tree.
    ///
    /// Module keys must be unique across the whole forest and every declared action
    /// must exist in the catalog. An empty catalog falls back to the default one.
    pub fn new(actions: Vec<ActionDefinition>, modules: Vec<ModuleNode>) -> AppResult<Self> {
        let actions = if actions.is_empty() {
            ActionDefinition::default_catalog()
        } else {
            actions
        };

        let mut catalog = BTreeSet::new();
        for definition in &actions {
            if !catalog.insert(&definition.key) {
                return Err(AppError::Validation(format!(
                    "action '{}' appears more than once in the catalog",
                    definition.key
                )));
            }
        }

        let mut module_keys = BTreeSet::new();
        for node in modules.iter().flat_map(ModuleNode::nodes) {
            node.validate_local()?;
            if !module_keys.insert(node.key()) {
                return Err(AppError::Validation(format!(
                    "module key '{}' appears more than once in the permission tree",
                    node.key()
                )));
            }
            if let Some(unknown) = node.actions().iter().find(|action| !catalog.contains(action)) {
                return Err(AppError::Validation(format!(
                    "module '{}' declares unknown action '{unknown}'",
                    node.key()
                )));
            }
        }

        let labels = ModuleLabelIndex::from_modules(&modules);
        Ok(Self {
            actions,
            modules,
            labels,
        })
    }

    /// Returns the action catalog.
    #[must_use]
    pub fn actions(&self) -> &[ActionDefinition] {
        &self.actions
    }

    /// Returns the root modules.
    #[must_use]
    pub fn modules(&self) -> &[ModuleNode] {
        &self.modules
    }

    /// Iterates every node of the forest in pre-order.
    pub fn nodes(&self) -> impl Iterator<Item = &ModuleNode> {
        self.modules.iter().flat_map(ModuleNode::nodes)
    }

    /// Finds a module anywhere in the forest.
    #[must_use]
    pub fn find_module(&self, module_key: &str) -> Option<&ModuleNode> {
        self.nodes().find(|node| node.key() == module_key)
    }

    /// Finds a module or reports it as missing.
    pub fn require_module(&self, module_key: &str) -> AppResult<&ModuleNode> {
        self.find_module(module_key).ok_or_else(|| {
            AppError::NotFound(format!("module '{module_key}' is not in the permission tree"))
        })
    }

    /// Returns the label index for this tree.
    #[must_use]
    pub fn label_index(&self) -> &ModuleLabelIndex {
        &self.labels
    }

    /// Returns every key declared anywhere in the tree.
    #[must_use]
    pub fn all_keys(&self) -> PermissionKeySet {
        self.nodes().flat_map(ModuleNode::own_keys).collect()
    }

    /// Returns whether an action exists in the catalog.
    #[must_use]
    pub fn has_action(&self, action_key: &str) -> bool {
        self.actions
            .iter()
            .any(|definition| definition.key.as_str() == action_key)
    }

    /// Checks that a key names a known module and a catalog action.
    pub fn validate_permission_key(&self, key: &PermissionKey) -> AppResult<()> {
        if !self.labels.contains(key.module_key()) {
            return Err(AppError::Validation(format!(
                "permission key '{key}' references unknown module '{}'",
                key.module_key()
            )));
        }
        if !self.has_action(key.action_key()) {
            return Err(AppError::Validation(format!(
                "permission key '{key}' references unknown action '{}'",
                key.action_key()
            )));
        }
        Ok(())
    }

    /// Validates every key of a set.
    pub fn validate_permission_keys<'a, I>(&self, keys: I) -> AppResult<()>
    where
        I: IntoIterator<Item = &'a PermissionKey>,
    {
        keys.into_iter()
            .try_for_each(|key| self.validate_permission_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionDefinition, ModuleNode, PermissionTree};
    use crate::permission_key::{ActionKey, PermissionKey, PermissionKeySet};

    fn sales_tree() -> PermissionTree {
        let quotes = ModuleNode::leaf(
            "quotes",
            "Quotes",
            vec![ActionKey::VIEW, ActionKey::CREATE, ActionKey::APPROVE],
        )
        .unwrap_or_else(|_| unreachable!());
        let reports = ModuleNode::leaf("reports", "Reports", vec![ActionKey::EXPORT])
            .unwrap_or_else(|_| unreachable!());
        let sales = ModuleNode::new("sales", "Sales", vec![ActionKey::VIEW], vec![quotes, reports])
            .unwrap_or_else(|_| unreachable!());

        PermissionTree::new(ActionDefinition::default_catalog(), vec![sales])
            .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn subtree_keys_cover_node_and_descendants() {
        let tree = sales_tree();
        let sales = tree.require_module("sales").unwrap_or_else(|_| unreachable!());
        let keys = sales
            .subtree_keys()
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();

        assert_eq!(
            keys,
            vec![
                "quotes:APPROVE",
                "quotes:CREATE",
                "quotes:VIEW",
                "reports:EXPORT",
                "sales:VIEW"
            ]
        );
    }

    #[test]
    fn nodes_iterate_in_pre_order() {
        let tree = sales_tree();
        let order = tree.nodes().map(ModuleNode::key).collect::<Vec<_>>();
        assert_eq!(order, vec!["sales", "quotes", "reports"]);
    }

    #[test]
    fn duplicate_module_keys_are_rejected_across_levels() {
        let child = ModuleNode::leaf("orders", "Orders", vec![ActionKey::VIEW])
            .unwrap_or_else(|_| unreachable!());
        let root = ModuleNode::new("orders", "Orders root", vec![], vec![child])
            .unwrap_or_else(|_| unreachable!());

        let tree = PermissionTree::new(Vec::new(), vec![root]);
        assert!(tree.is_err());
    }

    #[test]
    fn duplicate_actions_are_rejected() {
        let node = ModuleNode::leaf("orders", "Orders", vec![ActionKey::VIEW, ActionKey::VIEW]);
        assert!(node.is_err());
    }

    #[test]
    fn unknown_action_is_rejected_by_tree() {
        let custom = ActionKey::parse("ARCHIVE").unwrap_or_else(|_| unreachable!());
        let node = ModuleNode::leaf("orders", "Orders", vec![custom])
            .unwrap_or_else(|_| unreachable!());
        let tree = PermissionTree::new(ActionDefinition::default_catalog(), vec![node]);
        assert!(tree.is_err());
    }

    #[test]
    fn label_index_flattens_forest() {
        let tree = sales_tree();
        assert_eq!(tree.label_index().label("reports"), Some("Reports"));
        assert_eq!(tree.label_index().len(), 3);
    }

    #[test]
    fn validate_permission_key_checks_module_and_action() {
        let tree = sales_tree();
        let known = PermissionKey::parse("quotes:VIEW").unwrap_or_else(|_| unreachable!());
        let unknown_module = PermissionKey::parse("ghost:VIEW").unwrap_or_else(|_| unreachable!());
        let unknown_action = PermissionKey::parse("quotes:FLY").unwrap_or_else(|_| unreachable!());

        assert!(tree.validate_permission_key(&known).is_ok());
        assert!(tree.validate_permission_key(&unknown_module).is_err());
        assert!(tree.validate_permission_key(&unknown_action).is_err());
    }

    #[test]
    fn selection_summary_counts_present_keys() {
        let tree = sales_tree();
        let sales = tree.require_module("sales").unwrap_or_else(|_| unreachable!());
        let keys: PermissionKeySet = [
            PermissionKey::parse("quotes:VIEW").unwrap_or_else(|_| unreachable!()),
            PermissionKey::parse("other:VIEW").unwrap_or_else(|_| unreachable!()),
        ]
        .into_iter()
        .collect();

        let summary = sales.selection_summary(&keys);
        assert_eq!(summary.selected, 1);
        assert_eq!(summary.total, 5);
    }

    #[test]
    fn tree_deserialization_validates_and_indexes_labels() {
        let json = serde_json::json!({
            "actions": [{ "key": "VIEW", "label": "View" }],
            "modules": [
                { "key": "orders", "label": "Orders", "actions": ["VIEW"], "children": [] }
            ]
        });

        let tree: PermissionTree =
            serde_json::from_value(json).unwrap_or_else(|_| unreachable!());
        assert_eq!(tree.label_index().label("orders"), Some("Orders"));

        let duplicate = serde_json::json!({
            "modules": [
                { "key": "orders", "label": "Orders" },
                { "key": "orders", "label": "Orders again" }
            ]
        });
        assert!(serde_json::from_value::<PermissionTree>(duplicate).is_err());
    }
}
