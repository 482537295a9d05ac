use std::collections::{BTreeMap, BTreeSet};

use acctperm_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Sentinel id for paths that no registered module owns. Never selectable.
pub const UNMAPPED_MODULE_ID: &str = "__unmapped__";

/// Label shown for [`UNMAPPED_MODULE_ID`].
pub const UNMAPPED_MODULE_LABEL: &str = "Unknown / unmapped";

/// Required dependencies per module id. Cycles are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleDependencyGraph {
    edges: BTreeMap<String, Vec<String>>,
}

impl ModuleDependencyGraph {
    /// Creates a graph from explicit edges.
    #[must_use]
    pub fn new(edges: BTreeMap<String, Vec<String>>) -> Self {
        Self { edges }
    }

    /// Adds one required dependency.
    #[must_use]
    pub fn with_dependency(mut self, module_id: &str, depends_on: &str) -> Self {
        let targets = self.edges.entry(module_id.to_owned()).or_default();
        if !targets.iter().any(|target| target == depends_on) {
            targets.push(depends_on.to_owned());
        }
        self
    }

    /// Returns the direct dependencies of a module, in declaration order.
    #[must_use]
    pub fn dependencies_of(&self, module_id: &str) -> &[String] {
        self.edges
            .get(module_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates every `(module, dependency)` edge.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges.iter().flat_map(|(module_id, targets)| {
            targets
                .iter()
                .map(move |target| (module_id.as_str(), target.as_str()))
        })
    }
}

/// Why ids were pulled into a closure. Only direct dependencies of a selected id are listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyReason {
    /// Selected id whose direct dependencies were added.
    pub because: String,
    /// Added ids that are direct dependencies of `because`.
    pub added_because_of_this: Vec<String>,
}

/// Result of expanding a selection under the dependency relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyClosure {
    /// Selection plus every transitively required id.
    pub effective: BTreeSet<String>,
    /// Ids present in `effective` but not selected.
    pub added: BTreeSet<String>,
    /// First-level attribution, one entry per selected id that pulled something in.
    pub reasons: Vec<DependencyReason>,
}

/// Expands a selection to its dependency closure.
///
/// Ids outside `universe` and the unmapped sentinel are dropped first; dependency
/// targets outside `universe` are ignored. Attribution is first-level only, so an id
/// reached through another added id has no reason entry.
#[must_use]
pub fn resolve_dependency_closure<'a, I>(
    selected: I,
    graph: &ModuleDependencyGraph,
    universe: &BTreeSet<String>,
) -> DependencyClosure
where
    I: IntoIterator<Item = &'a str>,
{
    let selected = selected
        .into_iter()
        .filter(|id| *id != UNMAPPED_MODULE_ID && universe.contains(*id))
        .map(str::to_owned)
        .collect::<BTreeSet<_>>();

    let mut effective = selected.clone();
    let mut worklist = selected.iter().cloned().collect::<Vec<_>>();
    while let Some(module_id) = worklist.pop() {
        for target in graph.dependencies_of(&module_id) {
            if universe.contains(target) && effective.insert(target.clone()) {
                worklist.push(target.clone());
            }
        }
    }

    let added = effective
        .difference(&selected)
        .cloned()
        .collect::<BTreeSet<_>>();

    let reasons = selected
        .iter()
        .filter_map(|module_id| {
            let added_because_of_this = graph
                .dependencies_of(module_id)
                .iter()
                .filter(|target| added.contains(*target))
                .cloned()
                .collect::<Vec<_>>();
            (!added_because_of_this.is_empty()).then(|| DependencyReason {
                because: module_id.clone(),
                added_because_of_this,
            })
        })
        .collect();

    DependencyClosure {
        effective,
        added,
        reasons,
    }
}

/// One selectable module with the route prefixes it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredModule {
    /// Stable module id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Route prefixes owned by the module.
    #[serde(default)]
    pub route_prefixes: Vec<String>,
}

/// Display group of registered modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleGroup {
    /// Stable group id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Modules in display order.
    pub modules: Vec<RegisteredModule>,
}

/// Module owning a route, or the unmapped sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMatch {
    /// Owning module id.
    pub module_id: String,
    /// Owning module label.
    pub module_label: String,
    /// Label of the module's group.
    pub group_label: String,
}

/// Registry of selectable modules and their dependency rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ModuleRegistryRecord", into = "ModuleRegistryRecord")]
pub struct ModuleRegistry {
    groups: Vec<ModuleGroup>,
    dependencies: ModuleDependencyGraph,
    selectable: BTreeSet<String>,
}

#[derive(Clone, Serialize, Deserialize)]
struct ModuleRegistryRecord {
    #[serde(default)]
    groups: Vec<ModuleGroup>,
    #[serde(default)]
    dependencies: ModuleDependencyGraph,
}

impl TryFrom<ModuleRegistryRecord> for ModuleRegistry {
    type Error = AppError;

    fn try_from(value: ModuleRegistryRecord) -> Result<Self, Self::Error> {
        Self::new(value.groups, value.dependencies)
    }
}

impl From<ModuleRegistry> for ModuleRegistryRecord {
    fn from(value: ModuleRegistry) -> Self {
        Self {
            groups: value.groups,
            dependencies: value.dependencies,
        }
    }
}

impl ModuleRegistry {
    /// Creates a registry. Module ids must be unique and every dependency edge must
    /// reference registered modules.
    pub fn new(groups: Vec<ModuleGroup>, dependencies: ModuleDependencyGraph) -> AppResult<Self> {
        let mut selectable = BTreeSet::new();
        for module in groups.iter().flat_map(|group| group.modules.iter()) {
            if module.id == UNMAPPED_MODULE_ID {
                return Err(AppError::Validation(format!(
                    "module id '{UNMAPPED_MODULE_ID}' is reserved"
                )));
            }
            if !selectable.insert(module.id.clone()) {
                return Err(AppError::Validation(format!(
                    "module id '{}' is registered more than once",
                    module.id
                )));
            }
        }

        if let Some((module_id, target)) = dependencies
            .edges()
            .find(|(module_id, target)| !selectable.contains(*module_id) || !selectable.contains(*target))
        {
            return Err(AppError::Validation(format!(
                "dependency '{module_id}' -> '{target}' references an unregistered module"
            )));
        }

        Ok(Self {
            groups,
            dependencies,
            selectable,
        })
    }

    /// Returns the module groups in display order.
    #[must_use]
    pub fn groups(&self) -> &[ModuleGroup] {
        &self.groups
    }

    /// Returns the dependency rules.
    #[must_use]
    pub fn dependencies(&self) -> &ModuleDependencyGraph {
        &self.dependencies
    }

    /// Returns every selectable module id. The unmapped sentinel is never included.
    #[must_use]
    pub fn selectable_ids(&self) -> &BTreeSet<String> {
        &self.selectable
    }

    /// Returns the label of a registered module.
    #[must_use]
    pub fn module_label(&self, module_id: &str) -> Option<&str> {
        self.modules()
            .find(|(_, module)| module.id == module_id)
            .map(|(_, module)| module.label.as_str())
    }

    /// Resolves the module owning a route path. The longest matching prefix wins.
    #[must_use]
    pub fn resolve_module_by_path(&self, path: &str) -> ModuleMatch {
        let normalized = if path.starts_with('/') {
            path.to_owned()
        } else {
            format!("/{path}")
        };

        let mut best: Option<(usize, &ModuleGroup, &RegisteredModule)> = None;
        for (group, module) in self.modules() {
            for prefix in &module.route_prefixes {
                let prefix = if prefix.starts_with('/') {
                    prefix.clone()
                } else {
                    format!("/{prefix}")
                };
                let longer = best.is_none_or(|(length, _, _)| prefix.len() > length);
                if normalized.starts_with(prefix.as_str()) && longer {
                    best = Some((prefix.len(), group, module));
                }
            }
        }

        match best {
            Some((_, group, module)) => ModuleMatch {
                module_id: module.id.clone(),
                module_label: module.label.clone(),
                group_label: group.label.clone(),
            },
            None => ModuleMatch {
                module_id: UNMAPPED_MODULE_ID.to_owned(),
                module_label: UNMAPPED_MODULE_LABEL.to_owned(),
                group_label: UNMAPPED_MODULE_LABEL.to_owned(),
            },
        }
    }

    /// Expands a raw selection against the registered modules.
    #[must_use]
    pub fn resolve_selection<'a, I>(&self, selected: I) -> DependencyClosure
    where
        I: IntoIterator<Item = &'a str>,
    {
        resolve_dependency_closure(selected, &self.dependencies, &self.selectable)
    }

    /// Renders a reason with module labels, falling back to ids.
    #[must_use]
    pub fn describe_reason(&self, reason: &DependencyReason) -> String {
        let added = reason
            .added_because_of_this
            .iter()
            .map(|module_id| self.module_label(module_id).unwrap_or(module_id))
            .collect::<Vec<_>>()
            .join(", ");
        let because = self
            .module_label(&reason.because)
            .unwrap_or(&reason.because);
        format!("Selected [{because}], automatically added [{added}]")
    }

    fn modules(&self) -> impl Iterator<Item = (&ModuleGroup, &RegisteredModule)> {
        self.groups
            .iter()
            .flat_map(|group| group.modules.iter().map(move |module| (group, module)))
    }
}
