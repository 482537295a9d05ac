use crate::effective::OverrideDelta;
use crate::permission_key::PermissionKeySet;

/// Mutation seam shared by the role template editor and the account override editor.
///
/// Quick ops and menu toggles are written once against this trait, so both editors
/// behave identically for the same subtree and operation.
pub trait GrantEditor {
    /// Makes the effective keys inside `scope` equal exactly `target`.
    ///
    /// Keys outside `scope ∪ target` are left untouched.
    fn replace_scope(&mut self, scope: &PermissionKeySet, target: &PermissionKeySet);

    /// Grants `keys` additively without touching anything else.
    fn grant(&mut self, keys: &PermissionKeySet);
}

/// Template mode: the draft is the full key set.
impl GrantEditor for PermissionKeySet {
    fn replace_scope(&mut self, scope: &PermissionKeySet, target: &PermissionKeySet) {
        self.retain(|key| !scope.contains(key));
        self.extend(target.iter().cloned());
    }

    fn grant(&mut self, keys: &PermissionKeySet) {
        self.extend(keys.iter().cloned());
    }
}

/// Override mode: every scoped key becomes an explicit decision, independent of the template.
impl GrantEditor for OverrideDelta {
    fn replace_scope(&mut self, scope: &PermissionKeySet, target: &PermissionKeySet) {
        for key in scope.union(target) {
            if target.contains(key) {
                self.force_add(key);
            } else {
                self.force_remove(key);
            }
        }
    }

    fn grant(&mut self, keys: &PermissionKeySet) {
        for key in keys {
            self.force_add(key);
        }
    }
}
