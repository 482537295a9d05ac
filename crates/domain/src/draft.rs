use serde::{Deserialize, Serialize};

use crate::permission_key::PermissionKeySet;

/// Returns whether a draft differs from its saved snapshot.
///
/// Key sets compare by membership, so insertion order never makes a draft dirty.
#[must_use]
pub fn is_dirty<T: PartialEq>(saved: &T, draft: &T) -> bool {
    saved != draft
}

/// Saved snapshot and in-progress draft of one editable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftState<T> {
    saved: T,
    draft: T,
}

impl<T: Clone + PartialEq> DraftState<T> {
    /// Starts a clean session from a persisted snapshot.
    #[must_use]
    pub fn new(saved: T) -> Self {
        Self {
            draft: saved.clone(),
            saved,
        }
    }

    /// Returns the last persisted snapshot.
    #[must_use]
    pub fn saved(&self) -> &T {
        &self.saved
    }

    /// Returns the in-progress draft.
    #[must_use]
    pub fn draft(&self) -> &T {
        &self.draft
    }

    /// Returns the draft for mutation. The saved snapshot is never exposed mutably.
    pub fn draft_mut(&mut self) -> &mut T {
        &mut self.draft
    }

    /// Returns whether the draft differs from the saved snapshot.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        is_dirty(&self.saved, &self.draft)
    }

    /// Discards the draft.
    pub fn reset(&mut self) {
        self.draft = self.saved.clone();
    }

    /// Replaces both snapshots with the value the backend persisted.
    pub fn commit(&mut self, persisted: T) {
        self.draft = persisted.clone();
        self.saved = persisted;
    }
}

/// Keys added and removed by a draft relative to the saved snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySetDiff {
    /// Keys present in the draft only.
    pub added: PermissionKeySet,
    /// Keys present in the saved snapshot only.
    pub removed: PermissionKeySet,
}

impl KeySetDiff {
    /// Computes the minimal diff from `saved` to `draft`.
    #[must_use]
    pub fn between(saved: &PermissionKeySet, draft: &PermissionKeySet) -> Self {
        Self {
            added: draft.difference(saved).cloned().collect(),
            removed: saved.difference(draft).cloned().collect(),
        }
    }

    /// Returns whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
