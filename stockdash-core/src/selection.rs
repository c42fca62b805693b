//! Batch selection tracking, independent of what is rendered.

use std::collections::HashSet;

/// The set of stock identifiers currently chosen for a batch operation.
///
/// Ephemeral: held only in memory, cleared on successful submission or
/// explicit deselect-all.
#[derive(Debug, Default, Clone)]
pub struct SelectionManager {
    chosen: HashSet<String>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership for `id`. Returns true when the id is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.chosen.remove(id) {
            false
        } else {
            self.chosen.insert(id.to_string());
            true
        }
    }

    /// Add every currently visible id to the selection.
    ///
    /// Operates only on the visible/filtered set — ids hidden by a text
    /// filter are never pulled in.
    pub fn select_all<I, S>(&mut self, visible: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chosen.extend(visible.into_iter().map(Into::into));
    }

    pub fn clear(&mut self) {
        self.chosen.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.chosen.contains(id)
    }

    pub fn selected(&self) -> &HashSet<String> {
        &self.chosen
    }

    /// Selection as a sorted list, for deterministic request payloads.
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.chosen.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.chosen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chosen.is_empty()
    }
}
