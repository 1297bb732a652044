//! Selection tracker: the bounded, recency-ordered set of attached documents.
//!
//! At most [`MAX_SELECTED`] identifiers are selected at once. Selecting one
//! more evicts the least recently selected. Checkbox state is never stored;
//! it is projected from the selection on every render.

use crate::document::DocumentRegistry;
use serde::{Deserialize, Serialize};

/// Maximum number of documents attached to a conversation.
pub const MAX_SELECTED: usize = 2;

/// Ordered selection, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionTracker {
    selected: Vec<String>,
}

/// One row of the UI checkbox list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkbox {
    pub identifier: String,
    pub label: String,
    pub checked: bool,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a checkbox change.
    ///
    /// Returns the identifier evicted to make room, if any.
    pub fn toggle(&mut self, identifier: &str, is_now_selected: bool) -> Option<String> {
        if !is_now_selected {
            self.selected.retain(|id| id != identifier);
            return None;
        }

        if self.contains(identifier) {
            return None;
        }

        self.selected.push(identifier.to_string());
        if self.selected.len() > MAX_SELECTED {
            Some(self.selected.remove(0))
        } else {
            None
        }
    }

    /// Currently selected identifiers, oldest first.
    pub fn current(&self) -> &[String] {
        &self.selected
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.selected.iter().any(|id| id == identifier)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Project the registry into checkbox rows.
    pub fn checkboxes(&self, registry: &DocumentRegistry) -> Vec<Checkbox> {
        registry
            .entries()
            .iter()
            .map(|doc| Checkbox {
                identifier: doc.identifier.clone(),
                label: doc.label.clone(),
                checked: self.contains(&doc.identifier),
            })
            .collect()
    }
}
