//! Document registry: the static list of analyzable documents.
//!
//! Built once at startup from configuration and never mutated. Each entry
//! maps a bond identifier (CUSIP) to a human label and a local file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A document the user may attach to the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Unique, stable key (a CUSIP for the bundled documents)
    pub identifier: String,

    /// Human-readable label shown next to the checkbox
    pub label: String,

    /// Where the file lives on disk
    pub local_path: PathBuf,
}

impl DocumentRef {
    pub fn new(
        identifier: impl Into<String>,
        label: impl Into<String>,
        local_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            label: label.into(),
            local_path: local_path.into(),
        }
    }

    /// The file name used as the remote display name.
    pub fn file_name(&self) -> String {
        self.local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.identifier.clone())
    }
}

/// Read-only lookup from identifier to [`DocumentRef`].
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    entries: Vec<DocumentRef>,
}

impl DocumentRegistry {
    /// Build a registry from refs in display order.
    ///
    /// Later duplicates of an identifier are ignored; configuration
    /// validation rejects them before this point.
    pub fn new(entries: impl IntoIterator<Item = DocumentRef>) -> Self {
        let mut registry = Self::default();
        for entry in entries {
            if registry.lookup(&entry.identifier).is_some() {
                tracing::warn!(identifier = %entry.identifier, "Duplicate document ignored");
                continue;
            }
            registry.entries.push(entry);
        }
        registry
    }

    pub fn lookup(&self, identifier: &str) -> Option<&DocumentRef> {
        self.entries.iter().find(|d| d.identifier == identifier)
    }

    /// Label for an identifier, or `""` when the identifier is unknown.
    pub fn label(&self, identifier: &str) -> &str {
        self.lookup(identifier).map(|d| d.label.as_str()).unwrap_or("")
    }

    pub fn entries(&self) -> &[DocumentRef] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
