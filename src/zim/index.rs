use std::collections::HashMap;

use crate::error::{Error, Result};

use super::structures::IndexEntry;

/// In-memory directory mapping entry names to their byte ranges.
///
/// Lookups are exact and case-sensitive. The index is immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Index {
    entries: HashMap<String, IndexEntry>,
}

impl Index {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Add an entry during construction. The format forbids duplicate names.
    pub(crate) fn insert(&mut self, name: String, entry: IndexEntry) -> Result<()> {
        if self.entries.contains_key(&name) {
            return Err(Error::InvalidFormat(format!("duplicate entry name {name:?}")));
        }
        self.entries.insert(name, entry);
        Ok(())
    }

    /// Find an entry by exact name
    pub fn lookup(&self, name: &str) -> Result<&IndexEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries ordered by name
    pub fn sorted(&self) -> Vec<(&str, &IndexEntry)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}
