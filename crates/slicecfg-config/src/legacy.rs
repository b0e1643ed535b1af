//! Translation of keys and values written by older software versions.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::ConfigBase;

/// Verdict of a legacy hook on one key/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyKey {
    /// The pair is current; use it as-is.
    Current,
    /// The pair maps onto a current key and value.
    Translated {
        /// Current key.
        key: String,
        /// Value in the current key's format.
        value: String,
    },
    /// The key no longer exists; drop the value.
    Removed,
}

/// Hook a container consults before resolving a key.
pub trait LegacyHandler: Send + Sync {
    /// Map one raw pair onto the current schema.
    fn handle_legacy(&self, key: &str, value: &str) -> LegacyKey;

    /// Cross-key fixups run once a whole document has been loaded.
    fn handle_legacy_composite(&self, _config: &mut dyn ConfigBase) {}
}

/// Table-driven [`LegacyHandler`]: renamed keys, removed keys and
/// per-value rewrites.
#[derive(Debug, Clone, Default)]
pub struct LegacyTable {
    renamed: BTreeMap<String, String>,
    removed: BTreeSet<String>,
    values: BTreeMap<(String, String), String>,
}

impl LegacyTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `old` is now called `new`.
    #[must_use]
    pub fn rename(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.renamed.insert(old.into(), new.into());
        self
    }

    /// `key` was dropped from the schema.
    #[must_use]
    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.removed.insert(key.into());
        self
    }

    /// Value `old` of `key` (its current name) is now spelled `new`.
    #[must_use]
    pub fn rewrite_value(
        mut self,
        key: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        self.values.insert((key.into(), old.into()), new.into());
        self
    }
}

impl LegacyHandler for LegacyTable {
    fn handle_legacy(&self, key: &str, value: &str) -> LegacyKey {
        if self.removed.contains(key) {
            return LegacyKey::Removed;
        }
        let current = self.renamed.get(key).map_or(key, String::as_str);
        let rewritten = self.values.get(&(current.to_owned(), value.to_owned()));
        if current == key && rewritten.is_none() {
            return LegacyKey::Current;
        }
        LegacyKey::Translated {
            key: current.to_owned(),
            value: rewritten.map_or_else(|| value.to_owned(), Clone::clone),
        }
    }
}
