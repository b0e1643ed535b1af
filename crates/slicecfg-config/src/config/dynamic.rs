use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use super::ConfigBase;
use crate::def::ConfigDef;
use crate::error::ConfigResult;
use crate::legacy::{LegacyHandler, LegacyKey};
use crate::option::ConfigOption;

/// Schema-free container: any key may be stored.
///
/// A definition is optional. Without one, values can only be copied in
/// from other containers or stored directly with
/// [`set_key_value`](Self::set_key_value); string deserialization needs a
/// definition to know the option type.
#[derive(Clone, Default)]
pub struct DynamicConfig {
    options: BTreeMap<String, ConfigOption>,
    def: Option<Arc<ConfigDef>>,
    legacy: Option<Arc<dyn LegacyHandler>>,
}

impl DynamicConfig {
    /// Empty container with no definition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty container resolving keys against `def`.
    #[must_use]
    pub fn with_def(def: Arc<ConfigDef>) -> Self {
        Self {
            def: Some(def),
            ..Self::default()
        }
    }

    /// Attach a legacy hook consulted before key resolution.
    #[must_use]
    pub fn with_legacy_handler(mut self, handler: Arc<dyn LegacyHandler>) -> Self {
        self.legacy = Some(handler);
        self
    }

    /// Copy of the listed keys of `source`; keys it does not hold are skipped.
    #[must_use]
    pub fn from_keys<C: ConfigBase + ?Sized>(source: &C, keys: &[&str]) -> Self {
        let mut config = Self::new();
        config.apply_only(source, keys);
        config
    }

    /// Shared definition, if any.
    #[must_use]
    pub fn shared_def(&self) -> Option<&Arc<ConfigDef>> {
        self.def.as_ref()
    }

    /// Store `opt` under `key` as-is.
    pub fn set_key_value(&mut self, key: impl Into<String>, opt: ConfigOption) {
        self.options.insert(key.into(), opt);
    }

    /// Remove `key`, returning its value.
    pub fn erase(&mut self, key: &str) -> Option<ConfigOption> {
        self.options.remove(key)
    }

    /// Remove every value.
    pub fn clear(&mut self) {
        self.options.clear();
    }

    /// Copy every value of `other` in. Keys already present are updated in
    /// place; absent keys are added only when `create` is set.
    ///
    /// # Errors
    ///
    /// [`ConfigError::TypeMismatch`](crate::ConfigError::TypeMismatch) if a
    /// key holds a different variant on each side.
    pub fn apply<C: ConfigBase + ?Sized>(&mut self, other: &C, create: bool) -> ConfigResult<()> {
        for key in other.keys() {
            let Some(src) = other.option(&key) else {
                continue;
            };
            match self.options.get_mut(&key) {
                Some(dst) => dst.set(src)?,
                None if create => {
                    self.options.insert(key, src.clone());
                },
                None => {},
            }
        }
        Ok(())
    }

    /// Replace the listed keys with clones from `other`.
    pub fn apply_only<C: ConfigBase + ?Sized>(&mut self, other: &C, keys: &[&str]) {
        for key in keys {
            if let Some(src) = other.option(key) {
                self.options.insert((*key).to_owned(), src.clone());
            }
        }
    }

    /// Keys held by both containers whose values differ.
    #[must_use]
    pub fn diff<C: ConfigBase + ?Sized>(&self, other: &C) -> Vec<String> {
        self.options
            .iter()
            .filter(|(key, value)| other.option(key).is_some_and(|o| o != *value))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Same keys holding equal values.
    #[must_use]
    pub fn equals<C: ConfigBase + ?Sized>(&self, other: &C) -> bool {
        let keys: Vec<&String> = self.options.keys().collect();
        let other_keys = other.keys();
        keys.len() == other_keys.len()
            && keys.iter().zip(&other_keys).all(|(a, b)| *a == b)
            && self.diff(other).is_empty()
    }

    /// Stored `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigOption)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl std::fmt::Debug for DynamicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicConfig")
            .field("options", &self.options)
            .field("has_def", &self.def.is_some())
            .field("has_legacy_handler", &self.legacy.is_some())
            .finish_non_exhaustive()
    }
}

impl ConfigBase for DynamicConfig {
    fn def(&self) -> Option<&ConfigDef> {
        self.def.as_deref()
    }

    fn optptr(&self, key: &str) -> Option<&ConfigOption> {
        self.options.get(key)
    }

    fn optptr_mut(&mut self, key: &str) -> Option<&mut ConfigOption> {
        self.options.get_mut(key)
    }

    fn store(&mut self, key: &str, opt: ConfigOption) -> ConfigResult<&mut ConfigOption> {
        Ok(match self.options.entry(key.to_owned()) {
            Entry::Occupied(mut slot) => {
                slot.insert(opt);
                slot.into_mut()
            },
            Entry::Vacant(slot) => slot.insert(opt),
        })
    }

    fn keys(&self) -> Vec<String> {
        self.options.keys().cloned().collect()
    }

    fn handle_legacy(&self, key: &str, value: &str) -> LegacyKey {
        self.legacy
            .as_ref()
            .map_or(LegacyKey::Current, |h| h.handle_legacy(key, value))
    }

    fn handle_legacy_composite(&mut self) {
        if let Some(handler) = self.legacy.clone() {
            handler.handle_legacy_composite(self);
        }
    }
}
