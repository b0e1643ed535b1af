use std::collections::BTreeMap;
use std::sync::Arc;

use super::ConfigBase;
use crate::def::ConfigDef;
use crate::error::{ConfigError, ConfigResult};
use crate::legacy::{LegacyHandler, LegacyKey};
use crate::option::ConfigOption;

/// Schema-bound container: only keys of its definition can be stored.
#[derive(Clone)]
pub struct StaticConfig {
    def: Arc<ConfigDef>,
    options: BTreeMap<String, ConfigOption>,
    legacy: Option<Arc<dyn LegacyHandler>>,
}

impl StaticConfig {
    /// Empty container bound to `def`.
    #[must_use]
    pub fn new(def: Arc<ConfigDef>) -> Self {
        Self {
            def,
            options: BTreeMap::new(),
            legacy: None,
        }
    }

    /// Container bound to `def` with every key at its default.
    #[must_use]
    pub fn with_defaults(def: Arc<ConfigDef>) -> Self {
        let mut config = Self::new(def);
        config.set_defaults();
        config
    }

    /// Attach a legacy hook consulted before key resolution.
    #[must_use]
    pub fn with_legacy_handler(mut self, handler: Arc<dyn LegacyHandler>) -> Self {
        self.legacy = Some(handler);
        self
    }

    /// (Re)initialize every schema key to its default. Shortcut keys hold
    /// nothing and are skipped.
    pub fn set_defaults(&mut self) {
        for (key, opt_def) in self.def.iter() {
            if opt_def.shortcut.is_empty() {
                self.options
                    .insert(key.to_owned(), opt_def.create_default_option());
            }
        }
    }

    /// The bound definition.
    #[must_use]
    pub fn shared_def(&self) -> &Arc<ConfigDef> {
        &self.def
    }
}

impl std::fmt::Debug for StaticConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticConfig")
            .field("options", &self.options)
            .field("schema_keys", &self.def.len())
            .finish_non_exhaustive()
    }
}

impl ConfigBase for StaticConfig {
    fn def(&self) -> Option<&ConfigDef> {
        Some(&self.def)
    }

    fn optptr(&self, key: &str) -> Option<&ConfigOption> {
        self.options.get(key)
    }

    fn optptr_mut(&mut self, key: &str) -> Option<&mut ConfigOption> {
        self.options.get_mut(key)
    }

    fn store(&mut self, key: &str, opt: ConfigOption) -> ConfigResult<&mut ConfigOption> {
        if !self.def.contains(key) {
            return Err(ConfigError::UnknownOption {
                key: key.to_owned(),
            });
        }
        self.options.insert(key.to_owned(), opt);
        self.options
            .get_mut(key)
            .ok_or_else(|| ConfigError::OptionNotSet {
                key: key.to_owned(),
            })
    }

    fn keys(&self) -> Vec<String> {
        self.def
            .keys()
            .filter(|key| self.options.contains_key(*key))
            .map(str::to_owned)
            .collect()
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
