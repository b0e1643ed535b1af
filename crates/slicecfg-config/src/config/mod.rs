//! Config containers.
//!
//! [`ConfigBase`] carries every behavior shared by the two container kinds:
//! option access, the substitution-aware deserialization pipeline, ratio
//! resolution, environment export and file loading. Implementors only
//! provide storage and, optionally, a schema and legacy hooks.

mod dynamic;
mod pipeline;
mod static_config;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::def::ConfigDef;
use crate::env::{EnvExporter, env_var_name};
use crate::error::{ConfigError, ConfigResult};
use crate::json::{self, LoadedPreset};
use crate::legacy::LegacyKey;
use crate::option::{ConfigOption, OptionType};
use crate::substitution::{ConfigSubstitutionContext, ForwardCompatibilitySubstitutionRule};

pub use dynamic::DynamicConfig;
pub use static_config::StaticConfig;

/// Key that zero-valued `*_line_width` options fall back to.
pub const LINE_WIDTH_KEY: &str = "line_width";

/// Suffix marking per-feature line width options.
pub const LINE_WIDTH_SUFFIX: &str = "_line_width";

/// A mutable mapping from option key to typed value.
///
/// The trait is object safe; loaders and legacy hooks take
/// `&mut dyn ConfigBase`.
pub trait ConfigBase {
    /// Schema keys are resolved against, if any.
    fn def(&self) -> Option<&ConfigDef>;

    /// Stored value under the canonical `key`.
    fn optptr(&self, key: &str) -> Option<&ConfigOption>;

    /// Mutable stored value under the canonical `key`.
    fn optptr_mut(&mut self, key: &str) -> Option<&mut ConfigOption>;

    /// Store `opt` under the canonical `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Schema-bound containers return [`ConfigError::UnknownOption`] for
    /// keys outside their schema.
    fn store(&mut self, key: &str, opt: ConfigOption) -> ConfigResult<&mut ConfigOption>;

    /// Keys that currently hold a value, in sorted order.
    fn keys(&self) -> Vec<String>;

    /// Translate a key/value pair written by an older version.
    fn handle_legacy(&self, _key: &str, _value: &str) -> LegacyKey {
        LegacyKey::Current
    }

    /// Cross-key fixups once a whole document is loaded.
    fn handle_legacy_composite(&mut self) {}

    /// Stored value for `key`, if any.
    fn option(&self, key: &str) -> Option<&ConfigOption> {
        self.optptr(key)
    }

    /// Stored value for `key`, instantiating the schema default under the
    /// canonical key (exact match or alias) when `create` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownOption`] when `create` is set and no
    /// definition matches `key`.
    fn option_mut(&mut self, key: &str, create: bool) -> ConfigResult<Option<&mut ConfigOption>> {
        if self.optptr(key).is_some() {
            return Ok(self.optptr_mut(key));
        }
        if !create {
            return Ok(None);
        }
        let (canonical, opt) = self
            .def()
            .and_then(|def| def.resolve(key))
            .map(|(canonical, opt_def)| (canonical.to_owned(), opt_def.create_default_option()))
            .ok_or_else(|| ConfigError::UnknownOption {
                key: key.to_owned(),
            })?;
        if self.optptr(&canonical).is_some() {
            return Ok(self.optptr_mut(&canonical));
        }
        self.store(&canonical, opt).map(Some)
    }

    /// Number of stored options.
    fn len(&self) -> usize {
        self.keys().len()
    }

    /// Whether no option is stored.
    fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// Deserialize `value` into `key`, failing on anything but success.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownOption`] for unresolvable keys,
    /// [`ConfigError::InvalidValue`] when the text does not parse and no
    /// substitution applies, [`ConfigError::TypeMismatch`] when a schema
    /// default has the wrong variant.
    fn set_deserialize(
        &mut self,
        key: &str,
        value: &str,
        ctx: &mut ConfigSubstitutionContext,
        append: bool,
    ) -> ConfigResult<()> {
        if pipeline::set_deserialize(self, key, value, ctx, append)? {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                key: key.to_owned(),
                value: value.to_owned(),
            })
        }
    }

    /// Like [`set_deserialize`](Self::set_deserialize), reporting failures
    /// as `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Only [`ConfigError::TypeMismatch`] escapes.
    fn set_deserialize_nothrow(
        &mut self,
        key: &str,
        value: &str,
        ctx: &mut ConfigSubstitutionContext,
        append: bool,
    ) -> ConfigResult<bool> {
        match pipeline::set_deserialize(self, key, value, ctx, append) {
            Ok(ok) => Ok(ok),
            Err(err @ ConfigError::TypeMismatch { .. }) => Err(err),
            Err(err) => {
                debug!(key, value, error = %err, "Rejected option value");
                Ok(false)
            },
        }
    }

    /// Deserialize without consulting the legacy hook.
    ///
    /// # Errors
    ///
    /// See [`set_deserialize`](Self::set_deserialize); failures to parse are
    /// reported as `Ok(false)`.
    fn set_deserialize_raw(
        &mut self,
        key: &str,
        value: &str,
        ctx: &mut ConfigSubstitutionContext,
        append: bool,
    ) -> ConfigResult<bool> {
        pipeline::set_deserialize_raw(self, key, value, ctx, append)
    }

    /// Canonical text of the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OptionNotSet`] if `key` holds no value.
    fn opt_serialize(&self, key: &str) -> ConfigResult<String> {
        self.option(key)
            .map(ConfigOption::serialize)
            .ok_or_else(|| ConfigError::OptionNotSet {
                key: key.to_owned(),
            })
    }

    /// Absolute numeric value of `key`, following `ratio_over` references.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OptionNotSet`] for a missing option anywhere on the
    /// chain, [`ConfigError::NotNumeric`] for options without a numeric
    /// reading, [`ConfigError::RatioCycle`] if the chain loops.
    fn get_abs_value(&self, key: &str) -> ConfigResult<f64> {
        pipeline::resolve_abs_value(self, key, &mut Vec::new())
    }

    /// Absolute value of a float-or-percent option against an explicit base.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OptionNotSet`] if unset, [`ConfigError::TypeMismatch`]
    /// for any other variant.
    fn get_abs_value_ratio(&self, key: &str, ratio_over: f64) -> ConfigResult<f64> {
        match self.option(key) {
            Some(ConfigOption::FloatOrPercent(v)) => Ok(v.get_abs_value(ratio_over)),
            Some(other) => Err(ConfigError::TypeMismatch {
                expected: OptionType::FloatOrPercent,
                found: other.option_type(),
            }),
            None => Err(ConfigError::OptionNotSet {
                key: key.to_owned(),
            }),
        }
    }

    /// Export every stored option as `SLIC3R_<KEY>`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvExport`] if the exporter fails.
    fn set_env(&self, exporter: &mut dyn EnvExporter) -> ConfigResult<()> {
        for key in self.keys() {
            let value = self.opt_serialize(&key)?;
            let name = env_var_name(&key);
            exporter
                .export(&name, &value)
                .map_err(|source| ConfigError::EnvExport { name, source })?;
        }
        Ok(())
    }

    /// Load a flat key/value map. Unknown keys are skipped.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for values that neither parse nor
    /// substitute, and [`ConfigError::TypeMismatch`].
    fn load_string_map(
        &mut self,
        map: &BTreeMap<String, String>,
        rule: ForwardCompatibilitySubstitutionRule,
    ) -> ConfigResult<ConfigSubstitutionContext> {
        let mut ctx = ConfigSubstitutionContext::new(rule);
        for (key, value) in map {
            match self.set_deserialize(key, value, &mut ctx, false) {
                Ok(()) => {},
                Err(ConfigError::UnknownOption { key }) => {
                    debug!(key = %key, "Skipping unknown option");
                },
                Err(err) => return Err(err),
            }
        }
        Ok(ctx)
    }

    /// Load a preset document; see [`json::load_from_json`].
    ///
    /// # Errors
    ///
    /// I/O and JSON syntax failures, plus any hard value failure.
    fn load_from_json(
        &mut self,
        path: &Path,
        rule: ForwardCompatibilitySubstitutionRule,
        load_inherits_to_config: bool,
    ) -> ConfigResult<LoadedPreset> {
        json::load_from_json(self, path, rule, load_inherits_to_config)
    }

    /// Load a file, choosing the loader from its extension.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedFileFormat`] for G-code and unknown
    /// extensions, otherwise whatever the JSON loader reports.
    fn load(
        &mut self,
        path: &Path,
        rule: ForwardCompatibilitySubstitutionRule,
    ) -> ConfigResult<ConfigSubstitutionContext> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => self.load_from_json(path, rule, true).map(|p| p.substitutions),
            Some("gcode") => Err(ConfigError::UnsupportedFileFormat {
                path: path.display().to_string(),
                detail: "loading from G-code is not implemented".to_owned(),
            }),
            _ => Err(ConfigError::UnsupportedFileFormat {
                path: path.display().to_string(),
                detail: "expected a .json file".to_owned(),
            }),
        }
    }
}
