//! TOML schema files.
//!
//! A schema lists one `[options.<key>]` table per option:
//!
//! ```toml
//! [options.inner_wall_line_width]
//! type = "float_or_percent"
//! default = "0"
//! ratio_over = "line_width"
//! ```
//!
//! Defaults are written in the option's canonical text form, exactly as a
//! preset would spell them.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::def::{ConfigDef, ConfigOptionDef};
use crate::error::{ConfigError, ConfigResult};
use crate::option::{EnumValues, OptionType};
use crate::validate;

/// Sample schema compiled into the binary.
const SAMPLE_SCHEMA_TOML: &str = include_str!("sample_schema.toml");

/// Maximum allowed schema file size (1 MB).
const MAX_SCHEMA_FILE_SIZE: u64 = 1_048_576;

// ---------------------------------------------------------------------------
// File model
// ---------------------------------------------------------------------------

/// Root of a schema file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaFile {
    /// Option tables keyed by option key.
    pub options: BTreeMap<String, OptionSchema>,
}

/// One `[options.<key>]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionSchema {
    /// Value variant.
    #[serde(rename = "type")]
    pub option_type: OptionType,
    /// Default in canonical text form.
    #[serde(default)]
    pub default: Option<String>,
    /// Alternative spellings of the key.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Keys a write fans out to.
    #[serde(default)]
    pub shortcut: Vec<String>,
    /// Enum names, numbered from zero in order.
    #[serde(default)]
    pub enum_values: Vec<String>,
    /// Whether a `bools` vector accepts `nil`.
    #[serde(default)]
    pub nullable: bool,
    /// Key percentages resolve against; `""` resolves to zero.
    #[serde(default)]
    pub ratio_over: Option<String>,
    /// Command-line spelling, `|`-separated.
    #[serde(default)]
    pub cli: String,
}

impl SchemaFile {
    /// Build and validate the definition set.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for defaults that do not parse and
    /// [`ConfigError::ValidationError`], [`ConfigError::RatioCycle`] or
    /// [`ConfigError::ShortcutCycle`] for inconsistent entries.
    pub fn into_def(self) -> ConfigResult<ConfigDef> {
        let mut def = ConfigDef::new();
        for (key, schema) in self.options {
            let mut opt_def = ConfigOptionDef::new(schema.option_type)
                .with_aliases(schema.aliases)
                .with_shortcut(schema.shortcut)
                .with_cli(schema.cli);
            if !schema.enum_values.is_empty() {
                opt_def =
                    opt_def.with_enum_values(Arc::new(EnumValues::from_names(schema.enum_values)));
            }
            if schema.nullable {
                opt_def = opt_def.nullable();
            }
            if let Some(ratio_over) = schema.ratio_over {
                opt_def = opt_def.with_ratio_over(ratio_over);
            }
            if let Some(text) = schema.default {
                let default = opt_def.parse_default(&key, &text)?;
                opt_def = opt_def.with_default(default);
            }
            def.add(key, opt_def);
        }
        validate::validate_def(&def)?;
        Ok(def)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ConfigDef {
    /// Parse a schema document. `origin` names it in error messages.
    ///
    /// # Errors
    ///
    /// [`ConfigError::SchemaParseError`] for malformed TOML, otherwise see
    /// [`SchemaFile::into_def`].
    pub fn from_toml_str(text: &str, origin: &str) -> ConfigResult<Self> {
        let file: SchemaFile = toml::from_str(text).map_err(|e| ConfigError::SchemaParseError {
            path: origin.to_owned(),
            source: e,
        })?;
        let def = file.into_def()?;
        debug!(origin, options = def.len(), "Loaded schema");
        Ok(def)
    }

    /// Read a schema file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ReadError`], [`ConfigError::ValidationError`] when the
    /// file exceeds 1 MB, otherwise see [`from_toml_str`](Self::from_toml_str).
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        // Check size after reading to avoid TOCTOU between stat and read.
        let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
        if size > MAX_SCHEMA_FILE_SIZE {
            return Err(ConfigError::ValidationError {
                field: path.display().to_string(),
                message: format!(
                    "schema file is {size} bytes, exceeding the {MAX_SCHEMA_FILE_SIZE} byte limit"
                ),
            });
        }

        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// The embedded sample schema: a small slice of a real printer profile.
    ///
    /// # Errors
    ///
    /// Only if the embedded document is broken.
    pub fn sample() -> ConfigResult<Self> {
        Self::from_toml_str(SAMPLE_SCHEMA_TOML, "<embedded sample>")
    }
}
