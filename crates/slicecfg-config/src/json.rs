//! JSON preset documents.
//!
//! A preset is a flat JSON object. A fixed set of metadata keys is pulled
//! out into [`LoadedPreset::key_values`]; every other key is an option whose
//! value is a string or an array. Arrays are rendered into one
//! comma-separated string (string elements quoted and C-escaped) and
//! deserialized in a single call.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::ConfigBase;
use crate::error::{ConfigError, ConfigResult};
use crate::option::{ConfigOption, escape_string_cstyle, join_items, split_items};
use crate::substitution::{ConfigSubstitutionContext, ForwardCompatibilitySubstitutionRule};

/// Maximum accepted preset size (16 MiB).
pub const MAX_PRESET_FILE_SIZE: u64 = 16_777_216;

/// Metadata key: document format version.
pub const KEY_VERSION: &str = "version";
/// Metadata key: preset name.
pub const KEY_NAME: &str = "name";
/// Metadata key: parent preset.
pub const KEY_INHERITS: &str = "inherits";

/// Keys that describe the document rather than a setting. Matched
/// case-insensitively; reported under these spellings.
pub const METADATA_KEYS: &[&str] = &[
    KEY_VERSION,
    KEY_NAME,
    "url",
    "type",
    "setting_id",
    "filament_id",
    "from",
    "description",
    "instantiation",
    "is_custom",
    KEY_INHERITS,
];

/// Name of documents that hold a project's own settings.
pub const PROJECT_SETTINGS_NAME: &str = "project_settings";

/// Per-project record of keys that differ from the system preset.
pub const DIFFERENT_SETTINGS_KEY: &str = "different_settings_to_system";

/// Historical value migration: when `key` is loaded with one of `values`,
/// `target` is set to `target_value` after the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteRule {
    /// Key whose raw value triggers the rule.
    pub key: &'static str,
    /// Raw values that trigger it.
    pub values: &'static [&'static str],
    /// Key rewritten afterwards.
    pub target: &'static str,
    /// Text deserialized into `target`.
    pub target_value: &'static str,
}

/// Migrations applied by [`load_from_json`].
pub const REWRITE_RULES: &[RewriteRule] = &[
    RewriteRule {
        key: "support_type",
        values: &["hybrid(auto)"],
        target: "support_style",
        target_value: "tree_hybrid",
    },
    RewriteRule {
        key: "wall_infill_order",
        values: &["infill/outer wall/inner wall", "infill/inner wall/outer wall"],
        target: "is_infill_first",
        target_value: "true",
    },
];

/// Outcome of a successful document load.
#[derive(Debug, Clone, Default)]
pub struct LoadedPreset {
    /// Metadata pulled out of the document, keyed by canonical spelling.
    pub key_values: BTreeMap<String, String>,
    /// Substitutions and dropped keys seen while loading.
    pub substitutions: ConfigSubstitutionContext,
}

impl LoadedPreset {
    /// Metadata value for `key`.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.key_values.get(key).map(String::as_str)
    }
}

/// Read and load the preset at `path` into `config`.
///
/// With `load_inherits_to_config` unset, `inherits` is reported as metadata;
/// otherwise it is treated like any option key.
///
/// # Errors
///
/// [`ConfigError::ReadError`] and [`ConfigError::ValidationError`] (size
/// limit) for the file itself, [`ConfigError::JsonParseError`] for malformed
/// documents, plus every hard failure of [`load_from_json_str`].
pub fn load_from_json<C: ConfigBase + ?Sized>(
    config: &mut C,
    path: &Path,
    rule: ForwardCompatibilitySubstitutionRule,
    load_inherits_to_config: bool,
) -> ConfigResult<LoadedPreset> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
    if size > MAX_PRESET_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "preset file is {size} bytes, exceeding the {MAX_PRESET_FILE_SIZE} byte limit"
            ),
        });
    }

    let preset = load_document(
        config,
        &path.display().to_string(),
        &content,
        rule,
        load_inherits_to_config,
    )?;
    info!(
        path = %path.display(),
        preset_name = preset.metadata(KEY_NAME).unwrap_or_default(),
        substitutions = preset.substitutions.substitutions.len(),
        unrecognized = preset.substitutions.unrecognized_keys.len(),
        "Loaded preset"
    );
    Ok(preset)
}

/// Load an in-memory preset document into `config`.
///
/// # Errors
///
/// [`ConfigError::JsonParseError`] when `text` is not a JSON object,
/// [`ConfigError::MissingDefinition`] when `config` has no schema, and
/// [`ConfigError::InvalidValue`] / [`ConfigError::TypeMismatch`] for values
/// that neither parse nor substitute. Unknown keys are skipped.
pub fn load_from_json_str<C: ConfigBase + ?Sized>(
    config: &mut C,
    text: &str,
    rule: ForwardCompatibilitySubstitutionRule,
    load_inherits_to_config: bool,
) -> ConfigResult<LoadedPreset> {
    load_document(config, "<memory>", text, rule, load_inherits_to_config)
}

fn load_document<C: ConfigBase + ?Sized>(
    config: &mut C,
    origin: &str,
    text: &str,
    rule: ForwardCompatibilitySubstitutionRule,
    load_inherits_to_config: bool,
) -> ConfigResult<LoadedPreset> {
    let document: serde_json::Map<String, Value> =
        serde_json::from_str(text).map_err(|e| ConfigError::JsonParseError {
            path: origin.to_owned(),
            source: e,
        })?;
    if config.def().is_none() {
        return Err(ConfigError::MissingDefinition {
            key: origin.to_owned(),
        });
    }

    let mut preset = LoadedPreset {
        key_values: BTreeMap::new(),
        substitutions: ConfigSubstitutionContext::new(rule),
    };
    let mut is_project_settings = false;
    let mut triggered: Vec<&RewriteRule> = Vec::new();

    for (key, value) in &document {
        let metadata_key = METADATA_KEYS
            .iter()
            .find(|m| m.eq_ignore_ascii_case(key))
            .filter(|m| !(load_inherits_to_config && **m == KEY_INHERITS));
        if let Some(metadata_key) = metadata_key {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if *metadata_key == KEY_NAME && text == PROJECT_SETTINGS_NAME {
                is_project_settings = true;
            }
            preset.key_values.insert((*metadata_key).to_owned(), text);
            continue;
        }

        let text = match value {
            Value::String(s) => s.clone(),
            Value::Array(items) => render_array(items),
            other => {
                debug!(key = %key, value = %other, "Skipping non-string preset value");
                continue;
            },
        };
        match config.set_deserialize(key, &text, &mut preset.substitutions, false) {
            Ok(()) => {},
            Err(ConfigError::UnknownOption { .. }) => {
                debug!(key = %key, "Skipping unknown option");
                continue;
            },
            Err(err) => return Err(err),
        }

        if let Value::String(raw) = value {
            triggered.extend(
                REWRITE_RULES
                    .iter()
                    .filter(|r| r.key == key.as_str() && r.values.contains(&raw.as_str())),
            );
        }
    }

    let mut touched: Vec<&str> = Vec::new();
    for rewrite in triggered {
        let Some(opt) = config.option_mut(rewrite.target, true).ok().flatten() else {
            debug!(rewrite_target = rewrite.target, "Rewrite target not defined, skipping");
            continue;
        };
        if opt.deserialize(rewrite.target_value, false) {
            debug!(
                key = rewrite.key,
                rewrite_target = rewrite.target,
                value = rewrite.target_value,
                "Applied legacy value rewrite"
            );
            touched.push(rewrite.key);
            touched.push(rewrite.target);
        }
    }
    if is_project_settings && !touched.is_empty() {
        record_different_settings(config, &touched);
    }

    config.handle_legacy_composite();
    Ok(preset)
}

/// Render array elements as one comma-separated value. String elements are
/// quoted and escaped; anything else is written as JSON text.
#[must_use]
pub fn render_array(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => format!("\"{}\"", escape_string_cstyle(s)),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Append `keys` to the print-settings entry (the first element) of the
/// project's difference list.
fn record_different_settings<C: ConfigBase + ?Sized>(config: &mut C, keys: &[&str]) {
    let Some(ConfigOption::Strings(entries)) = config
        .option_mut(DIFFERENT_SETTINGS_KEY, true)
        .ok()
        .flatten()
    else {
        debug!("No different_settings_to_system option, skipping");
        return;
    };
    if entries.is_empty() {
        entries.push(String::new());
    }
    let Some(first) = entries.first_mut() else {
        return;
    };
    let mut listed: Vec<String> = if first.is_empty() {
        Vec::new()
    } else {
        split_items(first, ';').unwrap_or_else(|| vec![first.clone()])
    };
    for key in keys {
        if !listed.iter().any(|k| k == key) {
            listed.push((*key).to_owned());
        }
    }
    *first = join_items(listed, ';');
}
