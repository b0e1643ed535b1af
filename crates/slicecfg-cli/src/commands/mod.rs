//! Subcommands and the loading steps they share.

pub(crate) mod diff;
pub(crate) mod env;
pub(crate) mod get;
pub(crate) mod schema;
pub(crate) mod show;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use slicecfg_config::{
    ConfigBase, ConfigDef, DynamicConfig, ForwardCompatibilitySubstitutionRule, LoadedPreset,
};

use crate::theme::Theme;

/// Output format of listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Aligned, colored text
    Pretty,
    /// A JSON object
    Json,
}

/// The schema at `path`, or the built-in sample.
pub(crate) fn load_schema(path: Option<&Path>) -> Result<Arc<ConfigDef>> {
    let def = match path {
        Some(path) => ConfigDef::load_file(path)
            .with_context(|| format!("Failed to load schema {}", path.display()))?,
        None => ConfigDef::sample().context("Built-in schema is invalid")?,
    };
    Ok(Arc::new(def))
}

/// Load `path` into a fresh container and report what was recovered.
pub(crate) fn load_preset(
    def: &Arc<ConfigDef>,
    path: &Path,
    rule: ForwardCompatibilitySubstitutionRule,
) -> Result<(DynamicConfig, LoadedPreset)> {
    let mut config = DynamicConfig::with_def(Arc::clone(def));
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let preset = if is_json {
        config.load_from_json(path, rule, false)
    } else {
        config.load(path, rule).map(|substitutions| LoadedPreset {
            key_values: BTreeMap::new(),
            substitutions,
        })
    }
    .with_context(|| format!("Failed to load {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        options = config.len(),
        substitutions = preset.substitutions.substitutions.len(),
        "Preset loaded"
    );
    report(path, &preset, rule);
    Ok((config, preset))
}

/// Whether substitutions of this load should be shown to the user.
/// System presets loaded under `EnableSystemSilent` stay quiet.
pub(crate) fn should_report(preset: &LoadedPreset, rule: ForwardCompatibilitySubstitutionRule) -> bool {
    match rule {
        ForwardCompatibilitySubstitutionRule::Enable => true,
        ForwardCompatibilitySubstitutionRule::EnableSystemSilent => {
            preset.metadata("from") != Some("system")
        },
        ForwardCompatibilitySubstitutionRule::Disable
        | ForwardCompatibilitySubstitutionRule::EnableSilent => false,
    }
}

fn report(path: &Path, preset: &LoadedPreset, rule: ForwardCompatibilitySubstitutionRule) {
    let ctx = &preset.substitutions;
    if should_report(preset, rule) {
        for substitution in &ctx.substitutions {
            eprintln!(
                "{}",
                Theme::warning(&format!("{}: substituted {substitution}", path.display()))
            );
        }
    }
    if !ctx.unrecognized_keys.is_empty() {
        eprintln!(
            "{}",
            Theme::info(&format!(
                "{}: dropped obsolete keys: {}",
                path.display(),
                ctx.unrecognized_keys.join(", ")
            ))
        );
    }
}

/// Serialized values of `keys`, skipping keys without a value.
pub(crate) fn serialize_keys<C: ConfigBase + ?Sized>(
    config: &C,
    keys: &[String],
) -> BTreeMap<String, String> {
    keys.iter()
        .filter_map(|key| {
            config
                .opt_serialize(key)
                .ok()
                .map(|value| (key.clone(), value))
        })
        .collect()
}

/// Print `values` in the requested format.
pub(crate) fn print_values(values: &BTreeMap<String, String>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(values)?);
        },
        OutputFormat::Pretty => {
            let width = values.keys().map(String::len).max().unwrap_or(0);
            for (key, value) in values {
                println!("  {} = {value}", Theme::key(&format!("{key:<width$}")));
            }
        },
    }
    Ok(())
}
