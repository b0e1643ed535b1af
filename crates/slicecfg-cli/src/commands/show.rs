//! `show` - print the options of a preset.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use slicecfg_config::{
    ConfigBase, ConfigDef, DynamicConfig, ForwardCompatibilitySubstitutionRule, StaticConfig,
};

use super::{OutputFormat, load_preset, print_values, serialize_keys};
use crate::theme::Theme;

/// Load `path` and print the requested keys, or every key it sets.
pub(crate) fn run(
    def: &Arc<ConfigDef>,
    path: &Path,
    rule: ForwardCompatibilitySubstitutionRule,
    keys: &[String],
    defaults: bool,
    format: OutputFormat,
) -> Result<()> {
    let (loaded, preset) = load_preset(def, path, rule)?;

    let config = if defaults {
        with_defaults(def, &loaded)?
    } else {
        loaded
    };

    let keys = if keys.is_empty() {
        config.keys()
    } else {
        canonical_keys(def, keys)?
    };
    let values = serialize_keys(&config, &keys);

    if format == OutputFormat::Pretty {
        let title = preset.metadata("name").map_or_else(
            || path.display().to_string(),
            ToOwned::to_owned,
        );
        println!("\n{}", Theme::header(&title));
        if let Some(inherits) = preset.metadata("inherits") {
            println!("  {}", Theme::dimmed(&format!("inherits {inherits}")));
        }
        println!("{}", Theme::separator());
    }
    print_values(&values, format)
}

/// Schema defaults overlaid with `loaded`.
fn with_defaults(def: &Arc<ConfigDef>, loaded: &DynamicConfig) -> Result<DynamicConfig> {
    let mut merged = DynamicConfig::with_def(Arc::clone(def));
    merged.apply(&StaticConfig::with_defaults(Arc::clone(def)), true)?;
    merged.apply(loaded, true)?;
    Ok(merged)
}

/// Map keys and aliases onto canonical schema keys.
pub(crate) fn canonical_keys(def: &ConfigDef, keys: &[String]) -> Result<Vec<String>> {
    keys.iter()
        .map(|key| match def.resolve(key) {
            Some((canonical, _)) => Ok(canonical.to_owned()),
            None => bail!("Unknown option: {key}"),
        })
        .collect()
}
