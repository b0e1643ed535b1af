//! `get` - print one option.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use slicecfg_config::{ConfigBase, ConfigDef, ForwardCompatibilitySubstitutionRule};

use super::show::canonical_keys;
use super::{OutputFormat, load_preset};

pub(crate) fn run(
    def: &Arc<ConfigDef>,
    path: &Path,
    rule: ForwardCompatibilitySubstitutionRule,
    key: &str,
    abs: bool,
    format: OutputFormat,
) -> Result<()> {
    let (config, _) = load_preset(def, path, rule)?;
    let canonical = canonical_keys(def, &[key.to_owned()])?
        .pop()
        .with_context(|| format!("Unknown option: {key}"))?;

    let value = if abs {
        let value = config
            .get_abs_value(&canonical)
            .with_context(|| format!("Cannot resolve {canonical}"))?;
        serde_json::Value::from(value)
    } else {
        let text = config
            .opt_serialize(&canonical)
            .with_context(|| format!("{} does not set {canonical}", path.display()))?;
        serde_json::Value::from(text)
    };

    match format {
        OutputFormat::Json => {
            let mut object = serde_json::Map::new();
            object.insert(canonical, value);
            println!("{}", serde_json::to_string_pretty(&object)?);
        },
        OutputFormat::Pretty => match value {
            serde_json::Value::String(text) => println!("{text}"),
            other => println!("{other}"),
        },
    }
    Ok(())
}
