//! `diff` - compare two presets.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use slicecfg_config::{ConfigBase, ConfigDef, DynamicConfig, ForwardCompatibilitySubstitutionRule};

use super::{OutputFormat, load_preset};
use crate::theme::Theme;

/// One differing key: `(left, right)`, `None` where a side does not set it.
type Change = (Option<String>, Option<String>);

pub(crate) fn run(
    def: &Arc<ConfigDef>,
    left: &Path,
    right: &Path,
    rule: ForwardCompatibilitySubstitutionRule,
    format: OutputFormat,
) -> Result<()> {
    let (left_config, _) = load_preset(def, left, rule)?;
    let (right_config, _) = load_preset(def, right, rule)?;
    let changes = changes(&left_config, &right_config);

    match format {
        OutputFormat::Json => {
            let object: serde_json::Map<String, serde_json::Value> = changes
                .into_iter()
                .map(|(key, (l, r))| (key, serde_json::json!({ "left": l, "right": r })))
                .collect();
            println!("{}", serde_json::to_string_pretty(&object)?);
        },
        OutputFormat::Pretty => {
            if changes.is_empty() {
                println!("{}", Theme::info("Presets are equal"));
                return Ok(());
            }
            let unset = Theme::dimmed("(unset)");
            for (key, (l, r)) in &changes {
                println!("{}", Theme::key(key));
                println!("  - {}", l.as_deref().map_or_else(|| unset.clone(), ToOwned::to_owned));
                println!("  + {}", r.as_deref().map_or_else(|| unset.clone(), ToOwned::to_owned));
            }
        },
    }
    Ok(())
}

/// Keys set differently on either side, including keys only one side sets.
fn changes(left: &DynamicConfig, right: &DynamicConfig) -> BTreeMap<String, Change> {
    let mut changes: BTreeMap<String, Change> = left
        .diff(right)
        .into_iter()
        .map(|key| {
            let change = (left.opt_serialize(&key).ok(), right.opt_serialize(&key).ok());
            (key, change)
        })
        .collect();

    for key in left.keys() {
        if right.option(&key).is_none() {
            let value = left.opt_serialize(&key).ok();
            changes.insert(key, (value, None));
        }
    }
    for key in right.keys() {
        if left.option(&key).is_none() {
            let value = right.opt_serialize(&key).ok();
            changes.insert(key, (None, value));
        }
    }
    changes
}
