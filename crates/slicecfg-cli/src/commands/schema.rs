//! `schema` - list the option definitions in use.

use std::sync::Arc;

use anyhow::Result;
use slicecfg_config::{ConfigDef, ConfigOptionDef};

use super::OutputFormat;
use crate::theme::Theme;

pub(crate) fn run(def: &Arc<ConfigDef>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let object: serde_json::Map<String, serde_json::Value> = def
                .iter()
                .map(|(key, option)| (key.to_owned(), describe(key, option)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&object)?);
        },
        OutputFormat::Pretty => {
            println!("\n{}", Theme::header(&format!("{} options", def.len())));
            println!("{}", Theme::separator());
            for (key, option) in def.iter() {
                println!("  {} {}", Theme::key(key), Theme::dimmed(&option.option_type.to_string()));
                if let Some(default) = &option.default_value {
                    println!("      default  {default}");
                }
                if !option.aliases.is_empty() {
                    println!("      aliases  {}", option.aliases.join(", "));
                }
                if !option.shortcut.is_empty() {
                    println!("      expands  {}", option.shortcut.join(", "));
                }
                if let Some(over) = &option.ratio_over {
                    println!("      ratio of {over}");
                }
                println!("      cli      --{}", option.cli_args(key).join(", --"));
            }
        },
    }
    Ok(())
}

fn describe(key: &str, option: &ConfigOptionDef) -> serde_json::Value {
    serde_json::json!({
        "type": option.option_type.to_string(),
        "default": option.default_value.as_ref().map(ToString::to_string),
        "aliases": option.aliases,
        "shortcut": option.shortcut,
        "nullable": option.nullable,
        "ratio_over": option.ratio_over,
        "cli": option.cli_args(key),
    })
}
