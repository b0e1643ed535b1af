//! Schema consistency checks.
//!
//! Validates that a [`ConfigDef`] only references keys it defines and that
//! shortcut expansions and `ratio_over` chains terminate.

use std::collections::BTreeMap;

use crate::def::ConfigDef;
use crate::error::{ConfigError, ConfigResult};
use crate::option::OptionType;

/// Validate a definition set.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate_def(def: &ConfigDef) -> ConfigResult<()> {
    validate_aliases(def)?;
    validate_shortcuts(def)?;
    validate_enums(def)?;
    validate_nullable(def)?;
    validate_ratio_over(def)?;
    Ok(())
}

fn validate_aliases(def: &ConfigDef) -> ConfigResult<()> {
    let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
    for (key, opt_def) in def.iter() {
        for alias in &opt_def.aliases {
            if def.contains(alias) {
                return Err(ConfigError::ValidationError {
                    field: format!("options.{key}.aliases"),
                    message: format!("alias '{alias}' shadows a defined option"),
                });
            }
            if let Some(owner) = owners.insert(alias.as_str(), key) {
                return Err(ConfigError::ValidationError {
                    field: format!("options.{key}.aliases"),
                    message: format!("alias '{alias}' is already used by '{owner}'"),
                });
            }
        }
    }
    Ok(())
}

fn validate_shortcuts(def: &ConfigDef) -> ConfigResult<()> {
    for (key, opt_def) in def.iter() {
        for target in &opt_def.shortcut {
            if target.as_str() == key {
                return Err(ConfigError::ValidationError {
                    field: format!("options.{key}.shortcut"),
                    message: "an option cannot be a shortcut for itself".to_owned(),
                });
            }
            if !def.contains(target) {
                return Err(ConfigError::ValidationError {
                    field: format!("options.{key}.shortcut"),
                    message: format!("shortcut target '{target}' is not defined"),
                });
            }
        }
    }

    for (key, opt_def) in def.iter() {
        if opt_def.shortcut.is_empty() {
            continue;
        }
        if let Some(chain) = shortcut_cycle(def, key, &mut Vec::new()) {
            return Err(ConfigError::ShortcutCycle { chain });
        }
    }
    Ok(())
}

/// Depth-first walk of the shortcut expansion of `key`; the first loop found.
fn shortcut_cycle<'a>(def: &'a ConfigDef, key: &'a str, path: &mut Vec<&'a str>) -> Option<String> {
    if path.contains(&key) {
        path.push(key);
        return Some(path.join(" -> "));
    }
    let opt_def = def.get(key)?;
    path.push(key);
    for target in &opt_def.shortcut {
        if let Some(chain) = shortcut_cycle(def, target, path) {
            return Some(chain);
        }
    }
    path.pop();
    None
}

fn validate_enums(def: &ConfigDef) -> ConfigResult<()> {
    for (key, opt_def) in def.iter() {
        let is_enum = matches!(opt_def.option_type, OptionType::Enum | OptionType::Enums);
        let has_values = opt_def.enum_values.as_ref().is_some_and(|v| !v.is_empty());
        if is_enum && !has_values {
            return Err(ConfigError::ValidationError {
                field: format!("options.{key}.enum_values"),
                message: "enum options need at least one value".to_owned(),
            });
        }
        if !is_enum && opt_def.enum_values.is_some() {
            return Err(ConfigError::ValidationError {
                field: format!("options.{key}.enum_values"),
                message: format!("'{}' options do not take enum values", opt_def.option_type),
            });
        }
    }
    Ok(())
}

fn validate_nullable(def: &ConfigDef) -> ConfigResult<()> {
    for (key, opt_def) in def.iter() {
        if opt_def.nullable && opt_def.option_type != OptionType::Bools {
            return Err(ConfigError::ValidationError {
                field: format!("options.{key}.nullable"),
                message: "only 'bools' options can be nullable".to_owned(),
            });
        }
    }
    Ok(())
}

fn validate_ratio_over(def: &ConfigDef) -> ConfigResult<()> {
    for (key, opt_def) in def.iter() {
        let Some(target) = opt_def.ratio_over.as_deref().filter(|t| !t.is_empty()) else {
            continue;
        };
        if !def.contains(target) {
            return Err(ConfigError::ValidationError {
                field: format!("options.{key}.ratio_over"),
                message: format!("ratio_over target '{target}' is not defined"),
            });
        }

        let mut chain = vec![key];
        let mut next = Some(target);
        while let Some(current) = next {
            if chain.contains(&current) {
                chain.push(current);
                return Err(ConfigError::RatioCycle {
                    chain: chain.join(" -> "),
                });
            }
            chain.push(current);
            next = def
                .get(current)
                .and_then(|d| d.ratio_over.as_deref())
                .filter(|t| !t.is_empty());
        }
    }
    Ok(())
}
