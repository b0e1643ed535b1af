//! Deserialization with substitutions, and ratio resolution.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{ConfigBase, LINE_WIDTH_KEY, LINE_WIDTH_SUFFIX};
use crate::def::ConfigOptionDef;
use crate::error::{ConfigError, ConfigResult};
use crate::legacy::LegacyKey;
use crate::option::{
    ConfigOption, DeserializationResult, DeserializationSubstitution, OptionType, looks_like_true,
};
use crate::substitution::{
    ConfigSubstitution, ConfigSubstitutionContext, ForwardCompatibilitySubstitutionRule,
};

/// Legacy translation followed by [`set_deserialize_raw`].
pub(super) fn set_deserialize<C: ConfigBase + ?Sized>(
    config: &mut C,
    key: &str,
    value: &str,
    ctx: &mut ConfigSubstitutionContext,
    append: bool,
) -> ConfigResult<bool> {
    match config.handle_legacy(key, value) {
        LegacyKey::Current => set_deserialize_raw(config, key, value, ctx, append),
        LegacyKey::Translated {
            key: new_key,
            value: new_value,
        } => {
            debug!(old_key = key, new_key = %new_key, "Translated legacy option");
            set_deserialize_raw(config, &new_key, &new_value, ctx, append)
        },
        LegacyKey::Removed => {
            debug!(key, "Dropping removed option");
            ctx.add_unrecognized_key(key);
            Ok(true)
        },
    }
}

/// Resolve, fan out, deserialize and record.
pub(super) fn set_deserialize_raw<C: ConfigBase + ?Sized>(
    config: &mut C,
    key: &str,
    value: &str,
    ctx: &mut ConfigSubstitutionContext,
    append: bool,
) -> ConfigResult<bool> {
    set_deserialize_expanding(config, key, value, ctx, append, &mut Vec::new())
}

/// `expanding` holds the shortcut keys whose fan-out is in progress.
fn set_deserialize_expanding<C: ConfigBase + ?Sized>(
    config: &mut C,
    key: &str,
    value: &str,
    ctx: &mut ConfigSubstitutionContext,
    append: bool,
    expanding: &mut Vec<String>,
) -> ConfigResult<bool> {
    let def = config.def().ok_or_else(|| ConfigError::MissingDefinition {
        key: key.to_owned(),
    })?;
    let (canonical, opt_def) = def
        .resolve(key)
        .map(|(k, d)| (k.to_owned(), Arc::clone(d)))
        .ok_or_else(|| ConfigError::UnknownOption {
            key: key.to_owned(),
        })?;

    if !opt_def.shortcut.is_empty() {
        if expanding.contains(&canonical) {
            expanding.push(canonical);
            return Err(ConfigError::ShortcutCycle {
                chain: expanding.join(" -> "),
            });
        }
        expanding.push(canonical);
        for target in &opt_def.shortcut {
            if !set_deserialize_expanding(config, target, value, ctx, append, expanding)? {
                return Ok(false);
            }
        }
        expanding.pop();
        return Ok(true);
    }

    let rule = ctx.rule;
    let opt = config
        .option_mut(&canonical, true)?
        .ok_or_else(|| ConfigError::UnknownOption {
            key: canonical.clone(),
        })?;

    match deserialize_option(opt, &opt_def, value, append, rule)? {
        DeserializationResult::Success => Ok(true),
        DeserializationResult::Failed => Ok(false),
        DeserializationResult::Substituted => {
            if rule == ForwardCompatibilitySubstitutionRule::Enable {
                warn!(key = %canonical, old_value = value, new_value = %opt, "Substituted invalid value");
            } else {
                debug!(key = %canonical, old_value = value, new_value = %opt, "Substituted invalid value");
            }
            if rule.records() {
                ctx.substitutions.push(ConfigSubstitution {
                    key: canonical,
                    opt_def,
                    old_value: value.to_owned(),
                    new_value: opt.clone(),
                });
            }
            Ok(true)
        },
    }
}

fn deserialize_option(
    opt: &mut ConfigOption,
    opt_def: &ConfigOptionDef,
    value: &str,
    append: bool,
    rule: ForwardCompatibilitySubstitutionRule,
) -> ConfigResult<DeserializationResult> {
    if rule.substitutes() {
        let bools_default = match opt {
            ConfigOption::Bools(b) if b.first_is_true() => {
                Some(DeserializationSubstitution::DefaultsToTrue)
            },
            ConfigOption::Bools(_) => Some(DeserializationSubstitution::DefaultsToFalse),
            _ => None,
        };
        if let Some(default) = bools_default {
            return Ok(opt.deserialize_with_substitutions(value, append, default));
        }
    }

    if opt.deserialize(value, append) {
        return Ok(DeserializationResult::Success);
    }
    if !rule.substitutes() {
        return Ok(DeserializationResult::Failed);
    }

    match opt.option_type() {
        OptionType::Bool => {
            opt.set(&ConfigOption::Bool(looks_like_true(value)))?;
            Ok(DeserializationResult::Substituted)
        },
        OptionType::Enum | OptionType::Enums => match &opt_def.default_value {
            Some(default) => {
                opt.set(default)?;
                Ok(DeserializationResult::Substituted)
            },
            None => Ok(DeserializationResult::Failed),
        },
        _ => Ok(DeserializationResult::Failed),
    }
}

/// Absolute value of `key`; `chain` holds the keys currently being
/// resolved.
#[allow(clippy::float_cmp)]
pub(super) fn resolve_abs_value<C: ConfigBase + ?Sized>(
    config: &C,
    key: &str,
    chain: &mut Vec<String>,
) -> ConfigResult<f64> {
    if chain.iter().any(|k| k == key) {
        chain.push(key.to_owned());
        return Err(ConfigError::RatioCycle {
            chain: chain.join(" -> "),
        });
    }
    let opt = config.option(key).ok_or_else(|| ConfigError::OptionNotSet {
        key: key.to_owned(),
    })?;

    let relative = match opt {
        ConfigOption::Float(v) => return Ok(*v),
        ConfigOption::Int(v) => return Ok(f64::from(*v)),
        ConfigOption::Bool(b) => return Ok(if *b { 1.0 } else { 0.0 }),
        ConfigOption::FloatOrPercent(v) if v.value == 0.0 && key.ends_with(LINE_WIDTH_SUFFIX) => {
            chain.push(key.to_owned());
            return resolve_abs_value(config, LINE_WIDTH_KEY, chain);
        },
        ConfigOption::FloatOrPercent(v) if !v.percent => return Ok(v.value),
        ConfigOption::Percent(_) | ConfigOption::FloatOrPercent(_) => opt,
        other => {
            return Err(ConfigError::NotNumeric {
                key: key.to_owned(),
                option_type: other.option_type(),
            });
        },
    };

    let def = config.def().ok_or_else(|| ConfigError::MissingDefinition {
        key: key.to_owned(),
    })?;
    let opt_def = def.get(key).ok_or_else(|| ConfigError::UnknownOption {
        key: key.to_owned(),
    })?;
    let base = match opt_def.ratio_over.as_deref() {
        None => 1.0,
        // Empty reference: no base to scale against.
        Some("") => return Ok(0.0),
        Some(ratio_key) => {
            chain.push(key.to_owned());
            resolve_abs_value(config, ratio_key, chain)?
        },
    };
    relative
        .get_abs_value(base)
        .ok_or_else(|| ConfigError::NotNumeric {
            key: key.to_owned(),
            option_type: relative.option_type(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use crate::config::{ConfigBase, DynamicConfig};
    use crate::def::{ConfigDef, ConfigOptionDef};
    use crate::error::ConfigError;
    use crate::legacy::LegacyTable;
    use crate::option::{Bools, ConfigOption, EnumOption, EnumValues, FloatOrPercent, OptionType};
    use crate::substitution::{ConfigSubstitutionContext, ForwardCompatibilitySubstitutionRule};

    fn test_def() -> Arc<ConfigDef> {
        let modes = Arc::new(EnumValues::from_names(["normal", "tree"]));
        let mut def = ConfigDef::new();
        def.add("enabled", ConfigOptionDef::new(OptionType::Bool))
            .add(
                "mode",
                ConfigOptionDef::new(OptionType::Enum)
                    .with_enum_values(Arc::clone(&modes))
                    .with_default(ConfigOption::Enum(EnumOption::new(1, Arc::clone(&modes)))),
            )
            .add(
                "bare_mode",
                ConfigOptionDef::new(OptionType::Enum).with_enum_values(modes),
            )
            .add(
                "flags",
                ConfigOptionDef::new(OptionType::Bools)
                    .nullable()
                    .with_default(ConfigOption::Bools(Bools::nullable(vec![Some(true)]))),
            )
            .add("height", ConfigOptionDef::new(OptionType::Float))
            .add(
                "density",
                ConfigOptionDef::new(OptionType::Percent).with_aliases(["fill_density"]),
            )
            .add("top", ConfigOptionDef::new(OptionType::Int))
            .add("bottom", ConfigOptionDef::new(OptionType::Int))
            .add(
                "both",
                ConfigOptionDef::new(OptionType::Int).with_shortcut(["top", "bottom"]),
            )
            .add("base", ConfigOptionDef::new(OptionType::Float))
            .add(
                "rel",
                ConfigOptionDef::new(OptionType::Percent).with_ratio_over("base"),
            )
            .add("unit", ConfigOptionDef::new(OptionType::Percent))
            .add(
                "none",
                ConfigOptionDef::new(OptionType::Percent).with_ratio_over(""),
            )
            .add(
                "line_width",
                ConfigOptionDef::new(OptionType::FloatOrPercent).with_ratio_over("base"),
            )
            .add(
                "outer_line_width",
                ConfigOptionDef::new(OptionType::FloatOrPercent).with_ratio_over("base"),
            )
            .add(
                "loop_a",
                ConfigOptionDef::new(OptionType::Percent).with_ratio_over("loop_b"),
            )
            .add(
                "loop_b",
                ConfigOptionDef::new(OptionType::Percent).with_ratio_over("loop_a"),
            );
        Arc::new(def)
    }

    fn ctx(rule: ForwardCompatibilitySubstitutionRule) -> ConfigSubstitutionContext {
        ConfigSubstitutionContext::new(rule)
    }

    #[test]
    fn test_bool_substitution_enable() {
        let mut config = DynamicConfig::with_def(test_def());
        let mut ctx = ctx(ForwardCompatibilitySubstitutionRule::Enable);

        config.set_deserialize("enabled", "maybe", &mut ctx, false).unwrap();
        assert_eq!(config.option("enabled"), Some(&ConfigOption::Bool(false)));
        assert_eq!(ctx.substitutions.len(), 1);
        assert_eq!(ctx.substitutions[0].key, "enabled");
        assert_eq!(ctx.substitutions[0].old_value, "maybe");

        // "yes" parses, so no substitution is recorded.
        config.set_deserialize("enabled", "yes", &mut ctx, false).unwrap();
        assert_eq!(config.option("enabled"), Some(&ConfigOption::Bool(true)));
        assert_eq!(ctx.substitutions.len(), 1);
    }

    #[test]
    fn test_bool_heuristic_on_unparseable_text() {
        let mut config = DynamicConfig::with_def(test_def());
        let mut ctx = ctx(ForwardCompatibilitySubstitutionRule::EnableSilent);

        config.set_deserialize("enabled", "YES!", &mut ctx, false).unwrap();
        assert_eq!(config.option("enabled"), Some(&ConfigOption::Bool(false)));
        assert!(ctx.substitutions.is_empty());
    }

    #[test]
    fn test_bool_substitution_disable_fails() {
        let mut config = DynamicConfig::with_def(test_def());
        let mut ctx = ctx(ForwardCompatibilitySubstitutionRule::Disable);

        let err = config
            .set_deserialize("enabled", "maybe", &mut ctx, false)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(
            !config
                .set_deserialize_nothrow("enabled", "maybe", &mut ctx, false)
                .unwrap()
        );
        assert!(ctx.substitutions.is_empty());
    }

    #[test]
    fn test_enum_substitution_uses_default() {
        let mut config = DynamicConfig::with_def(test_def());
        let mut ctx = ctx(ForwardCompatibilitySubstitutionRule::EnableSystemSilent);

        config.set_deserialize("mode", "organic", &mut ctx, false).unwrap();
        assert_eq!(config.opt_serialize("mode").unwrap(), "tree");
        assert_eq!(ctx.substitutions.len(), 1);
    }

    #[test]
    fn test_enum_without_default_fails() {
        let mut config = DynamicConfig::with_def(test_def());
        let mut ctx = ctx(ForwardCompatibilitySubstitutionRule::Enable);

        config.set_deserialize("bare_mode", "tree", &mut ctx, false).unwrap();
        assert!(
            !config
                .set_deserialize_nothrow("bare_mode", "organic", &mut ctx, false)
                .unwrap()
        );
        assert_eq!(config.opt_serialize("bare_mode").unwrap(), "tree");
        assert!(ctx.substitutions.is_empty());
    }

    #[test]
    fn test_nullable_bools_nil_defaults_from_first_element() {
        let mut config = DynamicConfig::with_def(test_def());
        let mut ctx = ctx(ForwardCompatibilitySubstitutionRule::Enable);

        // Default is [true], so nil is substituted with true.
        config.set_deserialize("flags", "nil,0", &mut ctx, false).unwrap();
        assert_eq!(config.opt_serialize("flags").unwrap(), "true,false");
        assert_eq!(ctx.substitutions.len(), 1);

        // Now the first element is true again; start from false instead.
        config.set_deserialize("flags", "0", &mut ctx, false).unwrap();
        config.set_deserialize("flags", "nil", &mut ctx, false).unwrap();
        assert_eq!(config.opt_serialize("flags").unwrap(), "false");
    }

    #[test]
    fn test_nullable_bools_keep_nil_without_substitution() {
        let mut config = DynamicConfig::with_def(test_def());
        let mut ctx = ctx(ForwardCompatibilitySubstitutionRule::Disable);

        config.set_deserialize("flags", "nil,1", &mut ctx, false).unwrap();
        assert_eq!(config.opt_serialize("flags").unwrap(), "nil,true");
    }

    #[test]
    fn test_alias_stores_under_canonical_key() {
        let mut config = DynamicConfig::with_def(test_def());
        let mut ctx = ctx(ForwardCompatibilitySubstitutionRule::Disable);

        config.set_deserialize("fill_density", "20%", &mut ctx, false).unwrap();
        assert_eq!(config.option("density"), Some(&ConfigOption::Percent(0.2)));
        assert!(config.option("fill_density").is_none());
    }

    #[test]
    fn test_shortcut_fans_out() {
        let mut config = DynamicConfig::with_def(test_def());
        let mut ctx = ctx(ForwardCompatibilitySubstitutionRule::Disable);

        config.set_deserialize("both", "4", &mut ctx, false).unwrap();
        assert_eq!(config.option("top"), Some(&ConfigOption::Int(4)));
        assert_eq!(config.option("bottom"), Some(&ConfigOption::Int(4)));
        assert!(config.option("both").is_none());

        assert!(
            !config
                .set_deserialize_nothrow("both", "four", &mut ctx, false)
                .unwrap()
        );
    }

    #[test]
    fn test_shortcut_cycle_fails_cleanly() {
        let mut def = ConfigDef::new();
        def.add("a", ConfigOptionDef::new(OptionType::Int).with_shortcut(["b"]))
            .add("b", ConfigOptionDef::new(OptionType::Int).with_shortcut(["a"]));
        let mut config = DynamicConfig::with_def(Arc::new(def));
        let mut ctx = ctx(ForwardCompatibilitySubstitutionRule::Enable);

        match config.set_deserialize("a", "1", &mut ctx, false).unwrap_err() {
            ConfigError::ShortcutCycle { chain } => assert_eq!(chain, "a -> b -> a"),
            other => panic!("expected shortcut cycle, got {other}"),
        }
        assert!(!config.set_deserialize_nothrow("b", "1", &mut ctx, false).unwrap());
        assert!(config.is_empty());
    }

    #[test]
    fn test_shortcut_targets_may_repeat() {
        let mut def = ConfigDef::new();
        def.add("all", ConfigOptionDef::new(OptionType::Int).with_shortcut(["top", "both"]))
            .add("both", ConfigOptionDef::new(OptionType::Int).with_shortcut(["top", "bottom"]))
            .add("top", ConfigOptionDef::new(OptionType::Int))
            .add("bottom", ConfigOptionDef::new(OptionType::Int));
        let mut config = DynamicConfig::with_def(Arc::new(def));
        let mut ctx = ctx(ForwardCompatibilitySubstitutionRule::Disable);

        config.set_deserialize("all", "2", &mut ctx, false).unwrap();
        assert_eq!(config.option("top"), Some(&ConfigOption::Int(2)));
        assert_eq!(config.option("bottom"), Some(&ConfigOption::Int(2)));
    }

    #[test]
    fn test_unknown_option() {
        let mut config = DynamicConfig::with_def(test_def());
        let mut ctx = ctx(ForwardCompatibilitySubstitutionRule::Enable);

        let err = config
            .set_deserialize("no_such_key", "1", &mut ctx, false)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOption { .. }));
        assert!(
            !config
                .set_deserialize_nothrow("no_such_key", "1", &mut ctx, false)
                .unwrap()
        );
    }

    #[test]
    fn test_legacy_removed_key_recorded_once() {
        let legacy = LegacyTable::new().remove("old_key").rename("old_height", "height");
        let mut config = DynamicConfig::with_def(test_def()).with_legacy_handler(Arc::new(legacy));

        let map: BTreeMap<String, String> = [
            ("old_key", "1"),
            ("old_height", "0.3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        let ctx = config
            .load_string_map(&map, ForwardCompatibilitySubstitutionRule::Disable)
            .unwrap();

        assert_eq!(ctx.unrecognized_keys, vec!["old_key".to_owned()]);
        assert!(config.option("old_key").is_none());
        assert_eq!(config.option("height"), Some(&ConfigOption::Float(0.3)));
    }

    #[test]
    fn test_abs_value_ratio_chain() {
        let mut config = DynamicConfig::with_def(test_def());
        config.set_key_value("base", ConfigOption::Float(200.0));
        config.set_key_value("rel", ConfigOption::Percent(0.5));
        config.set_key_value("unit", ConfigOption::Percent(0.25));
        config.set_key_value("none", ConfigOption::Percent(0.25));

        assert!((config.get_abs_value("rel").unwrap() - 100.0).abs() < 1e-9);
        assert!((config.get_abs_value("unit").unwrap() - 0.25).abs() < 1e-9);
        assert!(config.get_abs_value("none").unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn test_abs_value_scalars() {
        let mut config = DynamicConfig::with_def(test_def());
        config.set_key_value("height", ConfigOption::Float(0.2));
        config.set_key_value("top", ConfigOption::Int(3));
        config.set_key_value("enabled", ConfigOption::Bool(true));

        assert!((config.get_abs_value("height").unwrap() - 0.2).abs() < f64::EPSILON);
        assert!((config.get_abs_value("top").unwrap() - 3.0).abs() < f64::EPSILON);
        assert!((config.get_abs_value("enabled").unwrap() - 1.0).abs() < f64::EPSILON);
        assert!(matches!(
            config.get_abs_value("missing"),
            Err(ConfigError::OptionNotSet { .. })
        ));
    }

    #[test]
    fn test_zero_line_width_redirects() {
        let mut config = DynamicConfig::with_def(test_def());
        config.set_key_value("base", ConfigOption::Float(0.4));
        config.set_key_value(
            "line_width",
            ConfigOption::FloatOrPercent(FloatOrPercent::percent(1.1)),
        );
        config.set_key_value(
            "outer_line_width",
            ConfigOption::FloatOrPercent(FloatOrPercent::absolute(0.0)),
        );

        let abs = config.get_abs_value("outer_line_width").unwrap();
        assert!((abs - 0.44).abs() < 1e-9);

        config.set_key_value(
            "outer_line_width",
            ConfigOption::FloatOrPercent(FloatOrPercent::absolute(0.5)),
        );
        assert!((config.get_abs_value("outer_line_width").unwrap() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ratio_cycle_detected() {
        let mut config = DynamicConfig::with_def(test_def());
        config.set_key_value("loop_a", ConfigOption::Percent(0.5));
        config.set_key_value("loop_b", ConfigOption::Percent(0.5));

        let err = config.get_abs_value("loop_a").unwrap_err();
        match err {
            ConfigError::RatioCycle { chain } => assert_eq!(chain, "loop_a -> loop_b -> loop_a"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_abs_value_ratio_requires_float_or_percent() {
        let mut config = DynamicConfig::with_def(test_def());
        config.set_key_value(
            "line_width",
            ConfigOption::FloatOrPercent(FloatOrPercent::percent(0.5)),
        );
        config.set_key_value("rel", ConfigOption::Percent(0.5));

        assert!((config.get_abs_value_ratio("line_width", 0.8).unwrap() - 0.4).abs() < 1e-9);
        assert!(matches!(
            config.get_abs_value_ratio("rel", 0.8),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }
}
