//! End-to-end preset loading against the sample schema.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use slicecfg_config::config::LINE_WIDTH_KEY;
use slicecfg_config::{
    ConfigBase, ConfigDef, ConfigError, ConfigOption, DynamicConfig, ForwardCompatibilitySubstitutionRule,
    LegacyHandler, LegacyKey, LegacyTable, ShellExporter, StaticConfig,
};

fn sample_def() -> Arc<ConfigDef> {
    Arc::new(ConfigDef::sample().unwrap())
}

fn write_preset(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_loads_process_preset_with_legacy_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_preset(
        dir.path(),
        "process.json",
        r##"{
            "type": "process",
            "name": "0.20mm Standard @MyPrinter",
            "inherits": "fdm_process_common",
            "from": "system",
            "layer_height": "0.28",
            "fill_density": "25%",
            "perimeters": "3",
            "shell_layers": "5",
            "spiral_mode": "0",
            "filament_colour": ["#FFFFFF", "#000000"]
        }"##,
    );

    let legacy = LegacyTable::new().remove("spiral_mode");
    let mut config = StaticConfig::with_defaults(sample_def()).with_legacy_handler(Arc::new(legacy));
    let preset = config
        .load_from_json(&path, ForwardCompatibilitySubstitutionRule::Enable, false)
        .unwrap();

    assert_eq!(preset.metadata("type"), Some("process"));
    assert_eq!(preset.metadata("inherits"), Some("fdm_process_common"));
    assert_eq!(preset.substitutions.unrecognized_keys, vec!["spiral_mode".to_owned()]);
    assert!(preset.substitutions.substitutions.is_empty());

    assert_eq!(config.option("layer_height"), Some(&ConfigOption::Float(0.28)));
    assert_eq!(config.opt_serialize("sparse_infill_density").unwrap(), "25%");
    assert_eq!(config.option("wall_loops"), Some(&ConfigOption::Int(3)));
    assert_eq!(config.option("top_shell_layers"), Some(&ConfigOption::Int(5)));
    assert_eq!(config.option("bottom_shell_layers"), Some(&ConfigOption::Int(5)));
    assert!(config.option("shell_layers").is_none());
    assert_eq!(
        config.option("filament_colour"),
        Some(&ConfigOption::Strings(vec!["#FFFFFF".to_owned(), "#000000".to_owned()]))
    );
}

#[test]
fn test_load_dispatches_on_extension() {
    let dir = tempfile::tempdir().unwrap();
    let json = write_preset(dir.path(), "machine.JSON", r#"{"nozzle_diameter": "0.6"}"#);
    let gcode = write_preset(dir.path(), "part.gcode", "; generated\n");
    let ini = write_preset(dir.path(), "config.ini", "layer_height = 0.2\n");

    let mut config = DynamicConfig::with_def(sample_def());
    let ctx = config
        .load(&json, ForwardCompatibilitySubstitutionRule::Disable)
        .unwrap();
    assert!(ctx.is_clean());
    assert_eq!(config.option("nozzle_diameter"), Some(&ConfigOption::Float(0.6)));

    for path in [gcode, ini] {
        let err = config
            .load(&path, ForwardCompatibilitySubstitutionRule::Disable)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFileFormat { .. }));
    }
}

#[test]
fn test_missing_and_malformed_files_report_a_reason() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = DynamicConfig::with_def(sample_def());

    let err = config
        .load(
            &dir.path().join("absent.json"),
            ForwardCompatibilitySubstitutionRule::Enable,
        )
        .unwrap_err();
    assert!(matches!(err, ConfigError::ReadError { .. }));
    assert!(err.to_string().contains("absent.json"));

    let broken = write_preset(dir.path(), "broken.json", "{ invalid json");
    let err = config
        .load(&broken, ForwardCompatibilitySubstitutionRule::Enable)
        .unwrap_err();
    assert!(err.to_string().contains("JsonParseError"));
    assert!(config.is_empty());
}

#[test]
fn test_bool_substitution_depends_on_rule() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_preset(dir.path(), "p.json", r#"{"enable_support": "maybe"}"#);

    let mut config = DynamicConfig::with_def(sample_def());
    let ctx = config
        .load(&path, ForwardCompatibilitySubstitutionRule::Enable)
        .unwrap();
    assert_eq!(ctx.substitutions.len(), 1);
    assert_eq!(ctx.substitutions[0].old_value, "maybe");
    assert_eq!(ctx.substitutions[0].new_value, ConfigOption::Bool(false));
    assert_eq!(ctx.substitutions[0].to_string(), "enable_support: \"maybe\" -> \"false\"");

    let mut config = DynamicConfig::with_def(sample_def());
    let ctx = config
        .load(&path, ForwardCompatibilitySubstitutionRule::EnableSilent)
        .unwrap();
    assert!(ctx.substitutions.is_empty());
    assert_eq!(config.option("enable_support"), Some(&ConfigOption::Bool(false)));

    let mut config = DynamicConfig::with_def(sample_def());
    let err = config
        .load(&path, ForwardCompatibilitySubstitutionRule::Disable)
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn test_ratio_chain_resolves_through_schema() {
    let mut config = StaticConfig::with_defaults(sample_def());

    // 50% of outer_wall_speed (200).
    let speed = config.get_abs_value("small_perimeter_speed").unwrap();
    assert!((speed - 100.0).abs() < 1e-9);

    // Zero inner wall width falls back to line_width.
    let inner = config.get_abs_value("inner_wall_line_width").unwrap();
    let line = config.get_abs_value(LINE_WIDTH_KEY).unwrap();
    assert!((inner - line).abs() < f64::EPSILON);
    assert!((line - 0.42).abs() < 1e-9);

    // A percentage line width resolves against the nozzle.
    let mut ctx = slicecfg_config::ConfigSubstitutionContext::new(
        ForwardCompatibilitySubstitutionRule::Disable,
    );
    config.set_deserialize("line_width", "150%", &mut ctx, false).unwrap();
    config.set_deserialize("nozzle_diameter", "0.6", &mut ctx, false).unwrap();
    let inner = config.get_abs_value("inner_wall_line_width").unwrap();
    assert!((inner - 0.9).abs() < 1e-9);

    // seam_gap is 10% of the nozzle.
    assert!((config.get_abs_value("seam_gap").unwrap() - 0.06).abs() < 1e-9);
    assert!((config.get_abs_value_ratio("seam_gap", 2.0).unwrap() - 0.2).abs() < 1e-9);
}

#[test]
fn test_project_settings_record_rewritten_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_preset(
        dir.path(),
        "project_settings.json",
        r#"{
            "version": "1.0.0",
            "name": "project_settings",
            "support_type": "hybrid(auto)",
            "wall_infill_order": "infill/outer wall/inner wall"
        }"#,
    );

    let mut config = StaticConfig::with_defaults(sample_def());
    let ctx = config
        .load(&path, ForwardCompatibilitySubstitutionRule::Enable)
        .unwrap();

    assert_eq!(config.opt_serialize("support_style").unwrap(), "tree_hybrid");
    assert_eq!(config.option("is_infill_first"), Some(&ConfigOption::Bool(true)));
    assert_eq!(config.opt_serialize("support_type").unwrap(), "normal(auto)");
    assert_eq!(ctx.substitutions.len(), 1);
    assert_eq!(ctx.substitutions[0].key, "support_type");

    match config.option("different_settings_to_system") {
        Some(ConfigOption::Strings(entries)) => {
            assert_eq!(
                entries[0],
                "support_type;support_style;wall_infill_order;is_infill_first"
            );
        },
        other => panic!("unexpected difference list: {other:?}"),
    }
}

/// Folds a removed two-key setting into its replacement once the whole
/// document is known.
struct WallOrderFixup;

impl LegacyHandler for WallOrderFixup {
    fn handle_legacy(&self, key: &str, value: &str) -> LegacyKey {
        if key == "infill_first" {
            LegacyKey::Translated {
                key: "is_infill_first".to_owned(),
                value: value.to_owned(),
            }
        } else {
            LegacyKey::Current
        }
    }

    fn handle_legacy_composite(&self, config: &mut dyn ConfigBase) {
        let infill_first = config
            .option("is_infill_first")
            .and_then(ConfigOption::get_bool)
            .unwrap_or(false);
        if infill_first {
            if let Ok(Some(opt)) = config.option_mut("wall_infill_order", true) {
                let _ = opt.deserialize("infill/inner wall/outer wall", false);
            }
        }
    }
}

#[test]
fn test_composite_legacy_hook_runs_after_load() {
    let mut config = DynamicConfig::with_def(sample_def()).with_legacy_handler(Arc::new(WallOrderFixup));
    let map: BTreeMap<String, String> = [("infill_first".to_owned(), "1".to_owned())].into();
    config
        .load_string_map(&map, ForwardCompatibilitySubstitutionRule::Disable)
        .unwrap();
    // String maps do not run the composite hook.
    assert!(config.option("wall_infill_order").is_none());

    let preset = slicecfg_config::json::load_from_json_str(
        &mut config,
        r#"{"infill_first": "1"}"#,
        ForwardCompatibilitySubstitutionRule::Disable,
        true,
    )
    .unwrap();
    assert!(preset.substitutions.is_clean());
    assert_eq!(
        config.opt_serialize("wall_infill_order").unwrap(),
        "infill/inner wall/outer wall"
    );
}

#[test]
fn test_nullable_bools_load_nil() {
    let mut config = StaticConfig::with_defaults(sample_def());
    assert_eq!(
        config.opt_serialize("filament_retract_when_changing_layer").unwrap(),
        "nil"
    );

    let preset = slicecfg_config::json::load_from_json_str(
        &mut config,
        r#"{"filament_retract_when_changing_layer": ["nil", "1"]}"#,
        ForwardCompatibilitySubstitutionRule::Disable,
        true,
    )
    .unwrap();
    assert!(preset.substitutions.is_clean());
    assert_eq!(
        config.opt_serialize("filament_retract_when_changing_layer").unwrap(),
        "nil,true"
    );
}

#[test]
fn test_exports_environment() {
    let mut config = DynamicConfig::with_def(sample_def());
    let mut ctx = slicecfg_config::ConfigSubstitutionContext::new(
        ForwardCompatibilitySubstitutionRule::Disable,
    );
    config.set_deserialize("print_host", "it's.local", &mut ctx, false).unwrap();
    config.set_deserialize("layer_height", "0.1", &mut ctx, false).unwrap();

    let mut exporter = ShellExporter::new(Vec::new());
    config.set_env(&mut exporter).unwrap();
    let script = String::from_utf8(exporter.into_inner()).unwrap();
    assert_eq!(
        script,
        "export SLIC3R_LAYER_HEIGHT='0.1'\nexport SLIC3R_PRINT_HOST='it'\\''s.local'\n"
    );
}

#[test]
fn test_cli_argument_names() {
    let def = sample_def();
    assert_eq!(def.get("print_host").unwrap().cli_args("print_host"), vec!["print-host", "host"]);
    assert_eq!(def.get("layer_height").unwrap().cli_args("layer_height"), vec!["layer-height"]);
}
