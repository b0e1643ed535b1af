//! `env` - print a preset as shell variables.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use slicecfg_config::{ConfigBase, ConfigDef, ForwardCompatibilitySubstitutionRule, ShellExporter};

use super::load_preset;

pub(crate) fn run(
    def: &Arc<ConfigDef>,
    path: &Path,
    rule: ForwardCompatibilitySubstitutionRule,
) -> Result<()> {
    let (config, _) = load_preset(def, path, rule)?;
    let stdout = std::io::stdout();
    let mut exporter = ShellExporter::new(stdout.lock());
    config.set_env(&mut exporter)?;
    exporter.into_inner().flush()?;
    Ok(())
}
