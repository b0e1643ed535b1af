//! Forward-compatibility substitution bookkeeping for a single load.

use std::fmt;
use std::sync::Arc;

use crate::def::ConfigOptionDef;
use crate::option::ConfigOption;

/// How values that no longer parse are treated during a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForwardCompatibilitySubstitutionRule {
    /// Never substitute; unparseable values are hard failures.
    #[default]
    Disable,
    /// Substitute and record every substitution.
    Enable,
    /// Substitute without recording.
    EnableSilent,
    /// Substitute and record; callers silence the report for system presets.
    EnableSystemSilent,
}

impl ForwardCompatibilitySubstitutionRule {
    /// Whether recovery is attempted at all.
    #[must_use]
    pub const fn substitutes(self) -> bool {
        !matches!(self, Self::Disable)
    }

    /// Whether substitutions are appended to the audit trail.
    #[must_use]
    pub const fn records(self) -> bool {
        matches!(self, Self::Enable | Self::EnableSystemSilent)
    }
}

/// One recovered value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSubstitution {
    /// Canonical key the value was stored under.
    pub key: String,
    /// Definition of that key.
    pub opt_def: Arc<ConfigOptionDef>,
    /// Raw text as it appeared in the source.
    pub old_value: String,
    /// Snapshot of the option after substitution.
    pub new_value: ConfigOption,
}

impl fmt::Display for ConfigSubstitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: \"{}\" -> \"{}\"",
            self.key,
            self.old_value,
            self.new_value.serialize()
        )
    }
}

/// Audit trail of a load.
pub type ConfigSubstitutions = Vec<ConfigSubstitution>;

/// State accumulated while loading one document or key/value map.
#[derive(Debug, Clone, Default)]
pub struct ConfigSubstitutionContext {
    /// Active rule.
    pub rule: ForwardCompatibilitySubstitutionRule,
    /// Substitutions in the order they happened.
    pub substitutions: ConfigSubstitutions,
    /// Keys the legacy hook reported as removed, without duplicates.
    pub unrecognized_keys: Vec<String>,
}

impl ConfigSubstitutionContext {
    /// Fresh context for `rule`.
    #[must_use]
    pub fn new(rule: ForwardCompatibilitySubstitutionRule) -> Self {
        Self {
            rule,
            substitutions: Vec::new(),
            unrecognized_keys: Vec::new(),
        }
    }

    /// Remember a removed key once.
    pub fn add_unrecognized_key(&mut self, key: &str) {
        if !self.unrecognized_keys.iter().any(|k| k == key) {
            self.unrecognized_keys.push(key.to_owned());
        }
    }

    /// Whether nothing was substituted or dropped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.substitutions.is_empty() && self.unrecognized_keys.is_empty()
    }
}
