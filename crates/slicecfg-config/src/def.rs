//! Option definitions: the static schema a config resolves keys against.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult};
use crate::option::{
    Bools, ConfigOption, EnumOption, EnumValues, EnumsOption, FloatOrPercent, OptionType, Vec2d,
    Vec3d,
};

/// Schema entry for one option key.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigOptionDef {
    /// Variant every value of this option carries.
    pub option_type: OptionType,
    /// Value a freshly created option starts from.
    pub default_value: Option<ConfigOption>,
    /// Legacy or alternative spellings of the key.
    pub aliases: Vec<String>,
    /// Keys a write fans out to; when non-empty nothing is stored locally.
    pub shortcut: Vec<String>,
    /// Name table for `enum` and `enums` options.
    pub enum_values: Option<Arc<EnumValues>>,
    /// Whether a `bools` vector accepts `nil`.
    pub nullable: bool,
    /// Key whose absolute value percentages resolve against. `None` means
    /// the option is not relative to another key.
    pub ratio_over: Option<String>,
    /// Command-line spelling, `|`-separated; empty derives it from the key.
    pub cli: String,
}

impl ConfigOptionDef {
    /// Bare definition of the given type.
    #[must_use]
    pub fn new(option_type: OptionType) -> Self {
        Self {
            option_type,
            default_value: None,
            aliases: Vec::new(),
            shortcut: Vec::new(),
            enum_values: None,
            nullable: false,
            ratio_over: None,
            cli: String::new(),
        }
    }

    /// Set the default value.
    #[must_use]
    pub fn with_default(mut self, value: ConfigOption) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Add alias keys.
    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Turn this definition into a shortcut over `keys`.
    #[must_use]
    pub fn with_shortcut<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shortcut.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Attach the enum name table.
    #[must_use]
    pub fn with_enum_values(mut self, values: Arc<EnumValues>) -> Self {
        self.enum_values = Some(values);
        self
    }

    /// Mark a `bools` option nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Resolve percentages against `key`.
    ///
    /// An empty `key` makes the absolute value zero; it is not a synonym
    /// for "ratio over 1", which is what leaving `ratio_over` unset gives.
    #[must_use]
    pub fn with_ratio_over(mut self, key: impl Into<String>) -> Self {
        self.ratio_over = Some(key.into());
        self
    }

    /// Set the command-line spelling.
    #[must_use]
    pub fn with_cli(mut self, cli: impl Into<String>) -> Self {
        self.cli = cli.into();
        self
    }

    /// Zero value of this definition's type.
    #[must_use]
    pub fn create_empty_option(&self) -> ConfigOption {
        let names = || self.enum_values.clone().unwrap_or_default();
        match self.option_type {
            OptionType::Float => ConfigOption::Float(0.0),
            OptionType::Floats => ConfigOption::Floats(Vec::new()),
            OptionType::Int => ConfigOption::Int(0),
            OptionType::Ints => ConfigOption::Ints(Vec::new()),
            OptionType::String => ConfigOption::String(String::new()),
            OptionType::Strings => ConfigOption::Strings(Vec::new()),
            OptionType::Percent => ConfigOption::Percent(0.0),
            OptionType::Percents => ConfigOption::Percents(Vec::new()),
            OptionType::FloatOrPercent => ConfigOption::FloatOrPercent(FloatOrPercent::default()),
            OptionType::FloatsOrPercents => ConfigOption::FloatsOrPercents(Vec::new()),
            OptionType::Point => ConfigOption::Point(Vec2d::default()),
            OptionType::Points => ConfigOption::Points(Vec::new()),
            OptionType::Point3 => ConfigOption::Point3(Vec3d::default()),
            OptionType::Bool => ConfigOption::Bool(false),
            OptionType::Bools => ConfigOption::Bools(Bools {
                values: Vec::new(),
                nullable: self.nullable,
            }),
            OptionType::Enum => {
                let names = names();
                let first = names.names().next().and_then(|n| names.value_of(n));
                ConfigOption::Enum(EnumOption::new(first.unwrap_or(0), names))
            },
            OptionType::Enums => ConfigOption::Enums(EnumsOption::new(Vec::new(), names())),
        }
    }

    /// A copy of the default value, or the empty option when there is none.
    #[must_use]
    pub fn create_default_option(&self) -> ConfigOption {
        self.default_value
            .clone()
            .unwrap_or_else(|| self.create_empty_option())
    }

    /// Parse `text` as this definition's default value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `text` does not parse.
    pub fn parse_default(&self, key: &str, text: &str) -> ConfigResult<ConfigOption> {
        let mut opt = self.create_empty_option();
        if opt.deserialize(text, false) {
            Ok(opt)
        } else {
            Err(ConfigError::InvalidValue {
                key: key.to_owned(),
                value: text.to_owned(),
            })
        }
    }

    /// Command-line argument names for `key`.
    #[must_use]
    pub fn cli_args(&self, key: &str) -> Vec<String> {
        if self.cli.is_empty() {
            vec![key.replace('_', "-")]
        } else {
            self.cli.split('|').map(str::to_owned).collect()
        }
    }
}

/// Mapping from key to option definition.
#[derive(Debug, Clone, Default)]
pub struct ConfigDef {
    options: BTreeMap<String, Arc<ConfigOptionDef>>,
}

impl ConfigDef {
    /// Empty definition set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `def` under `key`, replacing any previous entry.
    pub fn add(&mut self, key: impl Into<String>, def: ConfigOptionDef) -> &mut Self {
        self.options.insert(key.into(), Arc::new(def));
        self
    }

    /// Exact-key lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Arc<ConfigOptionDef>> {
        self.options.get(key)
    }

    /// Exact-key lookup, falling back to a scan of every alias list.
    ///
    /// Returns the canonical key together with its definition.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<(&str, &Arc<ConfigOptionDef>)> {
        if let Some((k, def)) = self.options.get_key_value(key) {
            return Some((k.as_str(), def));
        }
        self.options
            .iter()
            .find(|(_, def)| def.aliases.iter().any(|a| a == key))
            .map(|(k, def)| (k.as_str(), def))
    }

    /// Whether `key` is defined (aliases not considered).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    /// Defined keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    /// Every `(key, definition)` pair in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<ConfigOptionDef>)> {
        self.options.iter().map(|(k, d)| (k.as_str(), d))
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Whether no option is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
