//! Option values: the closed set of typed payloads a config can store.
//!
//! [`ConfigOption`] is a sum type over every variant. Each operation is a
//! single `match` so adding a variant is checked exhaustively by the
//! compiler, and `set` compares tags before copying anything.

mod text;
mod values;

use std::fmt;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

pub use text::{escape_string_cstyle, looks_like_true, unescape_string_cstyle};
pub(crate) use text::{join_items, split_items};
pub use values::{Bools, EnumOption, EnumValues, EnumsOption, FloatOrPercent, Vec2d, Vec3d};

use text::{format_float, format_percent, parse_bool, parse_float, parse_int, parse_percent};

/// Variant tag of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    /// Single float.
    Float,
    /// Float vector.
    Floats,
    /// Single 32-bit integer.
    Int,
    /// Integer vector.
    Ints,
    /// Free text.
    String,
    /// Text vector.
    Strings,
    /// Fraction rendered as a percentage.
    Percent,
    /// Percentage vector.
    Percents,
    /// Absolute number or percentage.
    FloatOrPercent,
    /// Vector of absolute numbers or percentages.
    FloatsOrPercents,
    /// Planar point.
    Point,
    /// Planar point vector.
    Points,
    /// Spatial point.
    Point3,
    /// Boolean.
    Bool,
    /// Boolean vector, optionally nullable.
    Bools,
    /// Named enum value.
    Enum,
    /// Vector of named enum values.
    Enums,
}

impl OptionType {
    /// Whether values of this type hold a sequence.
    #[must_use]
    pub const fn is_vector(self) -> bool {
        matches!(
            self,
            Self::Floats
                | Self::Ints
                | Self::Strings
                | Self::Percents
                | Self::FloatsOrPercents
                | Self::Points
                | Self::Bools
                | Self::Enums
        )
    }

    /// Canonical lowercase name, as used in schema files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Floats => "floats",
            Self::Int => "int",
            Self::Ints => "ints",
            Self::String => "string",
            Self::Strings => "strings",
            Self::Percent => "percent",
            Self::Percents => "percents",
            Self::FloatOrPercent => "float_or_percent",
            Self::FloatsOrPercents => "floats_or_percents",
            Self::Point => "point",
            Self::Points => "points",
            Self::Point3 => "point3",
            Self::Bool => "bool",
            Self::Bools => "bools",
            Self::Enum => "enum",
            Self::Enums => "enums",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a substitution-aware deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeserializationResult {
    /// The text was rejected and nothing changed.
    Failed,
    /// The text parsed as-is.
    Success,
    /// Part or all of the text was replaced by a fallback value.
    Substituted,
}

/// Fallback used for boolean items that no longer parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeserializationSubstitution {
    /// Unparseable items become `false`.
    DefaultsToFalse,
    /// Unparseable items become `true`.
    DefaultsToTrue,
}

impl DeserializationSubstitution {
    const fn as_bool(self) -> bool {
        matches!(self, Self::DefaultsToTrue)
    }
}

/// A typed option value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOption {
    /// Single float.
    Float(f64),
    /// Float vector.
    Floats(Vec<f64>),
    /// Single integer.
    Int(i32),
    /// Integer vector.
    Ints(Vec<i32>),
    /// Free text.
    String(String),
    /// Text vector.
    Strings(Vec<String>),
    /// Fraction (0.5 == 50%).
    Percent(f64),
    /// Fraction vector.
    Percents(Vec<f64>),
    /// Absolute number or percentage.
    FloatOrPercent(FloatOrPercent),
    /// Vector of absolute numbers or percentages.
    FloatsOrPercents(Vec<FloatOrPercent>),
    /// Planar point.
    Point(Vec2d),
    /// Planar point vector.
    Points(Vec<Vec2d>),
    /// Spatial point.
    Point3(Vec3d),
    /// Boolean.
    Bool(bool),
    /// Boolean vector.
    Bools(Bools),
    /// Named enum value.
    Enum(EnumOption),
    /// Named enum vector.
    Enums(EnumsOption),
}

impl ConfigOption {
    /// Variant tag.
    #[must_use]
    pub const fn option_type(&self) -> OptionType {
        match self {
            Self::Float(_) => OptionType::Float,
            Self::Floats(_) => OptionType::Floats,
            Self::Int(_) => OptionType::Int,
            Self::Ints(_) => OptionType::Ints,
            Self::String(_) => OptionType::String,
            Self::Strings(_) => OptionType::Strings,
            Self::Percent(_) => OptionType::Percent,
            Self::Percents(_) => OptionType::Percents,
            Self::FloatOrPercent(_) => OptionType::FloatOrPercent,
            Self::FloatsOrPercents(_) => OptionType::FloatsOrPercents,
            Self::Point(_) => OptionType::Point,
            Self::Points(_) => OptionType::Points,
            Self::Point3(_) => OptionType::Point3,
            Self::Bool(_) => OptionType::Bool,
            Self::Bools(_) => OptionType::Bools,
            Self::Enum(_) => OptionType::Enum,
            Self::Enums(_) => OptionType::Enums,
        }
    }

    /// Whether this is a vector variant.
    #[must_use]
    pub const fn is_vector(&self) -> bool {
        self.option_type().is_vector()
    }

    /// True only for nullable boolean vectors.
    #[must_use]
    pub const fn nullable(&self) -> bool {
        matches!(self, Self::Bools(b) if b.nullable)
    }

    /// Render the canonical text form.
    #[must_use]
    pub fn serialize(&self) -> String {
        match self {
            Self::Float(v) => format_float(*v),
            Self::Floats(vs) => join_items(vs.iter().map(|v| format_float(*v)), ','),
            Self::Int(v) => v.to_string(),
            Self::Ints(vs) => join_items(vs.iter().map(ToString::to_string), ','),
            Self::String(s) => s.clone(),
            Self::Strings(vs) => join_items(vs.iter().cloned(), ';'),
            Self::Percent(v) => format_percent(*v),
            Self::Percents(vs) => join_items(vs.iter().map(|v| format_percent(*v)), ','),
            Self::FloatOrPercent(v) => v.to_string(),
            Self::FloatsOrPercents(vs) => join_items(vs.iter().map(ToString::to_string), ','),
            Self::Point(p) => p.to_string(),
            Self::Points(ps) => join_items(ps.iter().map(ToString::to_string), ';'),
            Self::Point3(p) => p.to_string(),
            Self::Bool(b) => bool_text(*b).to_owned(),
            Self::Bools(b) => join_items(
                b.values
                    .iter()
                    .map(|v| v.map_or("nil", bool_text).to_owned()),
                ',',
            ),
            Self::Enum(e) => EnumOption::render(&e.values, e.value),
            Self::Enums(e) => join_items(
                e.values.iter().map(|v| EnumOption::render(&e.names, *v)),
                ',',
            ),
        }
    }

    /// Parse `text` into the payload.
    ///
    /// With `append` set, vectors extend their sequence (a `Strings` vector
    /// takes `text` verbatim as one element) and `String` concatenates;
    /// every other scalar refuses. On failure the payload is unchanged.
    pub fn deserialize(&mut self, text: &str, append: bool) -> bool {
        match self {
            Self::Float(v) => set_scalar(v, append, parse_float(text)),
            Self::Int(v) => set_scalar(v, append, parse_int(text)),
            Self::String(s) => {
                if append {
                    s.push_str(text);
                } else {
                    text.clone_into(s);
                }
                true
            },
            Self::Percent(v) => set_scalar(v, append, parse_percent(text).map(|(v, _)| v)),
            Self::FloatOrPercent(v) => set_scalar(v, append, FloatOrPercent::parse(text)),
            Self::Point(p) => set_scalar(p, append, Vec2d::parse(text)),
            Self::Point3(p) => set_scalar(p, append, Vec3d::parse(text)),
            Self::Bool(b) => set_scalar(b, append, parse_bool(text)),
            Self::Enum(e) => {
                let parsed = EnumOption::parse(&e.values, text);
                set_scalar(&mut e.value, append, parsed)
            },
            Self::Floats(vs) => set_items(vs, text, append, ',', parse_float),
            Self::Ints(vs) => set_items(vs, text, append, ',', parse_int),
            Self::Strings(vs) => {
                if append {
                    vs.push(text.to_owned());
                    return true;
                }
                match split_items(text, ';') {
                    Some(items) => {
                        *vs = items;
                        true
                    },
                    None => false,
                }
            },
            Self::Percents(vs) => {
                set_items(vs, text, append, ',', |item| parse_percent(item).map(|(v, _)| v))
            },
            Self::FloatsOrPercents(vs) => set_items(vs, text, append, ',', FloatOrPercent::parse),
            Self::Points(ps) => set_items(ps, text, append, ';', Vec2d::parse),
            Self::Bools(b) => {
                let nullable = b.nullable;
                set_items(&mut b.values, text, append, ',', |item| {
                    if nullable && is_nil(item) {
                        Some(None)
                    } else {
                        parse_bool(item).map(Some)
                    }
                })
            },
            Self::Enums(e) => {
                let names = &e.names;
                set_items(&mut e.values, text, append, ',', |item| {
                    EnumOption::parse(names, item)
                })
            },
        }
    }

    /// Substitution-aware deserialization.
    ///
    /// Boolean vectors replace every item that does not parse, including the
    /// `nil` token, with `default` and report [`DeserializationResult::Substituted`].
    /// Every other variant behaves like [`deserialize`](Self::deserialize).
    pub fn deserialize_with_substitutions(
        &mut self,
        text: &str,
        append: bool,
        default: DeserializationSubstitution,
    ) -> DeserializationResult {
        let Self::Bools(b) = self else {
            return if self.deserialize(text, append) {
                DeserializationResult::Success
            } else {
                DeserializationResult::Failed
            };
        };

        let items = split_items(text, ',').unwrap_or_else(|| vec![text.to_owned()]);
        let mut substituted = false;
        let mut parsed = Vec::with_capacity(items.len());
        for item in &items {
            if let Some(v) = parse_bool(item) {
                parsed.push(Some(v));
            } else {
                substituted = true;
                parsed.push(Some(default.as_bool()));
            }
        }

        if append {
            b.values.extend(parsed);
        } else {
            b.values = parsed;
        }

        if substituted {
            DeserializationResult::Substituted
        } else {
            DeserializationResult::Success
        }
    }

    /// Deep-copy `other`'s payload into `self`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TypeMismatch`] when the variants differ. No
    /// coercion is ever attempted.
    pub fn set(&mut self, other: &Self) -> ConfigResult<()> {
        let (expected, found) = (self.option_type(), other.option_type());
        if expected != found {
            return Err(ConfigError::TypeMismatch { expected, found });
        }
        match (self, other) {
            (Self::Bools(dst), Self::Bools(src)) => {
                let nullable = dst.nullable;
                dst.values = src
                    .values
                    .iter()
                    .map(|v| if nullable { *v } else { Some(v.unwrap_or(false)) })
                    .collect();
            },
            (dst, src) => src.clone_into(dst),
        }
        Ok(())
    }

    /// Resolve a percentage against `ratio_over`.
    ///
    /// `None` for variants other than `Percent` and `FloatOrPercent`.
    #[must_use]
    pub fn get_abs_value(&self, ratio_over: f64) -> Option<f64> {
        match self {
            Self::Percent(v) => Some(v * ratio_over),
            Self::FloatOrPercent(v) => Some(v.get_abs_value(ratio_over)),
            _ => None,
        }
    }

    /// Numeric view of scalar numbers; percentages yield their raw fraction.
    #[must_use]
    pub fn get_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) | Self::Percent(v) => Some(*v),
            Self::FloatOrPercent(v) => Some(v.value),
            Self::Int(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    /// Integer view of `Int` and `Enum`.
    #[must_use]
    pub fn get_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Enum(e) => Some(e.value),
            _ => None,
        }
    }

    /// Boolean view of `Bool`.
    #[must_use]
    pub fn get_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text view of `String`.
    #[must_use]
    pub fn get_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

fn bool_text(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

fn is_nil(item: &str) -> bool {
    item.trim().eq_ignore_ascii_case("nil")
}

fn set_scalar<T>(slot: &mut T, append: bool, parsed: Option<T>) -> bool {
    if append {
        return false;
    }
    match parsed {
        Some(v) => {
            *slot = v;
            true
        },
        None => false,
    }
}

/// Parse every item before touching `slot`, so a bad item leaves the vector
/// as it was.
fn set_items<T, F>(slot: &mut Vec<T>, text: &str, append: bool, separator: char, parse: F) -> bool
where
    F: Fn(&str) -> Option<T>,
{
    let Some(items) = split_items(text, separator) else {
        return false;
    };
    let Some(parsed) = items.iter().map(|item| parse(item.as_str())).collect::<Option<Vec<T>>>() else {
        return false;
    };
    if append {
        slot.extend(parsed);
    } else {
        *slot = parsed;
    }
    true
}
