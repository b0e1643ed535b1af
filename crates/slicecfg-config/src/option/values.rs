//! Payload types carried by the option variants.

use std::fmt;
use std::sync::Arc;

use super::text::{format_float, format_percent, parse_float, parse_int, parse_percent};

/// Planar point, serialized as `x,y`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2d {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Vec2d {
    /// Construct a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub(crate) fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split(',');
        let x = parse_float(parts.next()?)?;
        let y = parse_float(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { x, y })
    }
}

impl fmt::Display for Vec2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", format_float(self.x), format_float(self.y))
    }
}

/// Spatial point, serialized as `x,y,z`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3d {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Vec3d {
    /// Construct a point.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub(crate) fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split(',');
        let x = parse_float(parts.next()?)?;
        let y = parse_float(parts.next()?)?;
        let z = parse_float(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { x, y, z })
    }
}

impl fmt::Display for Vec3d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            format_float(self.x),
            format_float(self.y),
            format_float(self.z)
        )
    }
}

/// Either an absolute number or a fraction of some referenced value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FloatOrPercent {
    /// Absolute value, or the fraction when `percent` is set (0.5 == 50%).
    pub value: f64,
    /// Whether `value` is relative.
    pub percent: bool,
}

impl FloatOrPercent {
    /// An absolute value.
    #[must_use]
    pub const fn absolute(value: f64) -> Self {
        Self {
            value,
            percent: false,
        }
    }

    /// A relative value; `fraction` of 0.5 means 50%.
    #[must_use]
    pub const fn percent(fraction: f64) -> Self {
        Self {
            value: fraction,
            percent: true,
        }
    }

    /// Resolve against `ratio_over`. Absolute values are returned unchanged.
    #[must_use]
    pub fn get_abs_value(&self, ratio_over: f64) -> f64 {
        if self.percent {
            self.value * ratio_over
        } else {
            self.value
        }
    }

    pub(crate) fn parse(text: &str) -> Option<Self> {
        parse_percent(text).map(|(value, percent)| Self { value, percent })
    }
}

impl fmt::Display for FloatOrPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.percent {
            f.write_str(&format_percent(self.value))
        } else {
            f.write_str(&format_float(self.value))
        }
    }
}

/// Name table of an enum option, shared by every value created from the
/// same definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumValues {
    entries: Vec<(String, i32)>,
}

impl EnumValues {
    /// Build a table from explicit `(name, value)` pairs.
    #[must_use]
    pub fn new(entries: Vec<(String, i32)>) -> Self {
        Self { entries }
    }

    /// Build a table numbering `names` from zero in order.
    ///
    /// Names past `i32::MAX` are dropped.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = names
            .into_iter()
            .enumerate()
            .filter_map(|(i, name)| i32::try_from(i).ok().map(|v| (name.into(), v)))
            .collect();
        Self { entries }
    }

    /// Look up the numeric value of `name`.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Look up the name of `value`.
    #[must_use]
    pub fn name_of(&self, value: i32) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| n.as_str())
    }

    /// All names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single enum value bound to its name table.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumOption {
    /// Numeric value.
    pub value: i32,
    /// Name table used for (de)serialization.
    pub values: Arc<EnumValues>,
}

impl EnumOption {
    /// Construct from a value and its table.
    #[must_use]
    pub fn new(value: i32, values: Arc<EnumValues>) -> Self {
        Self { value, values }
    }

    /// Name of the current value, if the table knows it.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.values.name_of(self.value)
    }

    /// Values outside the name table render as their number.
    pub(crate) fn render(values: &EnumValues, value: i32) -> String {
        values
            .name_of(value)
            .map_or_else(|| value.to_string(), str::to_owned)
    }

    /// Inverse of [`render`](Self::render): a name, or a bare number.
    pub(crate) fn parse(values: &EnumValues, text: &str) -> Option<i32> {
        let text = text.trim();
        values.value_of(text).or_else(|| parse_int(text))
    }
}

/// A vector of enum values sharing one name table.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumsOption {
    /// Numeric values.
    pub values: Vec<i32>,
    /// Name table used for (de)serialization.
    pub names: Arc<EnumValues>,
}

impl EnumsOption {
    /// Construct from values and their table.
    #[must_use]
    pub fn new(values: Vec<i32>, names: Arc<EnumValues>) -> Self {
        Self { values, names }
    }
}

/// Boolean vector. Nullable vectors may hold `None` ("nil") per position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bools {
    /// Payload; `None` only ever appears when `nullable` is set.
    pub values: Vec<Option<bool>>,
    /// Whether the vector accepts the `nil` sentinel.
    pub nullable: bool,
}

impl Bools {
    /// A non-nullable vector.
    #[must_use]
    pub fn new(values: Vec<bool>) -> Self {
        Self {
            values: values.into_iter().map(Some).collect(),
            nullable: false,
        }
    }

    /// A nullable vector.
    #[must_use]
    pub fn nullable(values: Vec<Option<bool>>) -> Self {
        Self {
            values,
            nullable: true,
        }
    }

    /// Whether the first element is an explicit `true`.
    #[must_use]
    pub fn first_is_true(&self) -> bool {
        self.values.first() == Some(&Some(true))
    }
}
