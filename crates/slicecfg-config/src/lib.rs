#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Typed, string-keyed configuration model for a 3D-printing slicer.
//!
//! Settings are held as [`ConfigOption`] values in a container implementing
//! [`ConfigBase`]. Containers resolve keys against a [`ConfigDef`] schema,
//! translate keys written by older versions, and recover values that no
//! longer parse according to a [`ForwardCompatibilitySubstitutionRule`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use slicecfg_config::{ConfigBase, ConfigDef, DynamicConfig, ForwardCompatibilitySubstitutionRule};
//!
//! let def = Arc::new(ConfigDef::sample().unwrap());
//! let mut config = DynamicConfig::with_def(def);
//! let ctx = config
//!     .load(Path::new("process.json"), ForwardCompatibilitySubstitutionRule::Enable)
//!     .unwrap();
//! for substitution in &ctx.substitutions {
//!     println!("{substitution}");
//! }
//! println!("inner walls: {} mm", config.get_abs_value("inner_wall_line_width").unwrap());
//! ```
//!
//! # Containers
//!
//! - [`DynamicConfig`] stores any key and may run without a schema.
//! - [`StaticConfig`] is bound to a schema and only stores its keys.
//!
//! # Schemas
//!
//! Schemas are built in code or loaded from TOML (see [`schema`]). The
//! sample schema compiled into the crate covers a handful of printer,
//! process and filament options.

/// Option containers and the deserialization pipeline.
pub mod config;
/// Option definitions.
pub mod def;
/// Environment variable export.
pub mod env;
/// Error types.
pub mod error;
/// JSON preset loading.
pub mod json;
/// Legacy key translation hooks.
pub mod legacy;
/// Option values and their text forms.
pub mod option;
/// TOML schema files.
pub mod schema;
/// Substitution rules and records.
pub mod substitution;
/// Schema validation.
pub mod validate;

pub use config::{ConfigBase, DynamicConfig, StaticConfig};
pub use def::{ConfigDef, ConfigOptionDef};
pub use env::{EnvExporter, ShellExporter};
pub use error::{ConfigError, ConfigResult};
pub use json::LoadedPreset;
pub use legacy::{LegacyHandler, LegacyKey, LegacyTable};
pub use option::{ConfigOption, OptionType};
pub use substitution::{
    ConfigSubstitution, ConfigSubstitutionContext, ConfigSubstitutions,
    ForwardCompatibilitySubstitutionRule,
};
