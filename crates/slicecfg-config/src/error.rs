use std::io;

use thiserror::Error;

use crate::option::OptionType;

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The key has no definition and matches no alias.
    #[error("Unknown option: {key}")]
    UnknownOption {
        /// Key as it was looked up.
        key: String,
    },

    /// Text failed type-specific parsing and no substitution was available.
    #[error("Invalid value for option {key}: {value}")]
    InvalidValue {
        /// Option key.
        key: String,
        /// Raw text that failed to parse.
        value: String,
    },

    /// The file extension does not map to a working loader.
    #[error("Unsupported format for config file {path}: {detail}")]
    UnsupportedFileFormat {
        /// Path of the rejected file.
        path: String,
        /// Why the file was rejected.
        detail: String,
    },

    /// Failed to read a preset or schema file.
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to parse a JSON preset document.
    #[error("JsonParseError in {path}: {source}")]
    JsonParseError {
        /// Path (or `<memory>`) of the document.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to parse a TOML schema file.
    #[error("Failed to parse schema at {path}: {source}")]
    SchemaParseError {
        /// Path (or `<embedded sample>`) of the schema.
        path: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// `set` was called across two different option variants.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Variant of the receiving option.
        expected: OptionType,
        /// Variant of the option being copied in.
        found: OptionType,
    },

    /// The container has no config definition to resolve keys against.
    #[error("No definition available to resolve option {key}")]
    MissingDefinition {
        /// Key that needed a definition.
        key: String,
    },

    /// The option has no stored value.
    #[error("Option {key} not found")]
    OptionNotSet {
        /// Key that was queried.
        key: String,
    },

    /// The option cannot be resolved to a number.
    #[error("Option {key} of type {option_type} has no numeric value")]
    NotNumeric {
        /// Key that was queried.
        key: String,
        /// Its stored variant.
        option_type: OptionType,
    },

    /// `ratio_over` references loop back on themselves.
    #[error("Circular ratio_over chain: {chain}")]
    RatioCycle {
        /// Keys of the cycle joined with ` -> `.
        chain: String,
    },

    /// Shortcut options expand back into themselves.
    #[error("Circular shortcut chain: {chain}")]
    ShortcutCycle {
        /// Keys of the cycle joined with ` -> `.
        chain: String,
    },

    /// C-style escaped text could not be decoded.
    #[error("Invalid escape sequence: {message}")]
    InvalidEscape {
        /// What went wrong.
        message: String,
    },

    /// An environment exporter could not write a variable.
    #[error("Failed to export {name}: {source}")]
    EnvExport {
        /// Variable name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A schema entry is inconsistent.
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// Field that failed validation.
        field: String,
        /// Validation failure description.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
