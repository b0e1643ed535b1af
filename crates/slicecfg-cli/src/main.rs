//! slicecfg - slicer preset inspector
//!
//! Loads JSON presets against an option schema and prints what the
//! configuration model makes of them: resolved values, substitutions,
//! absolute values of relative options, and differences between presets.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use slicecfg_config::ForwardCompatibilitySubstitutionRule;
use tracing_subscriber::EnvFilter;

mod commands;
mod theme;

use commands::{OutputFormat, diff, env, get, schema, show};

/// slicecfg - inspect slicer presets
#[derive(Parser)]
#[command(name = "slicecfg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Option schema (TOML); defaults to the built-in sample schema
    #[arg(long, global = true, env = "SLICECFG_SCHEMA")]
    schema: Option<PathBuf>,

    /// How values that no longer parse are treated
    #[arg(long, global = true, value_enum, default_value_t = Rule::Enable)]
    rule: Rule,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Command-line spelling of the substitution rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Rule {
    /// Reject values that do not parse
    Disable,
    /// Substitute and report
    Enable,
    /// Substitute silently
    EnableSilent,
    /// Substitute; report only for user presets
    EnableSystemSilent,
}

impl From<Rule> for ForwardCompatibilitySubstitutionRule {
    fn from(rule: Rule) -> Self {
        match rule {
            Rule::Disable => Self::Disable,
            Rule::Enable => Self::Enable,
            Rule::EnableSilent => Self::EnableSilent,
            Rule::EnableSystemSilent => Self::EnableSystemSilent,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load a preset and print its options
    Show {
        /// Preset file (.json)
        preset: PathBuf,
        /// Only print these keys
        #[arg(short, long)]
        key: Vec<String>,
        /// Include schema defaults for keys the preset does not set
        #[arg(long)]
        defaults: bool,
    },

    /// Print one option of a preset
    Get {
        /// Preset file (.json)
        preset: PathBuf,
        /// Option key or alias
        key: String,
        /// Resolve relative values to an absolute number
        #[arg(long)]
        abs: bool,
    },

    /// List options whose values differ between two presets
    Diff {
        /// First preset
        left: PathBuf,
        /// Second preset
        right: PathBuf,
    },

    /// Print the preset as shell `export` lines
    Env {
        /// Preset file (.json)
        preset: PathBuf,
    },

    /// List the options of the schema
    Schema,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable.
    let default_filter = if cli.verbose {
        "debug"
    } else {
        "warn,slicecfg_config=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let def = commands::load_schema(cli.schema.as_deref())?;
    let rule = cli.rule.into();

    match cli.command {
        Commands::Show {
            preset,
            key,
            defaults,
        } => show::run(&def, &preset, rule, &key, defaults, cli.format),
        Commands::Get { preset, key, abs } => get::run(&def, &preset, rule, &key, abs, cli.format),
        Commands::Diff { left, right } => diff::run(&def, &left, &right, rule, cli.format),
        Commands::Env { preset } => env::run(&def, &preset, rule),
        Commands::Schema => schema::run(&def, cli.format),
    }
}
