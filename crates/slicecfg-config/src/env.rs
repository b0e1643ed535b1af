//! Exporting options as environment variables.
//!
//! The library never touches the process environment itself: callers hand
//! in an [`EnvExporter`] and decide what "exporting" means (collecting into
//! a map for a child process, writing a shell snippet, ...).

use std::collections::BTreeMap;
use std::io::{self, Write};

/// Prefix of every exported variable name.
pub const ENV_PREFIX: &str = "SLIC3R_";

/// Variable name for option `key`.
#[must_use]
pub fn env_var_name(key: &str) -> String {
    format!("{ENV_PREFIX}{}", key.to_ascii_uppercase())
}

/// Sink for exported variables.
pub trait EnvExporter {
    /// Export one variable.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the sink cannot be written.
    fn export(&mut self, name: &str, value: &str) -> io::Result<()>;
}

impl EnvExporter for BTreeMap<String, String> {
    fn export(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.insert(name.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Writes POSIX `export NAME='value'` lines.
#[derive(Debug)]
pub struct ShellExporter<W> {
    out: W,
}

impl<W: Write> ShellExporter<W> {
    /// Wrap a writer.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EnvExporter for ShellExporter<W> {
    fn export(&mut self, name: &str, value: &str) -> io::Result<()> {
        // Single quotes cannot be escaped inside single quotes; close, emit
        // an escaped quote, reopen.
        let quoted = value.replace('\'', r"'\''");
        writeln!(self.out, "export {name}='{quoted}'")
    }
}
