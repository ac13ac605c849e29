//! Error types for regtest.
//!
//! Test mismatches are not errors: they are recorded in the result log and
//! reported through `result.status`. The types here cover the faults that
//! abort a module run (bad arguments, unlaunchable commands, unwritable logs).

use std::path::PathBuf;
use thiserror::Error;

use crate::modules::ModuleError;

/// Result type alias for regtest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for regtest.
#[derive(Error, Debug)]
pub enum Error {
    /// Module not found in the registry.
    #[error("Module '{0}' not found")]
    ModuleNotFound(String),

    /// No module name given on the command line or in the arguments.
    #[error("No module name given; pass --module or set '_ansible_module_name'")]
    ModuleNameMissing,

    /// Module execution failed.
    #[error("Module '{module}' failed: {source}")]
    Module {
        /// Module name
        module: String,
        /// Underlying module error
        #[source]
        source: ModuleError,
    },

    /// Error reading a module arguments file.
    #[error("Failed to read arguments file '{path}': {source}")]
    ArgsRead {
        /// Path to the arguments file
        path: PathBuf,
        /// Source error
        #[source]
        source: std::io::Error,
    },

    /// Module arguments could not be parsed.
    #[error("Invalid module arguments: {0}")]
    ArgsParse(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a module error with the name of the module that raised it.
    pub fn module(module: impl Into<String>, source: ModuleError) -> Self {
        Self::Module {
            module: module.into(),
            source,
        }
    }
}
