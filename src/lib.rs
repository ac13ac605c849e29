//! # regtest - switch regression test modules
//!
//! Each test module runs a fixed list of CLI checks (`goes`, `ethtool`,
//! `redis-cli`) against a switch, records every command with its output,
//! writes the record to a flat log file and reports pass/fail back to the
//! playbook.
//!
//! ## Flow
//!
//! ```text
//! check routine ──run──▶ CommandRunner ──output──▶ ResultRecorder
//!       │                                               │
//!       └── mismatch ──▶ TestOutcome ──finish──────────▶│
//!                                                       ▼
//!                                     LogWriter ──▶ {log_dir}/{hash}.log
//!                                                       │
//!                                                       ▼
//!                                  {"hash_dict": ..., "log_file_path": ...}
//! ```
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use regtest::prelude::*;
//!
//! let mut params = ModuleParams::new();
//! params.insert("switch_name".into(), "invader29".into());
//! params.insert("hash_name".into(), "regression".into());
//! params.insert("log_dir_path".into(), "/var/log/regtest".into());
//!
//! let registry = ModuleRegistry::with_builtins();
//! let output = registry
//!     .execute("test_redis_valid", &params, &ModuleContext::default())
//!     .unwrap();
//! println!("{}", output.hash_dict.status().unwrap());
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::error::{Error, Result};
    pub use crate::log_writer::{LogMode, LogWriter};
    pub use crate::modules::{
        Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleRegistry,
        ModuleResult, ParamExt,
    };
    pub use crate::recorder::{ResultRecorder, TestOutcome, TestStatus};
    pub use crate::runner::{CommandRunner, ProcessRunner};
}

/// Module argument loading (JSON or `key=value` argument files).
pub mod config;

/// Error types and result aliases.
pub mod error;

/// Flat text log output.
pub mod log_writer;

/// Test modules, their parameters and the module registry.
pub mod modules;

/// Ordered record of command outputs and the pass/fail outcome.
pub mod recorder;

/// Command execution.
pub mod runner;

pub use error::{Error, Result};
