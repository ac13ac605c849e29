//! Command runner - Execute CLI commands on the switch
//!
//! Commands are given as a single string, split with POSIX shell-word rules
//! and executed directly (no shell). The caller only ever sees one text
//! result: stdout if the command printed anything, otherwise stderr,
//! otherwise `None`. Exit codes are ignored; a command that fails usually
//! says so on stderr, and that text is what the checks look at.

use std::process::Command;
use thiserror::Error;
use tracing::{debug, trace};

/// Command used to stamp every recorded entry with its execution time.
pub const TIMESTAMP_CLI: &str = "date +%Y%m%d%T";

/// Errors that abort a command before it produces any output
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to split command '{cli}': {message}")]
    Parse { cli: String, message: String },

    #[error("Command is empty")]
    EmptyCommand,

    #[error("Failed to execute '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for runner operations
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Executes a command line and returns its captured text.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    /// Run `cli` to completion.
    ///
    /// Returns right-trimmed stdout if it is non-empty, else right-trimmed
    /// stderr if that is non-empty, else `None`.
    fn run(&self, cli: &str) -> RunnerResult<Option<String>>;
}

/// Runs commands as local child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, cli: &str) -> RunnerResult<Option<String>> {
        let argv = split_command(cli)?;
        let (program, args) = argv.split_first().ok_or(RunnerError::EmptyCommand)?;

        debug!(cli, "running command");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| RunnerError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        trace!(
            cli,
            rc = output.status.code().unwrap_or(-1),
            "command finished"
        );

        Ok(captured_output(&stdout, &stderr))
    }
}

/// Split a command string into argv using shell quoting rules.
pub fn split_command(cli: &str) -> RunnerResult<Vec<String>> {
    let argv = shell_words::split(cli).map_err(|e| RunnerError::Parse {
        cli: cli.to_string(),
        message: e.to_string(),
    })?;
    if argv.is_empty() {
        return Err(RunnerError::EmptyCommand);
    }
    Ok(argv)
}

/// Pick the text a check should see from a finished command.
///
/// Emptiness is judged before trimming, so whitespace-only stdout still wins
/// over stderr and comes back as an empty string.
pub fn captured_output(stdout: &str, stderr: &str) -> Option<String> {
    if !stdout.is_empty() {
        Some(stdout.trim_end().to_string())
    } else if !stderr.is_empty() {
        Some(stderr.trim_end().to_string())
    } else {
        None
    }
}

/// Execution time of the next step, as printed by `date +%Y%m%d%T`.
pub fn exec_time(runner: &dyn CommandRunner) -> RunnerResult<Option<String>> {
    runner.run(TIMESTAMP_CLI)
}
