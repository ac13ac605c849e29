//! Shared test utilities for the regtest test suite.
//!
//! Provides a scripted [`CommandRunner`] that answers commands from a table
//! instead of spawning processes, plus parameter and temp-dir helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;
use tempfile::TempDir;

use regtest::modules::ModuleParams;
use regtest::runner::{CommandRunner, RunnerError, RunnerResult, TIMESTAMP_CLI};

// ============================================================================
// Scripted Runner
// ============================================================================

/// A runner that replays canned outputs.
///
/// Timestamps are `20261016HH:MM:SS` strings that advance one second per
/// call, so every recorded key is unique unless a test freezes the clock.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    outputs: RwLock<HashMap<String, Option<String>>>,
    default_output: RwLock<Option<String>>,
    missing_programs: RwLock<Vec<String>>,
    commands_executed: RwLock<Vec<String>>,
    frozen_time: RwLock<Option<String>>,
    clock: AtomicU32,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `cli` with `output`.
    pub fn on(self, cli: impl Into<String>, output: Option<&str>) -> Self {
        self.outputs
            .write()
            .insert(cli.into(), output.map(String::from));
        self
    }

    /// Answer unknown commands with `output` (default `None`).
    pub fn otherwise(self, output: Option<&str>) -> Self {
        *self.default_output.write() = output.map(String::from);
        self
    }

    /// Fail to launch any command whose program is `program`.
    pub fn missing_program(self, program: impl Into<String>) -> Self {
        self.missing_programs.write().push(program.into());
        self
    }

    /// Return the same timestamp for every call.
    pub fn freeze_time(self, stamp: impl Into<String>) -> Self {
        *self.frozen_time.write() = Some(stamp.into());
        self
    }

    /// Commands run so far, timestamp calls excluded.
    pub fn commands(&self) -> Vec<String> {
        self.commands_executed.read().clone()
    }

    fn next_stamp(&self) -> String {
        if let Some(stamp) = self.frozen_time.read().clone() {
            return stamp;
        }
        let tick = self.clock.fetch_add(1, Ordering::SeqCst);
        format!(
            "20261016{:02}:{:02}:{:02}",
            12 + tick / 3600,
            (tick / 60) % 60,
            tick % 60
        )
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, cli: &str) -> RunnerResult<Option<String>> {
        if cli == TIMESTAMP_CLI {
            return Ok(Some(self.next_stamp()));
        }

        let program = cli.split_whitespace().next().unwrap_or_default();
        if self.missing_programs.read().iter().any(|p| p == program) {
            return Err(RunnerError::Spawn {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }

        self.commands_executed.write().push(cli.to_string());
        Ok(self
            .outputs
            .read()
            .get(cli)
            .cloned()
            .unwrap_or_else(|| self.default_output.read().clone()))
    }
}

// ============================================================================
// Parameter helpers
// ============================================================================

/// Build module parameters from `(key, value)` pairs.
pub fn params(pairs: &[(&str, serde_json::Value)]) -> ModuleParams {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

/// Temporary log directory and its path as a string parameter.
pub fn log_dir() -> (TempDir, String) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().display().to_string();
    (dir, path)
}

/// Split a log file into its three-line blocks as `(key, value)` pairs.
pub fn parse_log(text: &str) -> Vec<(String, String)> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut entries = Vec::new();
    let mut i = 0;
    while i + 2 < lines.len() {
        assert_eq!(lines[i + 2], "", "block at line {} lacks a blank separator", i);
        entries.push((lines[i].to_string(), lines[i + 1].to_string()));
        i += 3;
    }
    entries
}
