//! Test module system for regtest
//!
//! A test module runs a fixed sequence of CLI checks against one switch,
//! records every command and its output, writes the record to a log file and
//! returns the record plus the log path. Modules are looked up by name in the
//! [`ModuleRegistry`], the same name the playbook uses to invoke them.

pub mod port_params;
pub mod redis_valid;

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::log_writer::{LogMode, LogWriter};
use crate::recorder::{ResultRecorder, TestOutcome, TestStatus};
use crate::runner::{exec_time, CommandRunner, ProcessRunner, RunnerError};

/// Errors that abort a module run
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("Failed to write log file '{path}': {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for module operations
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Value returned to the playbook
#[derive(Debug, Clone, Serialize)]
pub struct ModuleOutput {
    /// Test modules never change switch state from the playbook's view
    pub changed: bool,
    /// Every recorded command plus `result.detail` and `result.status`
    pub hash_dict: ResultRecorder,
    /// Where the log was (or would have been) written
    pub log_file_path: String,
}

impl ModuleOutput {
    pub fn new(hash_dict: ResultRecorder, log_file_path: impl Into<String>) -> Self {
        Self {
            changed: false,
            hash_dict,
            log_file_path: log_file_path.into(),
        }
    }

    pub fn status(&self) -> Option<TestStatus> {
        self.hash_dict.status()
    }

    pub fn passed(&self) -> bool {
        self.status() == Some(TestStatus::Passed)
    }
}

/// Parameters passed to a module
pub type ModuleParams = HashMap<String, serde_json::Value>;

/// Context for module execution
#[derive(Clone)]
pub struct ModuleContext {
    /// Runner used for every CLI call the module makes
    pub runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContext").finish_non_exhaustive()
    }
}

impl Default for ModuleContext {
    fn default() -> Self {
        Self {
            runner: Arc::new(ProcessRunner::new()),
        }
    }
}

impl ModuleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }
}

/// Trait that all test modules implement
pub trait Module: Send + Sync {
    /// Returns the name the playbook invokes the module by
    fn name(&self) -> &'static str;

    /// Returns a description of what the module tests
    fn description(&self) -> &'static str;

    /// Run all checks and return the recorded results
    fn execute(&self, params: &ModuleParams, context: &ModuleContext)
        -> ModuleResult<ModuleOutput>;

    /// Validate the parameters before execution
    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        let _ = params;
        Ok(())
    }

    /// Returns the list of required parameters
    fn required_params(&self) -> &[&'static str] {
        &[]
    }
}

/// Helper trait for extracting parameters
///
/// Values may arrive as JSON scalars or as strings (legacy `key=value`
/// arguments), so every getter accepts both.
pub trait ParamExt {
    fn get_string(&self, key: &str) -> ModuleResult<Option<String>>;
    fn get_string_required(&self, key: &str) -> ModuleResult<String>;
    fn get_bool(&self, key: &str) -> ModuleResult<Option<bool>>;
    fn get_u16(&self, key: &str) -> ModuleResult<Option<u16>>;
    fn get_u32(&self, key: &str) -> ModuleResult<Option<u32>>;
    fn get_vec_string(&self, key: &str) -> ModuleResult<Option<Vec<String>>>;
    fn get_log_mode(&self, key: &str) -> ModuleResult<Option<LogMode>>;
}

impl ParamExt for ModuleParams {
    fn get_string(&self, key: &str) -> ModuleResult<Option<String>> {
        match self.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
            Some(v) => Ok(Some(v.to_string())),
        }
    }

    fn get_string_required(&self, key: &str) -> ModuleResult<String> {
        self.get_string(key)?
            .ok_or_else(|| ModuleError::MissingParameter(key.to_string()))
    }

    fn get_bool(&self, key: &str) -> ModuleResult<Option<bool>> {
        match self.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::Bool(b)) => Ok(Some(*b)),
            Some(serde_json::Value::String(s)) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" | "y" => Ok(Some(true)),
                "false" | "no" | "0" | "off" | "n" | "" => Ok(Some(false)),
                _ => Err(ModuleError::InvalidParameter(format!("{} must be a boolean", key))),
            },
            Some(serde_json::Value::Number(n)) => Ok(Some(n.as_i64() != Some(0))),
            Some(_) => Err(ModuleError::InvalidParameter(format!("{} must be a boolean", key))),
        }
    }

    fn get_u16(&self, key: &str) -> ModuleResult<Option<u16>> {
        self.get_u32(key)?
            .map(|v| {
                u16::try_from(v).map_err(|_| {
                    ModuleError::InvalidParameter(format!("{} must fit in 16 bits", key))
                })
            })
            .transpose()
    }

    fn get_u32(&self, key: &str) -> ModuleResult<Option<u32>> {
        let invalid =
            || ModuleError::InvalidParameter(format!("{} must be a positive integer", key));
        match self.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Some)
                .ok_or_else(invalid),
            Some(serde_json::Value::String(s)) => {
                s.trim().parse().map(Some).map_err(|_| invalid())
            }
            Some(_) => Err(invalid()),
        }
    }

    fn get_vec_string(&self, key: &str) -> ModuleResult<Option<Vec<String>>> {
        match self.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::Array(arr)) => Ok(Some(
                arr.iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => s.clone(),
                        v => v.to_string(),
                    })
                    .collect(),
            )),
            // Comma-separated list from key=value arguments
            Some(serde_json::Value::String(s)) => Ok(Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            )),
            Some(_) => Err(ModuleError::InvalidParameter(format!("{} must be a list", key))),
        }
    }

    fn get_log_mode(&self, key: &str) -> ModuleResult<Option<LogMode>> {
        self.get_string(key)?
            .map(|s| s.parse().map_err(ModuleError::InvalidParameter))
            .transpose()
    }
}

/// Default switch name when the playbook does not pass one.
pub fn local_switch_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Run `cli`, stamp it with the execution time and record it.
///
/// Returns the command output for the caller to check.
pub fn execute_recorded(
    runner: &dyn CommandRunner,
    switch_name: &str,
    cli: &str,
    recorder: &mut ResultRecorder,
) -> ModuleResult<Option<String>> {
    let out = runner.run(cli)?;
    let time = exec_time(runner)?;
    let key = recorder.record(switch_name, time.as_deref(), cli, out.clone());
    debug!(%key, output = ?out, "recorded");
    Ok(out)
}

/// Close a run: add the summary entries, write the log, build the output.
pub fn complete_run(
    module: &str,
    mut recorder: ResultRecorder,
    outcome: &TestOutcome,
    writer: &LogWriter,
) -> ModuleResult<ModuleOutput> {
    recorder.finish(outcome);

    writer
        .write(&recorder)
        .map_err(|source| ModuleError::LogWrite {
            path: writer.path().to_path_buf(),
            source,
        })?;

    info!(
        module,
        status = %outcome.status(),
        entries = recorder.len(),
        log = %writer.path().display(),
        "test run complete"
    );
    Ok(ModuleOutput::new(
        recorder,
        writer.path().display().to_string(),
    ))
}

/// Registry for looking up test modules by name
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Create a registry with all built-in test modules
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(redis_valid::RedisValidModule));
        registry.register(Arc::new(port_params::PortParamsModule));
        registry
    }

    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.insert(module.name().to_string(), module);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// All module names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Execute a module by name
    pub fn execute(
        &self,
        name: &str,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> crate::error::Result<ModuleOutput> {
        let module = self
            .get(name)
            .ok_or_else(|| crate::error::Error::ModuleNotFound(name.to_string()))?;

        let missing = module
            .required_params()
            .iter()
            .find(|p| params.get(**p).map_or(true, serde_json::Value::is_null));
        let checked = match missing {
            Some(param) => Err(ModuleError::MissingParameter((*param).to_string())),
            None => module.validate_params(params),
        };

        checked
            .and_then(|()| module.execute(params, context))
            .map_err(|e| crate::error::Error::module(name, e))
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::MockCommandRunner;

    struct NoopModule;

    impl Module for NoopModule {
        fn name(&self) -> &'static str {
            "noop"
        }

        fn description(&self) -> &'static str {
            "Records nothing"
        }

        fn execute(
            &self,
            params: &ModuleParams,
            _context: &ModuleContext,
        ) -> ModuleResult<ModuleOutput> {
            let path = params.get_string("log")?.unwrap_or_default();
            let mut recorder = ResultRecorder::new();
            recorder.finish(&TestOutcome::new());
            Ok(ModuleOutput::new(recorder, path))
        }

        fn required_params(&self) -> &[&'static str] {
            &["log"]
        }
    }

    #[test]
    fn test_module_registry() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(NoopModule));

        assert!(registry.contains("noop"));
        assert!(!registry.contains("nonexistent"));
        assert_eq!(registry.get("noop").unwrap().name(), "noop");
    }

    #[test]
    fn test_registry_builtins() {
        let registry = ModuleRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["test_port_params", "test_redis_valid"]);
    }

    #[test]
    fn test_registry_missing_required_param() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(NoopModule));

        let mut params = ModuleParams::new();
        params.insert("log".to_string(), serde_json::Value::Null);
        let err = registry
            .execute("noop", &params, &ModuleContext::default())
            .unwrap_err();
        assert!(err.to_string().contains("Missing required parameter: log"));
    }

    #[test]
    fn test_registry_required_params_checked_before_validation() {
        let registry = ModuleRegistry::with_builtins();

        let mut params = ModuleParams::new();
        params.insert("remote_access".to_string(), serde_json::json!("maybe"));
        params.insert("log_dir_path".to_string(), serde_json::json!("/tmp"));
        let err = registry
            .execute("test_redis_valid", &params, &ModuleContext::default())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Module {
                source: ModuleError::MissingParameter(ref p),
                ..
            } if p == "hash_name"
        ));
    }

    #[test]
    fn test_registry_unknown_module() {
        let registry = ModuleRegistry::new();
        let result = registry.execute("nope", &ModuleParams::new(), &ModuleContext::default());
        assert!(matches!(result, Err(crate::error::Error::ModuleNotFound(_))));
    }

    #[test]
    fn test_param_ext() {
        let mut params = ModuleParams::new();
        params.insert("string".to_string(), serde_json::json!("hello"));
        params.insert("bool_true".to_string(), serde_json::json!(true));
        params.insert("bool_str".to_string(), serde_json::json!("no"));
        params.insert("port".to_string(), serde_json::json!(3));
        params.insert("port_str".to_string(), serde_json::json!("17"));
        params.insert("list".to_string(), serde_json::json!(["spine1", "spine2"]));
        params.insert("csv".to_string(), serde_json::json!("spine1, spine2"));
        params.insert("mode".to_string(), serde_json::json!("append"));

        assert_eq!(params.get_string("string").unwrap(), Some("hello".to_string()));
        assert_eq!(params.get_string("port").unwrap(), Some("3".to_string()));
        assert_eq!(params.get_bool("bool_true").unwrap(), Some(true));
        assert_eq!(params.get_bool("bool_str").unwrap(), Some(false));
        assert_eq!(params.get_u32("port").unwrap(), Some(3));
        assert_eq!(params.get_u32("port_str").unwrap(), Some(17));
        assert_eq!(params.get_u16("port").unwrap(), Some(3));
        assert_eq!(
            params.get_vec_string("list").unwrap(),
            Some(vec!["spine1".to_string(), "spine2".to_string()])
        );
        assert_eq!(
            params.get_vec_string("csv").unwrap(),
            Some(vec!["spine1".to_string(), "spine2".to_string()])
        );
        assert_eq!(params.get_log_mode("mode").unwrap(), Some(LogMode::Append));
        assert_eq!(params.get_string("missing").unwrap(), None);
    }

    #[test]
    fn test_param_ext_invalid() {
        let mut params = ModuleParams::new();
        params.insert("flag".to_string(), serde_json::json!("maybe"));
        params.insert("port".to_string(), serde_json::json!(-1));
        params.insert("big".to_string(), serde_json::json!(70000));
        params.insert("mode".to_string(), serde_json::json!("rotate"));

        assert!(params.get_bool("flag").is_err());
        assert!(params.get_u32("port").is_err());
        assert!(params.get_u16("big").is_err());
        assert!(params.get_log_mode("mode").is_err());
        assert!(params.get_string_required("absent").is_err());
    }

    #[test]
    fn test_execute_recorded_stamps_key() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .withf(|cli| cli == "ethtool xeth3")
            .times(1)
            .returning(|_| Ok(Some("Auto-negotiation: off".to_string())));
        mock.expect_run()
            .withf(|cli| cli == crate::runner::TIMESTAMP_CLI)
            .times(1)
            .returning(|_| Ok(Some("2026101608:15:00".to_string())));

        let mut recorder = ResultRecorder::new();
        let out = execute_recorded(&mock, "leaf1", "ethtool xeth3", &mut recorder).unwrap();

        assert_eq!(out.as_deref(), Some("Auto-negotiation: off"));
        assert_eq!(
            recorder.get("leaf1 2026101608:15:00 ethtool xeth3"),
            Some(&Some("Auto-negotiation: off".to_string()))
        );
    }

    #[test]
    fn test_complete_run_skip_mode() {
        let mut outcome = TestOutcome::new();
        outcome.fail("bad\n");
        let writer = LogWriter::new("/nonexistent/dir/run.log", LogMode::Skip);

        let output = complete_run("noop", ResultRecorder::new(), &outcome, &writer).unwrap();
        assert!(!output.passed());
        assert_eq!(output.log_file_path, "/nonexistent/dir/run.log");
        assert_eq!(output.hash_dict.detail(), Some("bad\n"));
    }

    #[test]
    fn test_complete_run_unwritable_log() {
        let writer = LogWriter::new("/nonexistent/dir/run.log", LogMode::Overwrite);
        let result = complete_run("noop", ResultRecorder::new(), &TestOutcome::new(), &writer);
        assert!(matches!(result, Err(ModuleError::LogWrite { .. })));
    }
}
