//! Redis valid-value module - hset/hget round trips on the switch redis DB
//!
//! Sets known-good values on the platina hash channel with `hset` and reads
//! them back with `hget`. Every command is recorded. A step fails when the
//! command printed nothing, printed something containing "error", or (for
//! `hget`) printed anything other than exactly the value that was set.

use tracing::warn;

use super::{
    complete_run, execute_recorded, local_switch_name, Module, ModuleContext, ModuleError,
    ModuleOutput, ModuleParams, ModuleResult, ParamExt,
};
use crate::log_writer::{log_file_path, LogMode, LogWriter};
use crate::recorder::{ResultRecorder, TestOutcome};
use crate::runner::CommandRunner;

/// Channel used when the playbook does not name one.
pub const DEFAULT_CHANNEL: &str = "platina-mk1";
/// Port of the switch redis server for remote access.
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Hash operation performed by a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedisOp {
    Hget,
    Hset,
}

impl RedisOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedisOp::Hget => "hget",
            RedisOp::Hset => "hset",
        }
    }
}

/// One hset/hget step and the value it sets or expects back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedisStep {
    pub op: RedisOp,
    pub param: &'static str,
    pub value: &'static str,
}

impl RedisStep {
    const fn hset(param: &'static str, value: &'static str) -> Self {
        Self {
            op: RedisOp::Hset,
            param,
            value,
        }
    }

    const fn hget(param: &'static str, value: &'static str) -> Self {
        Self {
            op: RedisOp::Hget,
            param,
            value,
        }
    }
}

/// Steps run by [`RedisValidModule`], in order.
pub const HGET_HSET_STEPS: &[RedisStep] = &[
    RedisStep::hset("vnet.pollInterval", "2.000000"),
    RedisStep::hget("vnet.pollInterval", "2.000000"),
    RedisStep::hset("vnet.meth-2.speed", "autoneg"),
    RedisStep::hget("vnet.meth-2.speed", "autoneg"),
    // second read-back of the same key
    RedisStep::hget("vnet.meth-2.speed", "autoneg"),
];

/// Options of the redis valid-value module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisValidConfig {
    /// Name of the switch under test, used in keys and messages
    pub switch_name: String,
    /// Address of the switch, needed with `remote_access`
    pub switch_ip: Option<String>,
    /// Reach redis over the network instead of the local socket
    pub remote_access: bool,
    pub redis_port: u16,
    pub platina_redis_channel: String,
    /// Log file name, without the `.log` suffix
    pub hash_name: String,
    pub log_dir_path: String,
    /// Overwrite locally; remote runs do not write a log unless asked to
    pub log_mode: LogMode,
}

impl RedisValidConfig {
    pub fn from_params(params: &ModuleParams) -> ModuleResult<Self> {
        let remote_access = params.get_bool("remote_access")?.unwrap_or(false);
        let switch_ip = params.get_string("switch_ip")?;
        if remote_access && switch_ip.is_none() {
            return Err(ModuleError::MissingParameter(
                "switch_ip is required when remote_access is set".to_string(),
            ));
        }

        let default_mode = if remote_access {
            LogMode::Skip
        } else {
            LogMode::Overwrite
        };

        Ok(Self {
            switch_name: params
                .get_string("switch_name")?
                .unwrap_or_else(local_switch_name),
            switch_ip,
            remote_access,
            redis_port: params
                .get_u16("redis_port")?
                .unwrap_or(DEFAULT_REDIS_PORT),
            platina_redis_channel: params
                .get_string("platina_redis_channel")?
                .unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
            hash_name: params.get_string_required("hash_name")?,
            log_dir_path: params.get_string_required("log_dir_path")?,
            log_mode: params.get_log_mode("log_mode")?.unwrap_or(default_mode),
        })
    }

    /// Leading `redis-cli` invocation, with a trailing space.
    pub fn cli_prefix(&self) -> String {
        match (&self.switch_ip, self.remote_access) {
            (Some(ip), true) => format!("redis-cli -h {} -p {} ", ip, self.redis_port),
            _ => "redis-cli ".to_string(),
        }
    }

    /// Full command line for `step`.
    pub fn step_cli(&self, step: &RedisStep) -> String {
        let mut cmd = format!(
            "{} {} {} ",
            step.op.as_str(),
            self.platina_redis_channel,
            step.param
        );
        if step.op == RedisOp::Hset {
            cmd.push_str(step.value);
        }
        self.cli_prefix() + &cmd
    }
}

/// Run one step, record it, and add its failures to `outcome`.
pub fn execute_and_verify(
    runner: &dyn CommandRunner,
    config: &RedisValidConfig,
    step: &RedisStep,
    recorder: &mut ResultRecorder,
    outcome: &mut TestOutcome,
) -> ModuleResult<()> {
    let switch_name = &config.switch_name;
    let cli = config.step_cli(step);
    let out = execute_recorded(runner, switch_name, &cli, recorder)?;

    match out.as_deref() {
        None => {
            warn!(%cli, "no output");
            outcome.fail(format!(
                "On switch {} output of command {} is None\n",
                switch_name, cli
            ));
        }
        Some(text) if text.to_lowercase().contains("error") => {
            warn!(%cli, output = text, "command reported an error");
            outcome.fail(format!(
                "On switch {} output of command {} has errors\n",
                switch_name, cli
            ));
        }
        Some(_) => {}
    }

    if step.op == RedisOp::Hget && out.as_deref() != Some(step.value) {
        warn!(%cli, expected = step.value, output = ?out, "value mismatch");
        outcome.fail(format!(
            "On switch {} output of command {} is not matching with expected value {}\n",
            switch_name, cli, step.value
        ));
    }

    Ok(())
}

/// Run every step in `steps` and return the unfinished record.
pub fn test_hget_hset_operations(
    runner: &dyn CommandRunner,
    config: &RedisValidConfig,
    steps: &[RedisStep],
    outcome: &mut TestOutcome,
) -> ModuleResult<ResultRecorder> {
    let mut recorder = ResultRecorder::new();
    for step in steps {
        execute_and_verify(runner, config, step, &mut recorder, outcome)?;
    }
    Ok(recorder)
}

/// Module testing redis hget/hset with valid values
pub struct RedisValidModule;

impl Module for RedisValidModule {
    fn name(&self) -> &'static str {
        "test_redis_valid"
    }

    fn description(&self) -> &'static str {
        "Test redis db hget/hset operations with valid values"
    }

    fn required_params(&self) -> &[&'static str] {
        &["hash_name", "log_dir_path"]
    }

    fn execute(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let config = RedisValidConfig::from_params(params)?;
        let mut outcome = TestOutcome::new();

        let recorder = test_hget_hset_operations(
            context.runner.as_ref(),
            &config,
            HGET_HSET_STEPS,
            &mut outcome,
        )?;

        let writer = LogWriter::new(
            log_file_path(&config.log_dir_path, &config.hash_name),
            config.log_mode,
        );
        complete_run(self.name(), recorder, &outcome, &writer)
    }
}
