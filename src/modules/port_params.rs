//! Port parameter module - verify speed, fec, link, media and autoneg of a port
//!
//! Reads the `vnet.xeth<port>.*` fields through `goes hget` and the
//! auto-negotiation state through `ethtool`. All comparisons are substring
//! checks. When autoneg mode is active, spine switches are expected to run
//! the port at `autoneg` speed with auto-negotiation on; every other switch
//! expects a fixed `100g` link with auto-negotiation off.

use tracing::warn;

use super::{
    complete_run, execute_recorded, local_switch_name, Module, ModuleContext, ModuleError,
    ModuleOutput, ModuleParams, ModuleResult, ParamExt,
};
use crate::log_writer::{log_file_path, LogMode, LogWriter};
use crate::recorder::{ResultRecorder, TestOutcome};
use crate::runner::CommandRunner;

use super::redis_valid::DEFAULT_CHANNEL;

/// Options of the port parameter module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortParamsConfig {
    pub switch_name: String,
    /// Front panel port number, checked as interface `xeth<port>`
    pub port: u32,
    /// Switches acting as spines
    pub spine_list: Vec<String>,
    /// Non-empty turns on autoneg expectations for spines
    pub autoneg: String,
    pub platina_redis_channel: String,
    pub hash_name: String,
    pub log_dir_path: String,
    pub log_mode: LogMode,
}

impl PortParamsConfig {
    pub fn from_params(params: &ModuleParams) -> ModuleResult<Self> {
        let port = params
            .get_u32("port")?
            .ok_or_else(|| ModuleError::MissingParameter("port".to_string()))?;

        Ok(Self {
            switch_name: params
                .get_string("switch_name")?
                .unwrap_or_else(local_switch_name),
            port,
            spine_list: params.get_vec_string("spine_list")?.unwrap_or_default(),
            autoneg: params.get_string("autoneg")?.unwrap_or_default(),
            platina_redis_channel: params
                .get_string("platina_redis_channel")?
                .unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
            hash_name: params.get_string_required("hash_name")?,
            log_dir_path: params.get_string_required("log_dir_path")?,
            log_mode: params.get_log_mode("log_mode")?.unwrap_or(LogMode::Append),
        })
    }

    /// Whether this switch is a spine running with autoneg expectations.
    pub fn autoneg_spine(&self) -> bool {
        !self.spine_list.is_empty()
            && !self.autoneg.is_empty()
            && self.spine_list.iter().any(|s| *s == self.switch_name)
    }

    pub fn interface(&self) -> String {
        format!("xeth{}", self.port)
    }

    /// `goes hget` command line for one `vnet.xeth<port>` field.
    pub fn hget_cli(&self, field: &str) -> String {
        format!(
            "goes hget {} vnet.xeth{}.{}",
            self.platina_redis_channel, self.port, field
        )
    }

    pub fn ethtool_cli(&self) -> String {
        format!("ethtool {}", self.interface())
    }
}

/// Values a port is expected to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortExpectations {
    pub speed: &'static str,
    pub fec: &'static str,
    pub link: &'static str,
    pub media: &'static str,
    /// `on` or `off`, as printed by ethtool
    pub autoneg: &'static str,
    /// Appended to every failure message
    pub stage: &'static str,
}

impl PortExpectations {
    pub fn for_config(config: &PortParamsConfig) -> Self {
        let spine = config.autoneg_spine();
        Self {
            speed: if spine { "autoneg" } else { "100g" },
            fec: "cl91",
            link: "true",
            media: "copper",
            autoneg: if spine { "on" } else { "off" },
            stage: if spine { "after change of config" } else { "" },
        }
    }

    /// Line ethtool prints for the expected auto-negotiation state.
    pub fn autoneg_line(&self) -> String {
        format!("Auto-negotiation: {}", self.autoneg)
    }
}

fn contains(out: Option<&str>, expected: &str) -> bool {
    out.is_some_and(|text| text.contains(expected))
}

/// Run and record `cli`; fail with `reason` unless the output contains `expected`.
fn check_contains(
    runner: &dyn CommandRunner,
    switch_name: &str,
    recorder: &mut ResultRecorder,
    outcome: &mut TestOutcome,
    cli: String,
    expected: &str,
    reason: String,
) -> ModuleResult<()> {
    let out = execute_recorded(runner, switch_name, &cli, recorder)?;
    if !contains(out.as_deref(), expected) {
        warn!(%cli, expected, output = ?out, "port check failed");
        outcome.fail(reason);
    }
    Ok(())
}

/// Run every port check and return the unfinished record.
pub fn test_port_parameters(
    runner: &dyn CommandRunner,
    config: &PortParamsConfig,
    outcome: &mut TestOutcome,
) -> ModuleResult<ResultRecorder> {
    let mut recorder = ResultRecorder::new();
    let expect = PortExpectations::for_config(config);
    let sw = &config.switch_name;
    let port = config.port;
    let stage = expect.stage;

    check_contains(
        runner,
        sw,
        &mut recorder,
        outcome,
        config.hget_cli("speed"),
        expect.speed,
        format!(
            "On switch {} speed of the interface is not set to {} for the interface xeth{} {}\n",
            sw, expect.speed, port, stage
        ),
    )?;

    check_contains(
        runner,
        sw,
        &mut recorder,
        outcome,
        config.hget_cli("fec"),
        expect.fec,
        format!(
            "On switch {} fec is not set to {} for the interface xeth{} {}\n",
            sw, expect.fec, port, stage
        ),
    )?;

    check_contains(
        runner,
        sw,
        &mut recorder,
        outcome,
        config.hget_cli("link"),
        expect.link,
        format!(
            "On switch {} port link is not up for the interface xeth{} {}\n",
            sw, port, stage
        ),
    )?;

    check_contains(
        runner,
        sw,
        &mut recorder,
        outcome,
        config.hget_cli("media"),
        expect.media,
        format!(
            "On switch {} interface media is not set to {} for the interface xeth{} {}\n",
            sw, expect.media, port, stage
        ),
    )?;

    check_contains(
        runner,
        sw,
        &mut recorder,
        outcome,
        config.ethtool_cli(),
        &expect.autoneg_line(),
        format!(
            "Autoneg for xeth {} is not set to {} {}.\n",
            port, expect.autoneg, stage
        ),
    )?;

    Ok(recorder)
}

/// Module verifying the link parameters of one port
pub struct PortParamsModule;

impl Module for PortParamsModule {
    fn name(&self) -> &'static str {
        "test_port_params"
    }

    fn description(&self) -> &'static str {
        "Verify speed, fec, link, media and autoneg settings of a port"
    }

    fn required_params(&self) -> &[&'static str] {
        &["port", "hash_name", "log_dir_path"]
    }

    fn execute(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let config = PortParamsConfig::from_params(params)?;
        let mut outcome = TestOutcome::new();

        let recorder = test_port_parameters(context.runner.as_ref(), &config, &mut outcome)?;

        let writer = LogWriter::new(
            log_file_path(&config.log_dir_path, &config.hash_name),
            config.log_mode,
        );
        complete_run(self.name(), recorder, &outcome, &writer)
    }
}
