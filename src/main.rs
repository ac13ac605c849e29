//! regtest - switch regression test modules
//!
//! Runs one test module and prints its result as a single JSON object on
//! stdout, as Ansible expects from a binary module. Diagnostics go to stderr.

mod cli;

use anyhow::{Context, Result};
use cli::{Cli, Commands};
use regtest::config::ModuleArgs;
use regtest::error::Error;
use regtest::modules::{ModuleContext, ModuleRegistry};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match run(&cli) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            println!(
                "{}",
                serde_json::json!({ "failed": true, "msg": format!("{:#}", e) })
            );
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // stdout carries the module result
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity >= 3),
        )
        .with(env_filter)
        .init();
}

fn run(cli: &Cli) -> Result<String> {
    let registry = ModuleRegistry::with_builtins();

    let (name, args) = match &cli.command {
        Some(Commands::List) => return list_modules(&registry),
        Some(Commands::Run(run)) => {
            let args = match &run.args {
                Some(path) => ModuleArgs::from_file(path)?,
                None => ModuleArgs::default(),
            };
            let args = args.with_overrides(&run.extra_args)?;
            (Some(run.name.clone()), args)
        }
        None => {
            let path = cli
                .args_file
                .as_ref()
                .context("no arguments file given, see --help")?;
            let args = ModuleArgs::from_file(path)?;
            let name = args
                .module
                .clone()
                .or_else(|| cli.module.clone())
                .or_else(|| invoked_as(&registry));
            (name, args)
        }
    };

    let name = name.ok_or(Error::ModuleNameMissing)?;
    debug!(module = %name, params = args.params.len(), "running module");

    let output = registry.execute(&name, &args.params, &ModuleContext::default())?;
    Ok(serde_json::to_string(&output)?)
}

/// Module named by the executable, for installs that link each module name
/// to this binary.
fn invoked_as(registry: &ModuleRegistry) -> Option<String> {
    let arg0 = std::env::args_os().next()?;
    let stem = Path::new(&arg0).file_stem()?.to_string_lossy().into_owned();
    registry.contains(&stem).then_some(stem)
}

fn list_modules(registry: &ModuleRegistry) -> Result<String> {
    let modules: serde_json::Map<String, serde_json::Value> = registry
        .names()
        .into_iter()
        .filter_map(|name| {
            registry
                .get(name)
                .map(|m| (name.to_string(), serde_json::Value::from(m.description())))
        })
        .collect();
    Ok(serde_json::to_string(&serde_json::json!({ "modules": modules }))?)
}
