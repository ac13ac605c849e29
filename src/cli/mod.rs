//! CLI for regtest
//!
//! Two ways in: Ansible runs the binary with the path of an arguments file
//! as the only argument; a person runs `regtest run <module>` and passes
//! parameters with `-e key=value`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Switch regression test modules
#[derive(Parser, Debug, Clone)]
#[command(name = "regtest")]
#[command(author = "Regtest Contributors")]
#[command(version)]
#[command(about = "Switch regression test modules", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Arguments file written by Ansible
    pub args_file: Option<PathBuf>,

    /// Module to run when the arguments do not name one
    #[arg(short = 'm', long, global = true, env = "REGTEST_MODULE")]
    pub module: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a test module
    Run(RunArgs),

    /// List available test modules
    List,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Name of the test module
    pub name: String,

    /// Arguments file (JSON or key=value)
    #[arg(short = 'a', long = "args")]
    pub args: Option<PathBuf>,

    /// Module parameters (key=value), applied after the arguments file
    #[arg(short = 'e', long = "extra-args", action = clap::ArgAction::Append)]
    pub extra_args: Vec<String>,
}
