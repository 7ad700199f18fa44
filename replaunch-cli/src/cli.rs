use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands;
use crate::config::LauncherConfig;

#[derive(Parser, Debug)]
#[command(
    name = "replaunch",
    version,
    about = "Launch a REPL-capable runtime and attach a session once it acks"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalFlags {
    /// Path to the launcher config file (YAML). Defaults to
    /// `replaunch/config.yaml` in the platform config directory.
    #[arg(long, global = true, env = "REPLAUNCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter, same syntax as RUST_LOG.
    #[arg(long, global = true, env = "REPLAUNCH_LOG", default_value = "info")]
    pub log: String,
}

impl GlobalFlags {
    pub fn load_config(&self) -> anyhow::Result<LauncherConfig> {
        crate::config::load(self.config.as_deref())
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch a runtime process and attach a REPL session to it.
    Run(commands::run::RunArgs),
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.global.log))
        .with_writer(std::io::stderr)
        .init();

    let config = cli.global.load_config()?;

    match cli.command {
        Command::Run(args) => commands::run::execute(args, &config).await,
    }
}
