use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use replaunch::launch::classpath;
use replaunch::{
    AttachOptions, CommandLauncher, LaunchAckCoordinator, LaunchOutcome, LaunchRequest,
    NoopRefresher, TcpConnector, session::TracingConsole,
};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Runtime executable to launch.
    pub program: PathBuf,

    /// Working directory for the runtime.
    #[arg(long)]
    pub working_dir: Option<PathBuf>,

    /// Source file loaded into the runtime at startup. Repeatable.
    #[arg(long = "load", value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Classpath entry. Repeatable.
    #[arg(long = "classpath", value_name = "ENTRY")]
    pub classpath: Vec<PathBuf>,

    /// Source directory moved to the front of the classpath. Repeatable.
    #[arg(long = "source-path", value_name = "DIR")]
    pub source_paths: Vec<PathBuf>,

    /// Extra environment variable, KEY=VALUE. Repeatable.
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_var)]
    pub env: Vec<(String, String)>,

    /// Bundled REPL server library, appended to the classpath unless the
    /// project already provides a server.
    #[arg(long, value_name = "LIB")]
    pub repl_server_lib: Option<PathBuf>,

    /// The project ships its own REPL server; do not append the bundled
    /// library.
    #[arg(long)]
    pub project_provides_repl_server: bool,

    /// Launch fire-and-forget instead of attaching a REPL session.
    #[arg(long)]
    pub no_repl: bool,

    /// Refresh the workspace before attaching (overrides config).
    #[arg(long)]
    pub auto_reload: bool,

    /// Namespace to start the session in (overrides config).
    #[arg(long)]
    pub namespace: Option<String>,

    /// Ack timeout in seconds (overrides config).
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Treat the invocation as a project tool (`lein`-style): file loads
    /// are spliced into the tool's own argument list.
    #[arg(long)]
    pub project_tool: bool,

    /// Arguments passed through to the runtime, after `--`.
    #[arg(last = true)]
    pub runtime_args: Vec<String>,
}

fn parse_env_var(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))
}

pub async fn execute(args: RunArgs, config: &crate::config::LauncherConfig) -> anyhow::Result<()> {
    let mut classpath = classpath::with_source_paths(args.classpath, &args.source_paths);
    if let Some(lib) = &args.repl_server_lib {
        classpath =
            classpath::ensure_repl_server(classpath, lib, args.project_provides_repl_server)?;
    }

    let request = LaunchRequest::new(&args.program)
        .with_user_args(args.runtime_args)
        .with_env(args.env)
        .with_classpath(classpath)
        .with_files_to_load(args.files)
        .with_attach_repl(!args.no_repl)
        .with_auto_reload(args.auto_reload || config.auto_reload)
        .with_initial_namespace(
            args.namespace
                .clone()
                .unwrap_or_else(|| config.initial_namespace.clone()),
        )
        .with_project_tool(args.project_tool);
    let request = match &args.working_dir {
        Some(dir) => request.with_working_dir(dir),
        None => request,
    };

    let console = Arc::new(TracingConsole::new("replaunch"));
    let coordinator = LaunchAckCoordinator::new(
        Arc::new(CommandLauncher::with_console(console.clone())),
        Arc::new(TcpConnector::new()),
        Arc::new(NoopRefresher),
    )
    .with_refresh_bound(Duration::from_millis(config.refresh_timeout_ms));

    let launch_id = request.launch_id.clone();
    let handle = coordinator.start(request).await?;
    tracing::info!(launch_id = %launch_id, pid = handle.pid(), "runtime started");

    if args.no_repl {
        println!("started {} (pid {:?})", args.program.display(), handle.pid());
        return Ok(());
    }

    // Ctrl-C cancels the wait and terminates the runtime.
    let cancel = handle.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling launch");
            cancel.cancel();
        }
    });

    let timeout = args
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_millis(config.ack_timeout_ms));
    let options = AttachOptions {
        console,
        activate: config.activate_console,
        initial_namespace: Some(
            args.namespace
                .unwrap_or_else(|| config.initial_namespace.clone()),
        ),
    };

    match coordinator.wait(handle, timeout, options).await {
        LaunchOutcome::Connected(session) => {
            println!("REPL ready at {}", session.endpoint());
            Ok(())
        }
        LaunchOutcome::TimedOut => {
            anyhow::bail!("timed out waiting for the runtime to ack; runtime terminated")
        }
        LaunchOutcome::Cancelled => anyhow::bail!("launch cancelled; runtime terminated"),
        LaunchOutcome::Failed(e) => {
            eprintln!("could not attach a session; the runtime is still running");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_var() {
        assert_eq!(
            parse_env_var("FOO=bar").unwrap(),
            ("FOO".to_string(), "bar".to_string())
        );
        assert_eq!(
            parse_env_var("FOO=a=b").unwrap(),
            ("FOO".to_string(), "a=b".to_string())
        );
        assert!(parse_env_var("FOO").is_err());
    }
}
