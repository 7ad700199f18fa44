//! Launch requests and the process-launch collaborator.
//!
//! [`LaunchRequest`] is the immutable description of what to start.
//! [`ProcessLauncher`] spawns it; the default [`CommandLauncher`] uses
//! `tokio::process` with piped stdio forwarded into `tracing`.

pub mod args;
pub mod classpath;
mod log_stream;
mod process;
mod spawn;
pub mod stats;

pub use process::{CommandLauncher, LaunchedProcess, ProcessLauncher, RuntimeProcess};

use std::path::PathBuf;

use replaunch_shared::constants::repl;
use serde::{Deserialize, Serialize};

/// Immutable description of a runtime launch.
///
/// Everything needed to start the process and decide what happens after:
/// the invocation itself, whether a REPL session should be attached once
/// the runtime acks, and whether the workspace is refreshed before the
/// attach.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LaunchRequest {
    /// Runtime executable.
    pub program: PathBuf,

    /// Arguments supplied by the user, appended after the generated ones.
    pub user_args: Vec<String>,

    /// Working directory for the spawned process.
    pub working_dir: Option<PathBuf>,

    /// Extra environment variables for the spawned process.
    pub env: Vec<(String, String)>,

    /// Entries the runtime resolves code through, already assembled
    /// (see [`classpath`]). Exported via the `CLASSPATH` variable.
    pub classpath: Vec<PathBuf>,

    /// Source files loaded into the runtime at startup.
    pub files_to_load: Vec<PathBuf>,

    /// Support script loaded before anything else (debug tooling).
    pub tooling_script: Option<PathBuf>,

    /// Attach an interactive session once the runtime acks.
    /// When false the process is launched fire-and-forget.
    pub attach_repl: bool,

    /// Refresh the workspace before attaching the session.
    pub auto_reload: bool,

    /// Namespace the attached session starts in.
    pub initial_namespace: String,

    /// The invocation is a project tool (`lein`-style) rather than a bare
    /// runtime; argument assembly splices file loads into the tool's own
    /// argument list instead of generating init expressions.
    pub project_tool: bool,

    /// Unique id of this launch, exported to the child environment.
    pub launch_id: String,
}

impl LaunchRequest {
    /// Create a request with defaults: attach a REPL, no auto-reload,
    /// start in the default namespace.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            user_args: Vec::new(),
            working_dir: None,
            env: Vec::new(),
            classpath: Vec::new(),
            files_to_load: Vec::new(),
            tooling_script: None,
            attach_repl: true,
            auto_reload: false,
            initial_namespace: repl::DEFAULT_NAMESPACE.to_string(),
            project_tool: false,
            launch_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_user_args(mut self, args: Vec<String>) -> Self {
        self.user_args = args;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    pub fn with_classpath(mut self, classpath: Vec<PathBuf>) -> Self {
        self.classpath = classpath;
        self
    }

    pub fn with_files_to_load(mut self, files: Vec<PathBuf>) -> Self {
        self.files_to_load = files;
        self
    }

    pub fn with_tooling_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.tooling_script = Some(script.into());
        self
    }

    pub fn with_attach_repl(mut self, attach: bool) -> Self {
        self.attach_repl = attach;
        self
    }

    pub fn with_auto_reload(mut self, auto_reload: bool) -> Self {
        self.auto_reload = auto_reload;
        self
    }

    pub fn with_initial_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.initial_namespace = namespace.into();
        self
    }

    pub fn with_project_tool(mut self, project_tool: bool) -> Self {
        self.project_tool = project_tool;
        self
    }

    /// Full argument list for the spawned process, including the
    /// generated REPL bootstrap arguments when a session will be
    /// attached.
    pub fn command_line(&self, ack_port: u16) -> Vec<String> {
        args::assemble(self, ack_port)
    }
}
