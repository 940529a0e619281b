//! Nested Maven invocation: the request model and a process-backed invoker

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::env;
use crate::error::{HookError, HookResult};

/// Name of the Maven launcher under `<home>/bin`
#[cfg(not(windows))]
pub(crate) const MVN_BIN: &str = "mvn";
#[cfg(windows)]
pub(crate) const MVN_BIN: &str = "mvn.cmd";

/// One nested Maven build, assembled fresh per hook invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationRequest {
    /// POM of the project the pipeline is operating on
    pub pom_path: Option<PathBuf>,
    /// Build goals, in input order
    pub goals: Vec<String>,
    /// Profiles activated with `-P`, in input order
    pub profiles: Vec<String>,
    /// `-D`-style options, exported to the build via `MAVEN_OPTS`
    pub options: Vec<String>,
    /// Run the nested build without network access
    pub offline: bool,
    /// Let Maven prompt; batch mode (`-B`) otherwise
    pub interactive: bool,
    /// Resolved Maven installation; `None` falls back to `mvn` on the PATH
    pub maven_home: Option<PathBuf>,
}

impl InvocationRequest {
    /// Maven command line for this request, without the launcher itself.
    pub fn command_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(pom) = &self.pom_path {
            args.push("-f".to_string());
            args.push(pom.display().to_string());
        }
        if self.offline {
            args.push("-o".to_string());
        }
        if !self.interactive {
            args.push("-B".to_string());
        }
        if !self.profiles.is_empty() {
            args.push("-P".to_string());
            args.push(self.profiles.join(","));
        }
        args.extend(self.goals.iter().cloned());
        args
    }

    /// Path of the launcher this request will run.
    pub fn launcher(&self) -> PathBuf {
        match &self.maven_home {
            Some(home) => home.join("bin").join(MVN_BIN),
            None => PathBuf::from(MVN_BIN),
        }
    }
}

/// Exit state of a nested Maven build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationOutcome {
    /// Exit code of the build process (`-1` when killed by a signal)
    pub exit_code: i32,
    /// Error reported by the invocation itself, if any
    pub error: Option<String>,
}

impl InvocationOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Seam for driving nested Maven builds, mockable in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Invoker: Send + Sync {
    /// Launch the build described by `request` and wait for it to finish.
    async fn invoke(&self, request: &InvocationRequest) -> HookResult<InvocationOutcome>;
}

/// Invoker that runs `mvn` as a child process with inherited standard
/// streams and shell environment, so the nested build logs straight into
/// the host pipeline's output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

#[async_trait]
impl Invoker for ProcessInvoker {
    async fn invoke(&self, request: &InvocationRequest) -> HookResult<InvocationOutcome> {
        let launcher = request.launcher();
        let args = request.command_args();
        debug!("Running Maven launcher: {} {}", launcher.display(), args.join(" "));

        let mut command = Command::new(&launcher);
        command
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if !request.options.is_empty() {
            command.env(env::MAVEN_OPTS, request.options.join(" "));
        }

        let status = command.status().await.map_err(|e| {
            HookError::unexpected(
                format!("Failed to run Maven launcher '{}': {}", launcher.display(), e),
                e,
            )
        })?;

        Ok(InvocationOutcome {
            exit_code: status.code().unwrap_or(-1),
            error: status
                .code()
                .is_none()
                .then(|| "The Maven process was terminated by a signal".to_string()),
        })
    }
}
