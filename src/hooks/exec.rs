//! Command hook: runs each unmapped context entry as a child process

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::context::{ExecutionContext, StepData};
use crate::error::{HookError, HookResult};
use crate::hook::Hook;

/// Executes commands such as shell or batch scripts.
///
/// Each unmapped context value is one command: it is split on single spaces
/// into a program and its arguments and run as a child process with
/// inherited standard streams. Commands run sequentially in input order and
/// the first failing one aborts the rest. Quoting is not interpreted, so
/// arguments cannot themselves contain spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecHook;

impl ExecHook {
    pub fn new() -> Self {
        Self
    }

    async fn run_all(&self, step_id: &str, channel: &StepData, rollback: bool) -> HookResult<()> {
        info!(
            "{} hook '{}' with the following setup:",
            if rollback { "Rolling back" } else { "Executing" },
            step_id
        );
        for (i, entry) in channel.unmapped.iter().enumerate() {
            info!("\t\tCOMMAND {}: {}", i + 1, entry);
        }

        for entry in &channel.unmapped {
            run_command(entry).await?;
        }
        Ok(())
    }
}

/// Split one raw entry on single spaces into a program and its arguments.
///
/// Every entry names a program, possibly empty. Consecutive spaces produce
/// empty argument tokens; a malformed entry surfaces as the spawn error it
/// causes instead of being silently repaired.
fn split_command(entry: &str) -> (String, Vec<String>) {
    match entry.split_once(' ') {
        Some((program, rest)) => (
            program.to_string(),
            rest.split(' ').map(str::to_string).collect(),
        ),
        None => (entry.to_string(), Vec::new()),
    }
}

async fn run_command(entry: &str) -> HookResult<()> {
    let (program, args) = split_command(entry);
    debug!("Running command: {}", entry);

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| {
            HookError::unexpected(
                format!(
                    "An unexpected error was caught during the execution of a hook command: {e}"
                ),
                e,
            )
        })?;

    if !status.success() {
        let reason = match status.code() {
            Some(code) => format!("Return code was {code}"),
            None => "The process was terminated by a signal".to_string(),
        };
        return Err(HookError::failure(format!(
            "An error occurred during the execution of a hook command. {reason}"
        )));
    }
    Ok(())
}

#[async_trait]
impl Hook for ExecHook {
    fn id(&self) -> &'static str {
        "exec"
    }

    fn description(&self) -> &'static str {
        "Executes commands such as shell or batch scripts."
    }

    async fn execute(&self, context: &ExecutionContext) -> HookResult<()> {
        if !context.data().has_unmapped() {
            warn!(
                "No commands to execute! Skipping the execution of hook '{}'.",
                context.step_id()
            );
            return Ok(());
        }
        self.run_all(context.step_id(), context.data(), false).await
    }

    async fn rollback(&self, context: &ExecutionContext) -> HookResult<()> {
        if !context.rollback_data().has_unmapped() {
            debug!(
                "No commands to execute! Skipping the rollback of hook '{}'.",
                context.step_id()
            );
            return Ok(());
        }
        self.run_all(context.step_id(), context.rollback_data(), true).await
    }
}
