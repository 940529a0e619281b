//! The contract between the host pipeline and a hook

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::HookResult;

/// A pluggable unit of work the host pipeline invokes at a named step.
///
/// The pipeline awaits each action to completion before moving on; no
/// timeout is applied. `execute` runs on the forward pass. When a later
/// step fails, the host walks back over the steps that already ran and
/// calls `rollback` with the same context — a hook's rollback action must
/// read the rollback channel, never the forward one.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Identifier the host uses to select this hook in step definitions.
    fn id(&self) -> &'static str;

    /// One-line description for pipeline listings.
    fn description(&self) -> &'static str;

    /// Run the forward action for one pipeline-step invocation.
    async fn execute(&self, context: &ExecutionContext) -> HookResult<()>;

    /// Compensate a previously executed step. Defaults to a no-op for hooks
    /// whose work needs no undoing.
    async fn rollback(&self, _context: &ExecutionContext) -> HookResult<()> {
        Ok(())
    }
}
