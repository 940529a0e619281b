//! Built-in lifecycle hooks for Gantry pipelines.
//!
//! Gantry processes a pipeline of named steps; a step definition can point
//! at one of the hooks in this crate and feed it a key/value execution
//! context. When a later step fails, the host walks back over the steps
//! that already ran and invokes each hook's rollback side with a separate
//! rollback data channel. None of that orchestration lives here — every
//! hook is stateless, sequential glue around one external facility:
//!
//! - [`ExecHook`] runs commands as child processes
//! - [`HttpRequestHook`] issues a single HTTP request
//! - [`MavenHook`] drives a nested Maven build
//!
//! Errors follow a two-tier model: [`HookError::Failure`] for recoverable
//! conditions (non-zero exit code, non-2xx status, missing parameter) that
//! stop the pipeline and trigger rollback, and [`HookError::Unexpected`]
//! for lower-level errors kept with their cause.

pub mod context;
pub mod env;
pub mod error;
pub mod hook;
pub mod hooks;
pub mod invoker;

pub use context::{ExecutionContext, StepData};
pub use error::{HookError, HookResult};
pub use hook::Hook;
pub use hooks::{ExecHook, HttpRequestHook, MavenHook};
