//! Built-in hooks shipped with the crate.
//!
//! Every hook satisfies the same contract (`crate::hook::Hook`): an
//! `execute` action for the forward pipeline pass and a `rollback` action
//! fed by a separate data channel. The hooks are independent of each other
//! and hold no state between invocations; the host selects them by id:
//!
//! - `exec` runs each unmapped context value as a command
//! - `http-request` issues one HTTP request built from mapped values
//! - `mvn` drives one nested Maven build per unmapped value

mod exec;
mod http;
mod maven;

pub use exec::ExecHook;
pub use http::{HttpMethod, HttpRequestHook, RequestSpec};
pub use maven::{InvocationSpec, MavenHook, MavenSettings};
