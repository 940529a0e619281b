//! Environment variable constants read by the hooks.
//!
//! Centralized so the Maven installation lookup order stays visible in one
//! place and no variable name is hardcoded at a call site.

/// Maven installation directory, checked after the configured home
pub const MAVEN_HOME: &str = "MAVEN_HOME";

/// Legacy Maven installation directory, checked last
pub const M2_HOME: &str = "M2_HOME";

/// Extra JVM options handed to a nested Maven build
pub const MAVEN_OPTS: &str = "MAVEN_OPTS";
