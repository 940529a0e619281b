//! Maven hook: drives a nested Maven build for each unmapped context entry

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::{ExecutionContext, StepData};
use crate::error::{HookError, HookResult};
use crate::hook::Hook;
use crate::invoker::{InvocationRequest, Invoker, MVN_BIN, ProcessInvoker};

/// Switches copied from the ambient build configuration into every nested
/// invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MavenSettings {
    /// Run nested builds without network access
    #[serde(default)]
    pub offline: bool,
    /// Let nested builds prompt on the console; batch mode otherwise
    #[serde(default)]
    pub interactive: bool,
}

/// Goals, profiles and options classified out of one raw context entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationSpec {
    pub goals: Vec<String>,
    pub profiles: Vec<String>,
    pub options: Vec<String>,
}

impl InvocationSpec {
    /// Tokenize a raw entry on single spaces and classify each token.
    ///
    /// `-P` and `--activate-profiles` consume the following token as a
    /// profile name, `-D...` tokens are options, everything else is a goal.
    pub fn parse(entry: &str) -> HookResult<Self> {
        let mut spec = InvocationSpec::default();
        let mut tokens = entry.split(' ');
        while let Some(token) = tokens.next() {
            if token == "-P" || token == "--activate-profiles" {
                let profile = tokens.next().ok_or_else(|| {
                    HookError::failure(format!(
                        "Missing profile name after '{token}' in Maven call '{entry}'"
                    ))
                })?;
                spec.profiles.push(profile.to_string());
            } else if token.starts_with("-D") {
                spec.options.push(token.to_string());
            } else {
                spec.goals.push(token.to_string());
            }
        }
        Ok(spec)
    }
}

/// Invokes a separate Maven build process for each unmapped context value.
///
/// The POM of the project under build, the offline/interactive switches and
/// an optionally configured Maven home are injected at construction. When
/// the configured home does not point at a Maven installation, `MAVEN_HOME`
/// and then `M2_HOME` are consulted; without any valid home the invoker's
/// own default (`mvn` on the PATH) is left in place.
pub struct MavenHook {
    pom_path: Option<PathBuf>,
    settings: MavenSettings,
    maven_home: Option<PathBuf>,
    invoker: Box<dyn Invoker>,
}

impl MavenHook {
    pub fn new(
        pom_path: Option<PathBuf>,
        settings: MavenSettings,
        maven_home: Option<PathBuf>,
    ) -> Self {
        Self::with_invoker(pom_path, settings, maven_home, Box::new(ProcessInvoker))
    }

    /// Same as [`MavenHook::new`] with a caller-supplied invoker.
    pub fn with_invoker(
        pom_path: Option<PathBuf>,
        settings: MavenSettings,
        maven_home: Option<PathBuf>,
        invoker: Box<dyn Invoker>,
    ) -> Self {
        Self {
            pom_path,
            settings,
            maven_home,
            invoker,
        }
    }

    async fn run_all(&self, step_id: &str, channel: &StepData, rollback: bool) -> HookResult<()> {
        for entry in &channel.unmapped {
            self.invoke_one(step_id, entry, rollback).await?;
        }
        Ok(())
    }

    async fn invoke_one(&self, step_id: &str, entry: &str, rollback: bool) -> HookResult<()> {
        let spec = InvocationSpec::parse(entry)?;

        info!(
            "{} hook '{}' with the following setup:",
            if rollback { "Rolling back" } else { "Executing" },
            step_id
        );
        info!("\t\tGOALS: {}", spec.goals.join(" "));
        info!("\t\tOPTIONS: {}", spec.options.join(" "));
        info!("\t\tPROFILES: {}", spec.profiles.join(" "));

        let request = InvocationRequest {
            pom_path: self.pom_path.clone(),
            goals: spec.goals,
            profiles: spec.profiles,
            options: spec.options,
            offline: self.settings.offline,
            interactive: self.settings.interactive,
            maven_home: self.resolve_maven_home(),
        };

        match self.invoker.invoke(&request).await {
            Ok(outcome) if outcome.success() => Ok(()),
            Ok(outcome) => Err(HookError::failure(match outcome.error {
                Some(message) => format!("Error during execution of hook: {message}"),
                None => format!(
                    "Error during execution of hook: Maven exited with code {}",
                    outcome.exit_code
                ),
            })),
            // Invocation-level errors are recoverable, carrying their message.
            Err(e) => Err(HookError::failure(e.to_string())),
        }
    }

    /// First valid candidate wins: the configured home, then `MAVEN_HOME`,
    /// then `M2_HOME`. `None` leaves the invoker's default in place.
    fn resolve_maven_home(&self) -> Option<PathBuf> {
        let home = first_valid_home([
            self.maven_home.clone(),
            std::env::var_os(crate::env::MAVEN_HOME).map(PathBuf::from),
            std::env::var_os(crate::env::M2_HOME).map(PathBuf::from),
        ]);
        match &home {
            Some(path) => debug!("Using Maven home: {}", path.display()),
            None => debug!("No valid Maven home found, using the invoker default"),
        }
        home
    }
}

impl fmt::Debug for MavenHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MavenHook")
            .field("pom_path", &self.pom_path)
            .field("settings", &self.settings)
            .field("maven_home", &self.maven_home)
            .finish()
    }
}

fn first_valid_home(candidates: impl IntoIterator<Item = Option<PathBuf>>) -> Option<PathBuf> {
    candidates
        .into_iter()
        .flatten()
        .find(|path| is_valid_maven_home(path))
}

/// A valid Maven home is a directory containing the `bin/mvn` launcher.
fn is_valid_maven_home(path: &Path) -> bool {
    path.is_dir() && path.join("bin").join(MVN_BIN).is_file()
}

#[async_trait]
impl Hook for MavenHook {
    fn id(&self) -> &'static str {
        "mvn"
    }

    fn description(&self) -> &'static str {
        "Invokes a separate Maven build process during pipeline processing."
    }

    async fn execute(&self, context: &ExecutionContext) -> HookResult<()> {
        if !context.data().has_unmapped() {
            warn!(
                "No Maven goals to execute! Skipping the execution of hook '{}'.",
                context.step_id()
            );
            return Ok(());
        }
        self.run_all(context.step_id(), context.data(), false).await
    }

    async fn rollback(&self, context: &ExecutionContext) -> HookResult<()> {
        if !context.rollback_data().has_unmapped() {
            debug!(
                "No Maven goals to execute! Skipping the rollback of hook '{}'.",
                context.step_id()
            );
            return Ok(());
        }
        self.run_all(context.step_id(), context.rollback_data(), true).await
    }
}
