//! Per-invocation execution context handed to a hook by the host pipeline

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One channel's worth of hook input: named parameters plus an ordered list
/// of raw string parameters.
///
/// Which side a hook reads is up to the hook: the command hooks consume the
/// unmapped list (one command per entry), the HTTP hook consumes the mapped
/// parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepData {
    /// Named key/value parameters
    #[serde(default)]
    pub mapped: HashMap<String, String>,
    /// Unkeyed raw string parameters, in input order
    #[serde(default)]
    pub unmapped: Vec<String>,
}

impl StepData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named parameter (chainable).
    pub fn with_mapped(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.mapped.insert(key.into(), value.into());
        self
    }

    /// Append an unkeyed parameter (chainable).
    pub fn with_unmapped(mut self, value: impl Into<String>) -> Self {
        self.unmapped.push(value.into());
        self
    }

    /// Look up a named parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.mapped.get(key).map(String::as_str)
    }

    pub fn has_mapped(&self) -> bool {
        !self.mapped.is_empty()
    }

    pub fn has_unmapped(&self) -> bool {
        !self.unmapped.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.mapped.is_empty() && self.unmapped.is_empty()
    }
}

/// Context for one pipeline-step invocation.
///
/// Built fresh by the host for every invocation and dropped afterwards;
/// hooks only read from it. The forward channel feeds `execute`, the
/// rollback channel feeds `rollback` — the two never mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    step_id: String,
    #[serde(default)]
    data: StepData,
    #[serde(default)]
    rollback_data: StepData,
}

impl ExecutionContext {
    pub fn new(step_id: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            data: StepData::default(),
            rollback_data: StepData::default(),
        }
    }

    /// Set the forward data channel (chainable).
    pub fn with_data(mut self, data: StepData) -> Self {
        self.data = data;
        self
    }

    /// Set the rollback data channel (chainable).
    pub fn with_rollback_data(mut self, data: StepData) -> Self {
        self.rollback_data = data;
        self
    }

    /// Composite id of the pipeline step this invocation belongs to.
    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    /// Data channel consumed by `execute`.
    pub fn data(&self) -> &StepData {
        &self.data
    }

    /// Data channel consumed by `rollback`.
    pub fn rollback_data(&self) -> &StepData {
        &self.rollback_data
    }
}
