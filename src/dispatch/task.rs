//! Task descriptors and results.

use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

use crate::upstream::PayloadError;

/// Projects the field of interest out of an upstream body.
pub type Transform = Arc<dyn Fn(&Value) -> Result<Value, PayloadError> + Send + Sync>;

/// Payload reported for a failed field.
pub fn error_placeholder() -> Value {
    json!({ "msg": "error" })
}

/// A parameter that must be set before the task may call out.
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredParameter {
    pub name: String,
    /// Field value reported instead of calling the upstream.
    pub placeholder: Value,
}

/// One unit of work: fetch from a connection and project one response field.
#[derive(Clone)]
pub struct TaskDescriptor {
    pub field_name: String,
    pub connection: String,
    pub cache_profile: String,
    pub path_override: Option<String>,
    pub required_parameter: Option<RequiredParameter>,
    pub failure_placeholder: Value,
    pub transform: Transform,
}

impl TaskDescriptor {
    /// A task that passes the upstream body through unchanged.
    pub fn new(field_name: impl Into<String>, connection: impl Into<String>, cache_profile: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            connection: connection.into(),
            cache_profile: cache_profile.into(),
            path_override: None,
            required_parameter: None,
            failure_placeholder: error_placeholder(),
            transform: Arc::new(|body: &Value| Ok(body.clone())),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path_override = Some(path.into());
        self
    }

    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, PayloadError> + Send + Sync + 'static,
    {
        self.transform = Arc::new(transform);
        self
    }

    pub fn requiring_parameter(mut self, name: impl Into<String>, placeholder: Value) -> Self {
        self.required_parameter = Some(RequiredParameter {
            name: name.into(),
            placeholder,
        });
        self
    }
}

impl fmt::Debug for TaskDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDescriptor")
            .field("field_name", &self.field_name)
            .field("connection", &self.connection)
            .field("cache_profile", &self.cache_profile)
            .field("path_override", &self.path_override)
            .field("required_parameter", &self.required_parameter)
            .finish_non_exhaustive()
    }
}

/// What a task produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Payload(Value),
    Failed { message: String, placeholder: Value },
}

/// The result of one task, keyed by its response field.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub field_name: String,
    pub outcome: TaskOutcome,
}

impl TaskResult {
    pub fn success(field_name: impl Into<String>, payload: Value) -> Self {
        Self {
            field_name: field_name.into(),
            outcome: TaskOutcome::Payload(payload),
        }
    }

    pub fn failed(field_name: impl Into<String>, message: impl Into<String>, placeholder: Value) -> Self {
        Self {
            field_name: field_name.into(),
            outcome: TaskOutcome::Failed {
                message: message.into(),
                placeholder,
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Failed { .. })
    }

    /// The value merged into the response: payload or placeholder.
    pub fn value(&self) -> &Value {
        match &self.outcome {
            TaskOutcome::Payload(value) => value,
            TaskOutcome::Failed { placeholder, .. } => placeholder,
        }
    }

    pub fn into_value(self) -> Value {
        match self.outcome {
            TaskOutcome::Payload(value) => value,
            TaskOutcome::Failed { placeholder, .. } => placeholder,
        }
    }
}
