//! Concurrent, time-budgeted task dispatch.
//!
//! # Responsibilities
//! - Resolve every task's connection and cache profile before anything runs
//! - Run all tasks concurrently against one request context
//! - Bound each task by the request's remaining budget
//! - Turn any per-task failure into a placeholder result
//!
//! # Design Decisions
//! - Configuration faults (unknown connection/profile, duplicate field) fail
//!   the whole dispatch up front; nothing is half-run
//! - Tasks are joined futures on the caller's task, not spawned
//! - No shared mutable state between tasks: each owns a connection copy

use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::cache::CacheAccessPort;
use crate::connections::{CacheProfile, Connection, ConnectionRegistry, ParameterValue, RegistryError};
use crate::context::RequestContext;
use crate::dispatch::hook::TaskHook;
use crate::dispatch::task::{TaskDescriptor, TaskResult};
use crate::upstream::{Fetcher, PayloadError, UpstreamError};

/// Milliseconds reserved for the handler after upstream calls give up.
pub const DEFAULT_HEADROOM_MS: u64 = 500;

/// Grace beyond the budget before an unresponsive cache lookup is abandoned.
/// The fetch itself is bounded by the budget inside the cache.
const LOOKUP_SLACK: Duration = Duration::from_millis(100);

/// Faults that stop a dispatch before any task runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("configuration error: {0}")]
    Configuration(#[from] RegistryError),

    #[error("duplicate task field '{0}'")]
    DuplicateField(String),
}

/// Failure inside a single task. Never leaves the task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// A task with its connection copy and profile already resolved.
struct PlannedTask {
    descriptor: TaskDescriptor,
    connection: Connection,
    profile: CacheProfile,
}

/// Runs a request's task set.
pub struct TaskDispatcher {
    registry: Arc<ConnectionRegistry>,
    cache: Arc<dyn CacheAccessPort>,
    fetcher: Arc<dyn Fetcher>,
    hook: Arc<dyn TaskHook>,
    headroom_ms: u64,
}

impl TaskDispatcher {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        cache: Arc<dyn CacheAccessPort>,
        fetcher: Arc<dyn Fetcher>,
        hook: Arc<dyn TaskHook>,
    ) -> Self {
        Self {
            registry,
            cache,
            fetcher,
            hook,
            headroom_ms: DEFAULT_HEADROOM_MS,
        }
    }

    pub fn with_headroom_ms(mut self, headroom_ms: u64) -> Self {
        self.headroom_ms = headroom_ms;
        self
    }

    pub fn headroom_ms(&self) -> u64 {
        self.headroom_ms
    }

    /// Run every task to completion and return one result per task.
    ///
    /// Results are in descriptor order, though callers should merge them by
    /// field name.
    pub async fn dispatch(
        &self,
        ctx: &RequestContext,
        tasks: Vec<TaskDescriptor>,
    ) -> Result<Vec<TaskResult>, DispatchError> {
        let planned = self.plan(tasks)?;
        tracing::debug!(tasks = planned.len(), route = %ctx.route(), "Dispatching tasks");

        let results = join_all(planned.into_iter().map(|task| self.run(ctx, task))).await;
        Ok(results)
    }

    fn plan(&self, tasks: Vec<TaskDescriptor>) -> Result<Vec<PlannedTask>, DispatchError> {
        let mut fields = HashSet::with_capacity(tasks.len());
        let mut planned = Vec::with_capacity(tasks.len());

        for descriptor in tasks {
            if !fields.insert(descriptor.field_name.clone()) {
                return Err(DispatchError::DuplicateField(descriptor.field_name));
            }
            let connection = self.registry.get(&descriptor.connection)?;
            let profile = self
                .registry
                .cache_profile(&descriptor.connection, &descriptor.cache_profile)?
                .clone();
            planned.push(PlannedTask {
                descriptor,
                connection,
                profile,
            });
        }

        Ok(planned)
    }

    async fn run(&self, ctx: &RequestContext, task: PlannedTask) -> TaskResult {
        let field = task.descriptor.field_name.clone();
        let placeholder = task.descriptor.failure_placeholder.clone();

        self.hook.task_started(&field);
        let started = Instant::now();

        let result = match self.execute(ctx, task).await {
            Ok(value) => TaskResult::success(field.as_str(), value),
            Err(err) => {
                let client = ctx.client();
                tracing::error!(
                    field = %field,
                    error = %err,
                    client_ip = %client.ip(),
                    route = %ctx.route(),
                    "Task failed, reporting placeholder"
                );
                TaskResult::failed(field.as_str(), err.to_string(), placeholder)
            }
        };

        self.hook.task_finished(&field, started.elapsed(), result.is_failed());
        result
    }

    async fn execute(&self, ctx: &RequestContext, task: PlannedTask) -> Result<serde_json::Value, TaskError> {
        let PlannedTask {
            descriptor,
            mut connection,
            profile,
        } = task;

        if let Some(path) = &descriptor.path_override {
            connection.set_path(path.clone());
        }
        let budget = Duration::from_millis(ctx.budget(self.headroom_ms));
        connection.set_timeout(budget);

        if let Some(required) = &descriptor.required_parameter {
            let blank = connection
                .parameter(&required.name)
                .map(ParameterValue::is_blank)
                .unwrap_or(true);
            if blank {
                tracing::warn!(
                    field = %descriptor.field_name,
                    connection = %connection.name(),
                    parameter = %required.name,
                    "Required parameter not set, skipping upstream call"
                );
                return Ok(required.placeholder.clone());
            }
        }

        let lookup = self.cache.get_data(&profile, self.fetcher.as_ref(), &connection, None);
        let backstop = budget + LOOKUP_SLACK;
        let cached = tokio::time::timeout(backstop, lookup)
            .await
            .map_err(|_| UpstreamError::Timeout {
                connection: connection.name().to_string(),
                after: backstop,
            })??;

        tracing::debug!(
            field = %descriptor.field_name,
            profile = %profile.label(),
            cache = cached.status().as_str(),
            "Upstream data ready"
        );

        let body = cached.json()?;
        Ok((descriptor.transform)(&body)?)
    }
}
