//! Task instrumentation.

use std::time::Duration;

use crate::observability::metrics;

/// Called around every dispatched task.
pub trait TaskHook: Send + Sync {
    fn task_started(&self, field: &str);
    fn task_finished(&self, field: &str, elapsed: Duration, failed: bool);
}

/// Logs task timings and records them as metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHook;

impl TaskHook for TracingHook {
    fn task_started(&self, field: &str) {
        tracing::debug!(field, "Task started");
    }

    fn task_finished(&self, field: &str, elapsed: Duration, failed: bool) {
        tracing::debug!(
            field,
            elapsed_ms = elapsed.as_millis() as u64,
            failed,
            "Task finished"
        );
        metrics::record_task(field, elapsed, failed);
    }
}
