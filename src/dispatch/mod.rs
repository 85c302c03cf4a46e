//! Task dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! RequestContext + Vec<TaskDescriptor>
//!     → dispatcher.rs plan (registry lookups, field uniqueness)
//!     → dispatcher.rs run (join_all, one future per task)
//!         clone connection → path/timeout → cache port → transform
//!     → hook.rs (start/finish instrumentation)
//!     → Vec<TaskResult> (payload or placeholder per field)
//! ```

pub mod dispatcher;
pub mod hook;
pub mod task;

pub use dispatcher::{DispatchError, TaskDispatcher, TaskError};
pub use hook::{TaskHook, TracingHook};
pub use task::{TaskDescriptor, TaskOutcome, TaskResult, Transform};
