//! Jointly Core Library
//!
//! This is the core library of the Jointly task runner. It launches a set of
//! processes concurrently, holds back the ones that depend on others until
//! their dependencies are fulfilled, prefixes every output line with the
//! task's label, and tears the whole run down when any task fails.
//!
//! ## Architecture
//!
//! - [`task_manager`] - High-level interface: load a tasks file, plan, run
//! - [`execution`] - Process supervision, output prefixing and the wave runner
//! - [`task_execution`] - Execution planning without spawning anything
//! - [`tasks`] - Task descriptions, fulfillment and failure policies, labels
//! - [`configs`] - YAML tasks file parsing
//! - [`output`] - Output sinks shared by all running tasks
//! - [`results`] - Run outcome and plan types
//! - [`types`] - Common error types and type aliases
//!
//! ## Usage
//!
//! Tasks can be built in code and handed to a [`TaskRunner`]:
//!
//! ```rust,no_run
//! use jointly_core::tasks::{ResolveAfter, Task};
//! use jointly_core::{TaskRunner, TaskRunnerConfig};
//!
//! # async fn example() -> jointly_core::JointlyResult<()> {
//! let tasks = vec![
//!     Task::new("tsc").with_key("build").with_resolve_after(ResolveAfter::Exit),
//!     Task::new("node").with_args(["dist/server.js"]).with_dependencies(["build"]),
//! ];
//!
//! TaskRunner::new(TaskRunnerConfig::default())
//!     .run(tasks)
//!     .await?
//!     .into_result()?;
//! # Ok(())
//! # }
//! ```

pub mod configs;
pub mod execution;
pub mod output;
pub mod results;
pub mod task_execution;
pub mod task_manager;
pub mod tasks;
pub mod types;

// Re-export the main types for easier usage
pub use execution::runner::{TaskRunner, TaskRunnerConfig};
pub use results::{ExecutionPlan, RunOutcome};
pub use task_manager::{TaskManager, TaskManagerConfig};
pub use tasks::Task;
pub use types::{JointlyError, JointlyResult};
