//! Task execution module
//!
//! This module handles process spawning and supervision, output prefixing,
//! dependency grouping and the wave-by-wave runner built on top of them.

pub mod command;
pub mod dependencies;
pub mod launcher;
pub mod prefixer;
pub mod runner;

pub use dependencies::group_tasks;
pub use launcher::{launch_task, LaunchedTask, TaskEvent, TaskEventKind};
pub use prefixer::{strip_escape_codes, LinePrefixer};
pub use runner::{TaskRunner, TaskRunnerConfig};
