//! High-level task management interface
//!
//! This module provides the [`TaskManager`] which serves as the primary
//! interface for frontends. It loads a tasks file once and exposes planning,
//! running and the config schema.
//!
//! ## Example
//!
//! ```rust,no_run
//! use jointly_core::task_manager::{TaskManager, TaskManagerConfig};
//! use std::path::PathBuf;
//!
//! # async fn example() -> jointly_core::types::JointlyResult<()> {
//! let manager = TaskManager::new(TaskManagerConfig {
//!     base_dir: PathBuf::from("."),
//!     config_path: None,
//!     runner: Default::default(),
//! })?;
//!
//! let plan = manager.get_execution_plan()?;
//! println!("{} waves", plan.waves.len());
//!
//! manager.run().await?.into_result()?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use crate::configs::{load_tasks_config, resolve_config_path, TasksFileConfig};
use crate::execution::runner::{TaskRunner, TaskRunnerConfig};
use crate::results::{ExecutionPlan, RunOutcome};
use crate::task_execution::resolve_execution_plan;
use crate::tasks::Task;
use crate::types::JointlyResult;

/// Configuration for initializing a task manager
#[derive(Debug, Clone)]
pub struct TaskManagerConfig {
    /// Directory config paths are resolved against
    pub base_dir: PathBuf,
    /// Explicit tasks file; the default names are probed when absent
    pub config_path: Option<PathBuf>,
    pub runner: TaskRunnerConfig,
}

/// Loaded tasks file plus the settings to run it with
pub struct TaskManager {
    pub config_path: PathBuf,
    pub tasks_config: TasksFileConfig,
    runner: TaskRunnerConfig,
}

impl TaskManager {
    pub fn new(config: TaskManagerConfig) -> JointlyResult<Self> {
        let config_path = resolve_config_path(&config.base_dir, config.config_path.as_deref())?;
        let tasks_config = load_tasks_config(&config_path)?;
        info!(
            path = %config_path.display(),
            tasks = tasks_config.tasks.len(),
            "loaded tasks config"
        );

        Ok(Self {
            config_path,
            tasks_config,
            runner: config.runner,
        })
    }

    /// Tasks ready to launch. Relative working directories are taken
    /// relative to the directory holding the tasks file.
    pub fn tasks(&self) -> JointlyResult<Vec<Task>> {
        let config_dir = self.config_path.parent().unwrap_or_else(|| Path::new("."));
        let mut tasks = self.tasks_config.clone().into_tasks()?;
        for task in &mut tasks {
            if let Some(cwd) = task.options.cwd.as_mut() {
                if cwd.is_relative() {
                    *cwd = config_dir.join(&*cwd);
                }
            }
        }
        Ok(tasks)
    }

    pub fn get_execution_plan(&self) -> JointlyResult<ExecutionPlan> {
        let palette = if self.runner.output.colorize {
            self.runner.palette.as_slice()
        } else {
            &[]
        };
        resolve_execution_plan(&self.tasks()?, palette)
    }

    pub async fn run(&self) -> JointlyResult<RunOutcome> {
        TaskRunner::new(self.runner.clone()).run(self.tasks()?).await
    }
}

/// JSON schema of the tasks file
pub fn tasks_config_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(TasksFileConfig)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::output::OutputConfig;

    fn manager_for(dir: &Path, yaml: &str, colorize: bool) -> TaskManager {
        fs::write(dir.join("jointly.yml"), yaml).unwrap();
        TaskManager::new(TaskManagerConfig {
            base_dir: dir.to_path_buf(),
            config_path: None,
            runner: TaskRunnerConfig {
                output: OutputConfig {
                    silent: true,
                    colorize,
                },
                ..TaskRunnerConfig::default()
            },
        })
        .unwrap()
    }

    #[test]
    fn test_relative_cwd_is_resolved_against_config_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = manager_for(
            temp_dir.path(),
            "tasks:\n  - command: ls\n    cwd: web\n  - command: pwd\n    cwd: /tmp\n",
            false,
        );

        let tasks = manager.tasks().unwrap();
        assert_eq!(tasks[0].options.cwd, Some(temp_dir.path().join("web")));
        assert_eq!(tasks[1].options.cwd, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_plan_has_no_colors_without_colorize() {
        let temp_dir = tempfile::tempdir().unwrap();
        let yaml = "tasks:\n  - command: tsc\n    key: build\n  - command: node\n    dependencies: [build]\n";

        let plain = manager_for(temp_dir.path(), yaml, false);
        let plan = plain.get_execution_plan().unwrap();
        assert_eq!(plan.waves.len(), 2);
        assert!(plan.waves.iter().flatten().all(|task| task.color.is_none()));

        let colored = manager_for(temp_dir.path(), yaml, true);
        let plan = colored.get_execution_plan().unwrap();
        assert!(plan.waves.iter().flatten().all(|task| task.color.is_some()));
    }

    #[test]
    fn test_missing_config_is_reported() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = TaskManager::new(TaskManagerConfig {
            base_dir: temp_dir.path().to_path_buf(),
            config_path: None,
            runner: TaskRunnerConfig::default(),
        });
        let err = result.err().unwrap();
        assert!(err.to_string().contains("jointly.yml"));
    }

    #[test]
    fn test_schema_describes_tasks() {
        let schema = tasks_config_schema();
        let text = schema.to_string();
        assert!(text.contains("resolveAfter"));
        assert!(text.contains("lineMatches"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_from_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = manager_for(
            temp_dir.path(),
            "tasks:\n  - command: sh\n    key: a\n    args: ['-c', 'exit 0']\n    resolveAfter: exit\n  - command: sh\n    args: ['-c', 'exit 7']\n    dependencies: [a]\n",
            false,
        );
        let outcome = manager.run().await.unwrap();
        assert!(matches!(
            outcome,
            RunOutcome::Failed(crate::types::JointlyError::ProcessExit { code: Some(7), .. })
        ));
    }
}
