//! Result types for run operations
//!
//! This module contains the result types returned by the runner and the
//! planner, providing a centralized location for output structures.

use colored::Color;

use crate::types::{JointlyError, JointlyResult};

/// Terminal outcome of a run
#[derive(Debug)]
pub enum RunOutcome {
    /// Every task fulfilled and exited without a failure
    Succeeded,
    /// The first failure, which triggered the teardown of every other task
    Failed(JointlyError),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }

    pub fn into_result(self) -> JointlyResult<()> {
        match self {
            RunOutcome::Succeeded => Ok(()),
            RunOutcome::Failed(err) => Err(err),
        }
    }
}

/// A task as it will be launched
#[derive(Debug, Clone)]
pub struct PlannedTask {
    pub label: String,
    pub command_line: String,
    pub dependencies: Vec<String>,
    pub color: Option<Color>,
}

/// Waves in launch order, without spawning anything
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub waves: Vec<Vec<PlannedTask>>,
}

impl ExecutionPlan {
    pub fn task_count(&self) -> usize {
        self.waves.iter().map(Vec::len).sum()
    }
}
