//! High-level task runner
//!
//! This module sequences waves, launches each wave's tasks concurrently and
//! tears the whole run down on the first failure.

use std::sync::Arc;

use colored::Color;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::execution::dependencies::group_tasks;
use crate::execution::launcher::{launch_task, LaunchedTask, TaskEventKind};
use crate::output::{OutputConfig, SharedSink, StdoutSink};
use crate::results::RunOutcome;
use crate::tasks::{format_label, label_color, label_width, Task, DEFAULT_PALETTE};
use crate::types::{JointlyError, JointlyResult};

/// Configuration for the task runner
#[derive(Debug, Clone)]
pub struct TaskRunnerConfig {
    pub output: OutputConfig,
    /// Label colors, assigned cyclically in launch order
    pub palette: Vec<Color>,
}

impl Default for TaskRunnerConfig {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            palette: DEFAULT_PALETTE.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    /// Waves remain or launched tasks are still alive
    Running,
    /// A failure occurred; waiting for killed tasks to exit
    Draining,
    Succeeded,
    Failed,
}

/// Runs a set of tasks wave by wave
pub struct TaskRunner {
    config: TaskRunnerConfig,
    sink: SharedSink,
}

impl TaskRunner {
    pub fn new(config: TaskRunnerConfig) -> Self {
        let sink = Arc::new(StdoutSink::new(&config.output));
        Self { config, sink }
    }

    pub fn with_sink(config: TaskRunnerConfig, sink: SharedSink) -> Self {
        Self { config, sink }
    }

    /// Run every task to completion.
    ///
    /// Fails before anything is spawned if the tasks cannot be grouped.
    /// Otherwise waits until every launched process has exited and reports
    /// the first failure, if any.
    pub async fn run(&self, tasks: Vec<Task>) -> JointlyResult<RunOutcome> {
        let waves = group_tasks(&tasks)?;
        let width = label_width(tasks.iter().map(Task::label));
        let tasks: Vec<Arc<Task>> = tasks.into_iter().map(Arc::new).collect();

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut run = RunProgress::new(tasks.len());
        let mut waves = waves.into_iter().enumerate();

        loop {
            if run.state == RunState::Running && run.unfulfilled_in_wave == 0 {
                if let Some((wave_index, wave)) = waves.next() {
                    info!(wave = wave_index + 1, tasks = wave.len(), "launching wave");
                    for task_index in wave {
                        let task = Arc::clone(&tasks[task_index]);
                        let prefix = format_label(task.label(), width, self.color(run.launched.len()));
                        let launched = launch_task(
                            run.launched.len(),
                            prefix,
                            task,
                            Arc::clone(&self.sink),
                            events_tx.clone(),
                        );
                        run.track(launched);
                    }
                    continue;
                }
            }

            if run.alive == 0 {
                break;
            }

            let Some(event) = events_rx.recv().await else {
                break;
            };

            match event.kind {
                TaskEventKind::Fulfilled => run.fulfill(event.index),
                TaskEventKind::Failed(err) => run.fail(err),
                TaskEventKind::Exited(code) => run.exit(event.index, code),
            }
        }

        Ok(run.finish())
    }

    fn color(&self, launch_index: usize) -> Option<Color> {
        if !self.config.output.colorize {
            return None;
        }
        label_color(&self.config.palette, launch_index)
    }
}

/// Bookkeeping for one run; every launched task is tracked by launch index
struct RunProgress {
    state: RunState,
    launched: Vec<LaunchedTask>,
    fulfilled: Vec<bool>,
    exited: Vec<bool>,
    unfulfilled_in_wave: usize,
    alive: usize,
    failure: Option<JointlyError>,
}

impl RunProgress {
    fn new(capacity: usize) -> Self {
        Self {
            state: RunState::Running,
            launched: Vec::with_capacity(capacity),
            fulfilled: Vec::with_capacity(capacity),
            exited: Vec::with_capacity(capacity),
            unfulfilled_in_wave: 0,
            alive: 0,
            failure: None,
        }
    }

    fn track(&mut self, launched: LaunchedTask) {
        debug!(task = %launched.label, index = launched.index, "launched");
        self.launched.push(launched);
        self.fulfilled.push(false);
        self.exited.push(false);
        self.unfulfilled_in_wave += 1;
        self.alive += 1;
    }

    fn fulfill(&mut self, index: usize) {
        if self.fulfilled[index] {
            return;
        }
        self.fulfilled[index] = true;
        // Earlier waves are fully fulfilled, so this task is in the current one
        self.unfulfilled_in_wave = self.unfulfilled_in_wave.saturating_sub(1);
        debug!(task = %self.launched[index].label, "fulfilled");
    }

    fn exit(&mut self, index: usize, code: Option<i32>) {
        self.exited[index] = true;
        self.alive -= 1;
        debug!(task = %self.launched[index].label, ?code, alive = self.alive, "task exited");

        if !self.fulfilled[index] {
            let label = self.launched[index].label.clone();
            self.fail(JointlyError::NeverFulfilled { label, code });
        }
    }

    /// First failure wins and starts the cascade; later ones are only logged
    fn fail(&mut self, err: JointlyError) {
        if self.state != RunState::Running {
            debug!(error = %err, "ignoring failure while draining");
            return;
        }

        warn!(error = %err, "task failed, stopping all tasks");
        self.state = RunState::Draining;
        self.failure = Some(err);

        for (launched, exited) in self.launched.iter().zip(&self.exited) {
            if !exited {
                launched.kill();
            }
        }
    }

    fn finish(mut self) -> RunOutcome {
        let outcome = match self.failure.take() {
            Some(err) => {
                self.state = RunState::Failed;
                RunOutcome::Failed(err)
            }
            None => {
                self.state = RunState::Succeeded;
                RunOutcome::Succeeded
            }
        };
        info!(state = ?self.state, tasks = self.launched.len(), "run finished");
        outcome
    }
}
