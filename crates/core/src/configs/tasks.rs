use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::execution::command::parse_signal;
use crate::tasks::{ProcessOptions, RejectAfter, ResolveAfter, Shell, Task};
use crate::types::{JointlyError, JointlyResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ResolvePolicy {
    Start,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ResolveAfterConfig {
    Policy(ResolvePolicy),
    /// Fulfilled on the first output line matching the regular expression
    LineMatches {
        #[serde(rename = "lineMatches")]
        line_matches: String,
    },
}

impl Default for ResolveAfterConfig {
    fn default() -> Self {
        ResolveAfterConfig::Policy(ResolvePolicy::Start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum RejectPolicy {
    Auto,
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RejectAfterConfig {
    Policy(RejectPolicy),
    /// Failed iff the process exits with one of these codes
    ExitCodes {
        #[serde(rename = "exitCodes")]
        exit_codes: Vec<i32>,
    },
}

impl Default for RejectAfterConfig {
    fn default() -> Self {
        RejectAfterConfig::Policy(RejectPolicy::Auto)
    }
}

/// `true` for the platform shell, or the shell program to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ShellConfig {
    Enabled(bool),
    Program(String),
}

impl From<ShellConfig> for Shell {
    fn from(config: ShellConfig) -> Self {
        match config {
            ShellConfig::Enabled(false) => Shell::Disabled,
            ShellConfig::Enabled(true) => Shell::Platform,
            ShellConfig::Program(program) => Shell::Program(program),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskConfig {
    pub command: String,
    pub args: Option<Vec<String>>,
    pub key: Option<String>,
    pub label: Option<String>,
    pub dependencies: Option<Vec<String>>,
    pub resolve_after: Option<ResolveAfterConfig>,
    pub reject_after: Option<RejectAfterConfig>,
    pub cwd: Option<PathBuf>,
    pub env: Option<HashMap<String, String>>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub argv0: Option<String>,
    pub kill_signal: Option<String>,
    /// Milliseconds after which the kill signal is sent
    pub timeout: Option<u64>,
    pub shell: Option<ShellConfig>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TasksFileConfig {
    pub tasks: Vec<TaskConfig>,
}

impl TaskConfig {
    /// Convert into a runnable task, validating regexes and signal names
    pub fn into_task(self) -> JointlyResult<Task> {
        let display = self
            .label
            .clone()
            .or_else(|| self.key.clone())
            .unwrap_or_else(|| self.command.clone());

        let resolve_after = match self.resolve_after.unwrap_or_default() {
            ResolveAfterConfig::Policy(ResolvePolicy::Start) => ResolveAfter::Start,
            ResolveAfterConfig::Policy(ResolvePolicy::Exit) => ResolveAfter::Exit,
            ResolveAfterConfig::LineMatches { line_matches } => {
                let regex = Regex::new(&line_matches).map_err(|e| {
                    JointlyError::Config(format!(
                        "Task '{}' has an invalid lineMatches pattern: {}",
                        display, e
                    ))
                })?;
                ResolveAfter::predicate(move |line| Ok(regex.is_match(line)))
            }
        };

        let reject_after = match self.reject_after.unwrap_or_default() {
            RejectAfterConfig::Policy(RejectPolicy::Auto) => RejectAfter::Auto,
            RejectAfterConfig::Policy(RejectPolicy::Never) => RejectAfter::Never,
            RejectAfterConfig::ExitCodes { exit_codes } => {
                RejectAfter::predicate(move |code| Ok(exit_codes.contains(&code)))
            }
        };

        if let Some(signal) = &self.kill_signal {
            parse_signal(signal)
                .map_err(|e| JointlyError::Config(format!("Task '{}': {}", display, e)))?;
        }

        Ok(Task {
            key: self.key,
            label: self.label,
            command: self.command,
            args: self.args.unwrap_or_default(),
            dependencies: self.dependencies.unwrap_or_default(),
            resolve_after,
            reject_after,
            options: ProcessOptions {
                cwd: self.cwd,
                env: self.env.unwrap_or_default(),
                uid: self.uid,
                gid: self.gid,
                argv0: self.argv0,
                kill_signal: self.kill_signal,
                timeout: self.timeout.map(Duration::from_millis),
                shell: self.shell.map(Shell::from).unwrap_or_default(),
            },
        })
    }
}

impl TasksFileConfig {
    pub fn into_tasks(self) -> JointlyResult<Vec<Task>> {
        self.tasks.into_iter().map(TaskConfig::into_task).collect()
    }
}

pub fn parse_tasks_config(yaml_str: &str) -> JointlyResult<TasksFileConfig> {
    let config: TasksFileConfig = serde_yaml::from_str(yaml_str)?;
    Ok(config)
}
