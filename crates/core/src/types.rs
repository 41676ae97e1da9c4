use thiserror::Error;

/// The main error type for Jointly operations
#[derive(Debug, Error)]
pub enum JointlyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cyclic dependency among tasks: {}", describe_cycles(.pending, .cycles))]
    CyclicDependency {
        /// Labels of every task that could not be placed in a wave
        pending: Vec<String>,
        /// Strongly connected components among the pending tasks
        cycles: Vec<Vec<String>>,
    },

    #[error("Task '{label}' failed to start: {source}")]
    Spawn {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Task '{label}' failed with exit code {}", display_code(.code))]
    ProcessExit { label: String, code: Option<i32> },

    #[error("Task '{label}' predicate failed: {message}")]
    Predicate { label: String, message: String },

    #[error("Task '{label}' exited with code {} before it was fulfilled", display_code(.code))]
    NeverFulfilled { label: String, code: Option<i32> },
}

impl JointlyError {
    /// Label of the task that caused the error, if the error is task-specific
    pub fn task_label(&self) -> Option<&str> {
        match self {
            JointlyError::Spawn { label, .. }
            | JointlyError::ProcessExit { label, .. }
            | JointlyError::Predicate { label, .. }
            | JointlyError::NeverFulfilled { label, .. } => Some(label),
            _ => None,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

fn describe_cycles(pending: &[String], cycles: &[Vec<String>]) -> String {
    if cycles.is_empty() {
        return format!("unresolvable tasks {}", pending.join(", "));
    }
    cycles
        .iter()
        .map(|cycle| {
            let mut path = cycle.clone();
            if let Some(first) = path.first().cloned() {
                path.push(first);
            }
            path.join(" -> ")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for Jointly operations
pub type JointlyResult<T> = Result<T, JointlyError>;
