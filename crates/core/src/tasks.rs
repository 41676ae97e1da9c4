//! Task model and label color management
//!
//! A [`Task`] is one declared external command together with its dependency
//! keys and the policies deciding when it counts as fulfilled
//! ([`ResolveAfter`]) and when it counts as failed ([`RejectAfter`]).

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use colored::Color;

/// Signal sent to still-running tasks when the run is torn down
pub const DEFAULT_KILL_SIGNAL: &str = "SIGINT";

/// Label colors assigned cyclically in launch order
pub const DEFAULT_PALETTE: [Color; 6] = [
    Color::Blue,
    Color::Red,
    Color::Magenta,
    Color::Yellow,
    Color::Cyan,
    Color::Green,
];

/// Callback receiving a completed output line with escape codes stripped
pub type LinePredicate = Arc<dyn Fn(&str) -> anyhow::Result<bool> + Send + Sync>;

/// Callback receiving the exit code; returns `true` if the exit is a failure
pub type ExitCodePredicate = Arc<dyn Fn(i32) -> anyhow::Result<bool> + Send + Sync>;

/// Determines when a task is fulfilled and its dependents may start
#[derive(Clone, Default)]
pub enum ResolveAfter {
    /// Fulfilled as soon as the process has been spawned
    #[default]
    Start,
    /// Fulfilled when the process exits, whatever the exit code
    Exit,
    /// Fulfilled on the first output line the predicate accepts
    Predicate(LinePredicate),
}

impl ResolveAfter {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        ResolveAfter::Predicate(Arc::new(f))
    }
}

impl fmt::Debug for ResolveAfter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveAfter::Start => f.write_str("Start"),
            ResolveAfter::Exit => f.write_str("Exit"),
            ResolveAfter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Determines whether a task's exit fails the whole run
#[derive(Clone, Default)]
pub enum RejectAfter {
    /// Failed iff the exit code is present and non-zero
    #[default]
    Auto,
    /// Never failed
    Never,
    /// Failed iff the predicate returns `true`
    Predicate(ExitCodePredicate),
}

impl RejectAfter {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(i32) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        RejectAfter::Predicate(Arc::new(f))
    }

    /// Judge an exit. A signal-terminated process (no code) is passed to the
    /// predicate as 0.
    pub fn is_failure(&self, code: Option<i32>) -> anyhow::Result<bool> {
        match self {
            RejectAfter::Auto => Ok(matches!(code, Some(code) if code != 0)),
            RejectAfter::Never => Ok(false),
            RejectAfter::Predicate(predicate) => predicate(code.unwrap_or(0)),
        }
    }
}

impl fmt::Debug for RejectAfter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectAfter::Auto => f.write_str("Auto"),
            RejectAfter::Never => f.write_str("Never"),
            RejectAfter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Whether and through which shell the command line runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Shell {
    /// Spawn the command directly with its arguments
    #[default]
    Disabled,
    /// `sh -c` on unix, `cmd /C` on windows
    Platform,
    /// A shell program of choice, e.g. `/bin/bash` or `pwsh`
    Program(String),
}

/// Options forwarded untouched to the spawned process
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub argv0: Option<String>,
    pub kill_signal: Option<String>,
    pub timeout: Option<Duration>,
    pub shell: Shell,
}

/// One declared external command
#[derive(Debug, Clone)]
pub struct Task {
    pub key: Option<String>,
    pub label: Option<String>,
    pub command: String,
    pub args: Vec<String>,
    pub dependencies: Vec<String>,
    pub resolve_after: ResolveAfter,
    pub reject_after: RejectAfter,
    pub options: ProcessOptions,
}

impl Task {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            key: None,
            label: None,
            command: command.into(),
            args: Vec::new(),
            dependencies: Vec::new(),
            resolve_after: ResolveAfter::default(),
            reject_after: RejectAfter::default(),
            options: ProcessOptions::default(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_resolve_after(mut self, resolve_after: ResolveAfter) -> Self {
        self.resolve_after = resolve_after;
        self
    }

    pub fn with_reject_after(mut self, reject_after: RejectAfter) -> Self {
        self.reject_after = reject_after;
        self
    }

    pub fn with_options(mut self, options: ProcessOptions) -> Self {
        self.options = options;
        self
    }

    /// Display name: the label, else the key, else the command
    pub fn label(&self) -> &str {
        [self.label.as_deref(), self.key.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or(&self.command)
    }

    pub fn kill_signal(&self) -> &str {
        self.options
            .kill_signal
            .as_deref()
            .unwrap_or(DEFAULT_KILL_SIGNAL)
    }

    pub fn depends_on(&self, key: &str) -> bool {
        self.dependencies.iter().any(|dep| dep == key)
    }
}

/// Color for the task launched at `index` within a run
pub fn label_color(palette: &[Color], index: usize) -> Option<Color> {
    if palette.is_empty() {
        return None;
    }
    Some(palette[index % palette.len()])
}

/// Width every label is padded to so that prefixes line up in a column
pub fn label_width<'a>(labels: impl IntoIterator<Item = &'a str>) -> usize {
    labels
        .into_iter()
        .map(|label| label.chars().count())
        .max()
        .unwrap_or(0)
        + 2
}

/// Render a padded, optionally colored line prefix such as `build  |`
pub fn format_label(label: &str, width: usize, color: Option<Color>) -> String {
    let padded = format!("{:<width$}|", label, width = width);
    match color {
        Some(color) => format!("\x1b[{}m{}\x1b[0m", color.to_fg_str(), padded),
        None => padded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_fallbacks() {
        let task = Task::new("npm");
        assert_eq!(task.label(), "npm");

        let task = Task::new("npm").with_key("build");
        assert_eq!(task.label(), "build");

        let task = Task::new("npm").with_key("build").with_label("Build");
        assert_eq!(task.label(), "Build");

        let task = Task::new("npm").with_key("build").with_label("");
        assert_eq!(task.label(), "build");
    }

    #[test]
    fn test_reject_after_auto() {
        let policy = RejectAfter::Auto;
        assert!(!policy.is_failure(Some(0)).unwrap());
        assert!(!policy.is_failure(None).unwrap());
        assert!(policy.is_failure(Some(1)).unwrap());
        assert!(policy.is_failure(Some(-1)).unwrap());
    }

    #[test]
    fn test_reject_after_never() {
        let policy = RejectAfter::Never;
        assert!(!policy.is_failure(Some(2)).unwrap());
        assert!(!policy.is_failure(None).unwrap());
    }

    #[test]
    fn test_reject_after_predicate_sees_zero_for_signal_exit() {
        let policy = RejectAfter::predicate(|code| Ok(code == 0));
        assert!(policy.is_failure(None).unwrap());
        assert!(!policy.is_failure(Some(3)).unwrap());
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(label_color(&DEFAULT_PALETTE, 0), Some(Color::Blue));
        assert_eq!(label_color(&DEFAULT_PALETTE, 6), Some(Color::Blue));
        assert_eq!(label_color(&DEFAULT_PALETTE, 7), Some(Color::Red));
        assert_eq!(label_color(&[], 3), None);
    }

    #[test]
    fn test_format_label_pads_to_width() {
        let width = label_width(["a", "server"]);
        assert_eq!(width, 8);
        assert_eq!(format_label("a", width, None), "a       |");
        assert_eq!(format_label("server", width, None), "server  |");
        assert_eq!(
            format_label("a", 3, Some(Color::Blue)),
            "\x1b[34ma  |\x1b[0m"
        );
    }
}
