//! Shared output sink for prefixed task output
//!
//! Every task writes complete lines into one sink. Each call to
//! [`OutputSink::write`] carries a whole line and must be written atomically
//! so lines from concurrently running tasks never interleave mid-line.

use std::io::Write;
use std::sync::{Arc, Mutex};

/// Explicit output settings threaded into the runner and sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Suppress all task output
    pub silent: bool,
    /// Color the label prefixes
    pub colorize: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            silent: false,
            colorize: true,
        }
    }
}

pub trait OutputSink: Send + Sync {
    fn write(&self, text: &str);
}

pub type SharedSink = Arc<dyn OutputSink>;

/// Writes to the process stdout, one locked write per line
#[derive(Debug, Default)]
pub struct StdoutSink {
    silent: bool,
}

impl StdoutSink {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            silent: config.silent,
        }
    }
}

impl OutputSink for StdoutSink {
    fn write(&self, text: &str) {
        if self.silent {
            return;
        }
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not take the run down with it
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

/// Collects output in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    buffer: Mutex<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.buffer
            .lock()
            .map(|buffer| buffer.clone())
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl OutputSink for MemorySink {
    fn write(&self, text: &str) {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.push_str(text);
        }
    }
}
