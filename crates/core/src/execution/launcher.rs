//! Launching and supervising a single task
//!
//! [`launch_task`] spawns the task's process and a supervisor that routes both
//! output channels through one [`LinePrefixer`] and reports the task's
//! fulfillment, failure and exit as [`TaskEvent`]s.

use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::execution::command::{build_command, send_signal};
use crate::execution::prefixer::{strip_escape_codes, LinePrefixer};
use crate::output::SharedSink;
use crate::tasks::{ResolveAfter, Task};
use crate::types::JointlyError;

/// How long pipes are still read after the process exited. Orphaned
/// grandchildren may hold them open indefinitely.
const EXIT_DRAIN_GRACE: Duration = Duration::from_millis(250);

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Far enough away to never fire during a run
const NEVER: Duration = Duration::from_secs(60 * 60 * 24 * 365);

#[derive(Debug)]
pub enum TaskEventKind {
    /// Dependents of the task may start
    Fulfilled,
    /// The task fails the run
    Failed(JointlyError),
    /// The process is gone and its output drained; always the last event
    Exited(Option<i32>),
}

#[derive(Debug)]
pub struct TaskEvent {
    /// Index of the task in launch order
    pub index: usize,
    pub kind: TaskEventKind,
}

/// Handle to a launched task
#[derive(Debug)]
pub struct LaunchedTask {
    pub index: usize,
    pub label: String,
    kill_tx: mpsc::UnboundedSender<()>,
}

impl LaunchedTask {
    /// Ask the process to terminate with its configured kill signal.
    /// Repeated requests and requests after exit are no-ops.
    pub fn kill(&self) {
        let _ = self.kill_tx.send(());
    }
}

/// Spawn `task` and supervise it in the background.
///
/// `prefix` is the rendered label written in front of every output line.
/// Spawn failures are reported as a `Failed` event followed by `Exited`.
pub fn launch_task(
    index: usize,
    prefix: String,
    task: Arc<Task>,
    sink: SharedSink,
    events: mpsc::UnboundedSender<TaskEvent>,
) -> LaunchedTask {
    let label = task.label().to_string();
    let (kill_tx, kill_rx) = mpsc::unbounded_channel();

    let supervisor = Supervisor {
        index,
        label: label.clone(),
        task,
        events,
        prefixer: LinePrefixer::new(prefix, sink),
        awaiting_line: false,
    };
    tokio::spawn(supervisor.run(kill_rx));

    LaunchedTask {
        index,
        label,
        kill_tx,
    }
}

struct Supervisor {
    index: usize,
    label: String,
    task: Arc<Task>,
    events: mpsc::UnboundedSender<TaskEvent>,
    prefixer: LinePrefixer,
    /// Lines are still checked against the fulfillment predicate
    awaiting_line: bool,
}

impl Supervisor {
    async fn run(mut self, mut kill_rx: mpsc::UnboundedReceiver<()>) {
        let mut child = match build_command(&self.task).spawn() {
            Ok(child) => child,
            Err(source) => {
                warn!(task = %self.label, error = %source, "failed to spawn");
                self.send(TaskEventKind::Failed(JointlyError::Spawn {
                    label: self.label.clone(),
                    source,
                }));
                self.send(TaskEventKind::Exited(None));
                return;
            }
        };
        debug!(task = %self.label, pid = ?child.id(), "spawned");

        match &self.task.resolve_after {
            ResolveAfter::Start => self.send(TaskEventKind::Fulfilled),
            ResolveAfter::Exit => {}
            ResolveAfter::Predicate(_) => self.awaiting_line = true,
        }

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let mut stdout_buf = vec![0u8; READ_BUFFER_SIZE];
        let mut stderr_buf = vec![0u8; READ_BUFFER_SIZE];

        let timeout = self.task.options.timeout;
        let deadline = tokio::time::sleep(timeout.unwrap_or(NEVER));
        tokio::pin!(deadline);
        let drain = tokio::time::sleep(NEVER);
        tokio::pin!(drain);

        let mut kill_sent = false;
        let mut status: Option<std::io::Result<ExitStatus>> = None;

        loop {
            if status.is_some() && stdout.is_none() && stderr.is_none() {
                break;
            }

            tokio::select! {
                read = read_chunk(&mut stdout, &mut stdout_buf) => match read {
                    Some(n) => self.on_chunk(&stdout_buf[..n]),
                    None => stdout = None,
                },
                read = read_chunk(&mut stderr, &mut stderr_buf) => match read {
                    Some(n) => self.on_chunk(&stderr_buf[..n]),
                    None => stderr = None,
                },
                Some(()) = kill_rx.recv(), if status.is_none() && !kill_sent => {
                    kill_sent = true;
                    self.signal(&mut child);
                }
                _ = &mut deadline, if timeout.is_some() && status.is_none() && !kill_sent => {
                    debug!(task = %self.label, ?timeout, "timed out");
                    kill_sent = true;
                    self.signal(&mut child);
                }
                result = child.wait(), if status.is_none() => {
                    status = Some(result);
                    drain.as_mut().reset(Instant::now() + EXIT_DRAIN_GRACE);
                }
                _ = &mut drain, if status.is_some() => {
                    debug!(task = %self.label, "output still open after exit, giving up on it");
                    break;
                }
            }
        }

        if let Some(line) = self.prefixer.finish() {
            self.check_line(&line);
        }

        let code = match status {
            Some(Ok(status)) => status.code(),
            Some(Err(e)) => {
                warn!(task = %self.label, error = %e, "failed to wait for process");
                None
            }
            None => None,
        };
        debug!(task = %self.label, ?code, "exited");

        match self.task.reject_after.is_failure(code) {
            Ok(true) => self.send(TaskEventKind::Failed(JointlyError::ProcessExit {
                label: self.label.clone(),
                code,
            })),
            Ok(false) => {}
            Err(e) => self.send(TaskEventKind::Failed(JointlyError::Predicate {
                label: self.label.clone(),
                message: format!("{:#}", e),
            })),
        }

        if matches!(self.task.resolve_after, ResolveAfter::Exit) {
            self.send(TaskEventKind::Fulfilled);
        }
        self.send(TaskEventKind::Exited(code));
    }

    fn on_chunk(&mut self, chunk: &[u8]) {
        for line in self.prefixer.push(chunk) {
            if !self.awaiting_line {
                break;
            }
            self.check_line(&line);
        }
    }

    /// Evaluate the fulfillment predicate until it first succeeds
    fn check_line(&mut self, line: &str) {
        if !self.awaiting_line {
            return;
        }
        let ResolveAfter::Predicate(predicate) = &self.task.resolve_after else {
            return;
        };

        match predicate(&strip_escape_codes(line)) {
            Ok(true) => {
                debug!(task = %self.label, "fulfillment line matched");
                self.awaiting_line = false;
                self.send(TaskEventKind::Fulfilled);
            }
            Ok(false) => {}
            Err(e) => {
                self.awaiting_line = false;
                self.send(TaskEventKind::Failed(JointlyError::Predicate {
                    label: self.label.clone(),
                    message: format!("{:#}", e),
                }));
            }
        }
    }

    fn signal(&self, child: &mut tokio::process::Child) {
        let signal = self.task.kill_signal();
        debug!(task = %self.label, signal, "sending kill signal");
        if let Err(e) = send_signal(child, signal) {
            warn!(task = %self.label, signal, error = %e, "failed to signal process");
        }
    }

    fn send(&self, kind: TaskEventKind) {
        let _ = self.events.send(TaskEvent {
            index: self.index,
            kind,
        });
    }
}

/// Read the next chunk; `None` once the channel is closed or broken.
/// A missing channel never yields.
async fn read_chunk<R>(reader: &mut Option<R>, buf: &mut [u8]) -> Option<usize>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(reader) => match reader.read(buf).await {
            Ok(0) | Err(_) => None,
            Ok(n) => Some(n),
        },
        None => std::future::pending().await,
    }
}
