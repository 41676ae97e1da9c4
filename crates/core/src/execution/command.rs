//! Process spawning and signalling
//!
//! Builds the [`tokio::process::Command`] for a task from its declared process
//! options and delivers kill signals to running children.

use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::tasks::{Shell, Task};

/// Build the command for a task with both output channels piped
pub fn build_command(task: &Task) -> Command {
    let mut command = match &task.options.shell {
        Shell::Disabled => {
            let mut command = Command::new(&task.command);
            command.args(&task.args);
            command
        }
        Shell::Platform if cfg!(windows) => shell_command("cmd", task),
        Shell::Platform => shell_command("sh", task),
        Shell::Program(program) => shell_command(program, task),
    };

    if let Some(cwd) = &task.options.cwd {
        command.current_dir(cwd);
    }
    command.envs(&task.options.env);

    #[cfg(unix)]
    {
        if let Some(uid) = task.options.uid {
            command.uid(uid);
        }
        if let Some(gid) = task.options.gid {
            command.gid(gid);
        }
        if let Some(argv0) = &task.options.argv0 {
            command.arg0(argv0);
        }
    }

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(false);
    command
}

/// Run the whole command line through `shell`
fn shell_command(shell: &str, task: &Task) -> Command {
    let line = std::iter::once(task.command.as_str())
        .chain(task.args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");

    let mut command = Command::new(shell);
    command.arg(shell_flag(shell)).arg(line);
    command
}

/// `cmd` takes `/C`; every other shell takes `-c`
fn shell_flag(shell: &str) -> &'static str {
    let name = Path::new(shell)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(shell);
    if name.eq_ignore_ascii_case("cmd") {
        "/C"
    } else {
        "-c"
    }
}

/// Validate a kill signal such as `SIGTERM`, `TERM` or `15`
pub fn parse_signal(name: &str) -> Result<(), String> {
    #[cfg(unix)]
    {
        to_signal(name).map(|_| ())
    }
    #[cfg(not(unix))]
    {
        let _ = name;
        Ok(())
    }
}

#[cfg(unix)]
fn to_signal(name: &str) -> Result<nix::sys::signal::Signal, String> {
    use nix::sys::signal::Signal;

    let unknown = || format!("Unknown kill signal '{}'", name);
    let trimmed = name.trim();

    if let Ok(number) = trimmed.parse::<i32>() {
        return Signal::try_from(number).map_err(|_| unknown());
    }

    let upper = trimmed.to_ascii_uppercase();
    let full = if upper.starts_with("SIG") {
        upper
    } else {
        format!("SIG{}", upper)
    };
    full.parse::<Signal>().map_err(|_| unknown())
}

/// Deliver `signal` to a running child. A child that has already been
/// reaped is left alone.
#[cfg(unix)]
pub fn send_signal(child: &mut Child, signal: &str) -> std::io::Result<()> {
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Ok(());
    };
    let signal = to_signal(signal)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    nix::sys::signal::kill(Pid::from_raw(pid as i32), signal)?;
    Ok(())
}

/// Signals other than a forced kill are not available here
#[cfg(not(unix))]
pub fn send_signal(child: &mut Child, _signal: &str) -> std::io::Result<()> {
    child.start_kill()
}
