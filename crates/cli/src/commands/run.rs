use anyhow::Result;
use colored::*;
use jointly_core::task_manager::TaskManager;
use jointly_core::{JointlyError, RunOutcome};

pub async fn execute(manager: &TaskManager, silent: bool) -> Result<()> {
    let outcome = manager
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start tasks: {}", e))?;

    match outcome {
        RunOutcome::Succeeded => Ok(()),
        RunOutcome::Failed(err) => {
            if let Some((heading, detail)) = failure_report(&err, silent) {
                eprintln!("{} {}", "✗".red().bold(), heading.red().bold());
                eprintln!("  {}", detail.red());
            }
            std::process::exit(1);
        }
    }
}

/// Heading naming the failing task plus the error itself; nothing when silent
fn failure_report(err: &JointlyError, silent: bool) -> Option<(String, String)> {
    if silent {
        return None;
    }
    let heading = match err.task_label() {
        Some(label) => format!("Stopped all tasks because '{}' failed", label),
        None => "Stopped all tasks".to_string(),
    };
    Some((heading, err.to_string()))
}
