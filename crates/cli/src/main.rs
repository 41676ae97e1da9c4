use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use jointly_core::output::OutputConfig;
use jointly_core::task_manager::{TaskManager, TaskManagerConfig};
use jointly_core::TaskRunnerConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

/// Jointly - run dependent processes together with prefixed output
#[derive(Parser)]
#[command(name = "jointly")]
#[command(about = "Run tasks concurrently, starting dependents once their dependencies are ready")]
#[command(version)]
struct Cli {
    /// Path to the tasks file (defaults to jointly.yml, jointly.yaml or .jointly.yml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Suppress task output
    #[arg(short, long, global = true)]
    silent: bool,

    /// Color labels even when stdout is not a terminal
    #[arg(long, global = true)]
    color: bool,

    /// Log diagnostics at debug level
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all tasks (the default)
    Run,
    /// Show the waves tasks would be launched in without running anything
    Plan,
    /// Print the JSON schema of the tasks file
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Some(Commands::Schema) = cli.command {
        return commands::schema::execute();
    }

    let output = OutputConfig {
        silent: cli.silent,
        colorize: cli.color || colorize_by_default(),
    };
    let manager = TaskManager::new(TaskManagerConfig {
        base_dir: std::env::current_dir()?,
        config_path: cli.config,
        runner: TaskRunnerConfig {
            output,
            ..TaskRunnerConfig::default()
        },
    })
    .map_err(|e| anyhow::anyhow!("Failed to load tasks: {}", e))?;
    debug!(path = %manager.config_path.display(), ?output, "using tasks file");

    match cli.command {
        Some(Commands::Plan) => commands::plan::execute(&manager),
        _ => commands::run::execute(&manager, output.silent).await,
    }
}

/// Diagnostics go to stderr so they never mix with task output
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("JOINTLY_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn colorize_by_default() -> bool {
    let forced_off = std::env::var("FORCE_COLOR").is_ok_and(|value| value == "0");
    std::io::stdout().is_terminal() && !forced_off
}
