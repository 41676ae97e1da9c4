use anyhow::Result;
use colored::*;
use jointly_core::task_manager::TaskManager;

pub fn execute(manager: &TaskManager) -> Result<()> {
    println!(
        "{} {}",
        "Execution plan for".bold(),
        manager.config_path.display().to_string().cyan()
    );

    let plan = manager
        .get_execution_plan()
        .map_err(|e| anyhow::anyhow!("Failed to get execution plan: {}", e))?;

    if plan.waves.is_empty() {
        println!("  {}", "No tasks defined".dimmed());
        return Ok(());
    }

    for (i, wave) in plan.waves.iter().enumerate() {
        println!("\n{}:", format!("Wave {}", i + 1).bold());
        for task in wave {
            let label = match task.color {
                Some(color) => task.label.color(color).bold(),
                None => task.label.normal(),
            };
            print!("  {} {}", label, task.command_line.dimmed());
            if !task.dependencies.is_empty() {
                print!(" {}", format!("(after {})", task.dependencies.join(", ")).dimmed());
            }
            println!();
        }
    }

    Ok(())
}
