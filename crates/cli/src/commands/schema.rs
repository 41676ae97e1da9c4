use anyhow::Result;
use jointly_core::task_manager::tasks_config_schema;

pub fn execute() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&tasks_config_schema())?);
    Ok(())
}
