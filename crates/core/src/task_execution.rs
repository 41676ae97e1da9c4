use tracing::debug;

use crate::execution::dependencies::group_tasks;
use crate::results::{ExecutionPlan, PlannedTask};
use crate::tasks::{label_color, Task};
use crate::types::JointlyResult;
use colored::Color;

/// Resolve the waves a run would launch, with the color each task gets
pub fn resolve_execution_plan(tasks: &[Task], palette: &[Color]) -> JointlyResult<ExecutionPlan> {
    let waves = group_tasks(tasks)?;
    debug!(waves = waves.len(), tasks = tasks.len(), "resolved execution plan");

    let mut launch_index = 0;
    let waves = waves
        .into_iter()
        .map(|wave| {
            wave.into_iter()
                .map(|index| {
                    let task = &tasks[index];
                    let planned = PlannedTask {
                        label: task.label().to_string(),
                        command_line: command_line(task),
                        dependencies: task.dependencies.clone(),
                        color: label_color(palette, launch_index),
                    };
                    launch_index += 1;
                    planned
                })
                .collect()
        })
        .collect();

    Ok(ExecutionPlan { waves })
}

fn command_line(task: &Task) -> String {
    std::iter::once(task.command.as_str())
        .chain(task.args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::DEFAULT_PALETTE;
    use crate::types::JointlyError;

    #[test]
    fn test_plan_orders_waves_and_colors() {
        let tasks = vec![
            Task::new("node").with_args(["server.js"]).with_dependencies(["build"]),
            Task::new("tsc").with_key("build").with_args(["--watch"]),
            Task::new("vitest").with_label("test"),
        ];

        let plan = resolve_execution_plan(&tasks, &DEFAULT_PALETTE).unwrap();
        assert_eq!(plan.task_count(), 3);
        assert_eq!(plan.waves.len(), 2);

        let first: Vec<_> = plan.waves[0].iter().map(|t| t.label.as_str()).collect();
        assert_eq!(first, vec!["build", "test"]);
        assert_eq!(plan.waves[0][0].command_line, "tsc --watch");
        assert_eq!(plan.waves[0][0].color, Some(Color::Blue));
        assert_eq!(plan.waves[0][1].color, Some(Color::Red));

        let server = &plan.waves[1][0];
        assert_eq!(server.label, "node");
        assert_eq!(server.dependencies, vec!["build".to_string()]);
        assert_eq!(server.color, Some(Color::Magenta));
    }

    #[test]
    fn test_plan_fails_on_cycle() {
        let tasks = vec![Task::new("a").with_key("a").with_dependencies(["a"])];
        let err = resolve_execution_plan(&tasks, &DEFAULT_PALETTE).unwrap_err();
        assert!(matches!(err, JointlyError::CyclicDependency { .. }));
    }
}
