//! Configuration loading
//!
//! Tasks are declared in a YAML file. When no explicit path is given the
//! first existing file among [`DEFAULT_CONFIG_FILES`] is used.

pub mod tasks;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::types::{JointlyError, JointlyResult};

pub use tasks::{parse_tasks_config, TaskConfig, TasksFileConfig};

/// Config file names probed, in order, when no path is given
pub const DEFAULT_CONFIG_FILES: [&str; 3] = ["jointly.yml", "jointly.yaml", ".jointly.yml"];

/// Resolve the config file relative to `base_dir`.
///
/// An explicit path must exist; otherwise the defaults are probed in order.
pub fn resolve_config_path(base_dir: &Path, explicit: Option<&Path>) -> JointlyResult<PathBuf> {
    let candidates: Vec<PathBuf> = match explicit {
        Some(path) => vec![base_dir.join(path)],
        None => DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| base_dir.join(name))
            .collect(),
    };

    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or_else(|| {
            JointlyError::Config(format!(
                "Config not found among paths:\n  {}",
                candidates
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join("\n  ")
            ))
        })
}

/// Read and parse a tasks file
pub fn load_tasks_config(path: &Path) -> JointlyResult<TasksFileConfig> {
    debug!(path = %path.display(), "loading tasks config");
    let content = std::fs::read_to_string(path).map_err(|e| {
        JointlyError::Config(format!(
            "Failed to read tasks config {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_tasks_config(&content).map_err(|e| {
        JointlyError::Config(format!(
            "Failed to parse tasks config {}: {}",
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_first_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("jointly.yaml"), "tasks: []\n").unwrap();
        std::fs::write(root.join(".jointly.yml"), "tasks: []\n").unwrap();

        let path = resolve_config_path(root, None).unwrap();
        assert_eq!(path, root.join("jointly.yaml"));
    }

    #[test]
    fn test_resolve_explicit_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("custom.yml"), "tasks: []\n").unwrap();

        let path = resolve_config_path(root, Some(Path::new("custom.yml"))).unwrap();
        assert_eq!(path, root.join("custom.yml"));
    }

    #[test]
    fn test_resolve_lists_candidates_when_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = resolve_config_path(temp_dir.path(), None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Config not found among paths"));
        for name in DEFAULT_CONFIG_FILES {
            assert!(message.contains(name), "missing candidate {}", name);
        }
    }

    #[test]
    fn test_load_reports_path_on_parse_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("jointly.yml");
        std::fs::write(&path, "tasks:\n  - args: [oops]\n").unwrap();

        let err = load_tasks_config(&path).unwrap_err();
        assert!(matches!(err, JointlyError::Config(msg) if msg.contains("jointly.yml")));
    }
}
