use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::model::StatusSet;

/// Directory holding a board's files, relative to the project root.
pub const LANES_DIR: &str = ".lanes";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Column names in display order.
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            statuses: default_statuses(),
        }
    }
}

impl BoardConfig {
    /// Validated status set for this board.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty, blank or duplicated status list.
    pub fn status_set(&self) -> Result<StatusSet, ConfigError> {
        StatusSet::new(self.statuses.iter().cloned())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Append committed changes to `.lanes/outbox.jsonl`.
    #[serde(default = "default_true")]
    pub outbox: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            outbox: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// Path of the project config file under `project_root`.
#[must_use]
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(LANES_DIR).join("config.toml")
}

fn read_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str::<T>(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Load `.lanes/config.toml`, or defaults when the file is absent.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig, ConfigError> {
    let path = project_config_path(project_root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }
    read_toml(&path)
}

/// Load `<config_dir>/lanes/config.toml`, or defaults when absent.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig, ConfigError> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("lanes/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }
    read_toml(&path)
}

/// Merge project config, user config and environment into one view.
///
/// # Errors
///
/// Propagates config load failures.
pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig, ConfigError> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(
        cli_json,
        user.output.as_deref(),
        env_format.as_deref(),
        std::io::stdout().is_terminal(),
    );

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

/// Output mode precedence: `--json`, `FORMAT`, user config, then TTY.
fn resolve_output(
    cli_json: bool,
    user_output: Option<&str>,
    env_format: Option<&str>,
    is_tty: bool,
) -> String {
    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if is_tty {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_statuses() -> Vec<String> {
    StatusSet::DEFAULT.iter().map(|s| (*s).to_string()).collect()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_project_config(dir.path()).unwrap();
        assert_eq!(config.board.statuses, ["TODO", "DOING", "REVIEW", "DONE"]);
        assert!(config.sync.outbox);
    }

    #[test]
    fn project_config_overrides_statuses() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(LANES_DIR)).unwrap();
        std::fs::write(
            project_config_path(dir.path()),
            "[board]\nstatuses = [\"Backlog\", \"Now\", \"Shipped\"]\n\n[sync]\noutbox = false\n",
        )
        .unwrap();

        let config = load_project_config(dir.path()).unwrap();
        let set = config.board.status_set().unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.first().as_str(), "Backlog");
        assert!(!config.sync.outbox);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(LANES_DIR)).unwrap();
        std::fs::write(project_config_path(dir.path()), "[sync]\noutbox = false\n").unwrap();

        let config = load_project_config(dir.path()).unwrap();
        assert_eq!(config.board.statuses.len(), 4);
    }

    #[test]
    fn malformed_config_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(LANES_DIR)).unwrap();
        std::fs::write(project_config_path(dir.path()), "[board\nstatuses = 3").unwrap();

        let err = load_project_config(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.code(), crate::error::ErrorCode::ConfigParseError);
    }

    #[test]
    fn empty_status_list_is_rejected_on_use() {
        let config = BoardConfig { statuses: vec![] };
        assert!(matches!(
            config.status_set(),
            Err(ConfigError::EmptyStatusSet)
        ));
    }

    #[test]
    fn output_precedence() {
        assert_eq!(resolve_output(true, Some("text"), Some("pretty"), true), "json");
        assert_eq!(resolve_output(false, Some("text"), Some("json"), true), "json");
        assert_eq!(resolve_output(false, Some("table"), None, true), "text");
        assert_eq!(resolve_output(false, Some("bogus"), Some("nope"), true), "pretty");
        assert_eq!(resolve_output(false, None, None, false), "text");
    }
}
