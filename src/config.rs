//! Layered settings and persisted CLI state.
//!
//! Settings sources, highest priority first:
//! 1. Environment variables (`TASKBOARD_*`)
//! 2. `<git-root>/.taskboard/config.toml`
//! 3. Built-in defaults
//!
//! The active project is not a setting: it is written by `project activate`
//! into `<git-root>/.taskboard/state.json`.

use std::fs;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::models::Priority;

pub const DATA_DIR: &str = ".taskboard";
pub const ENV_PREFIX: &str = "TASKBOARD_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_priority() -> Priority {
    Priority::Medium
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    /// Database location; relative paths resolve against the repository root.
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Priority given to tasks created without `--priority`.
    #[serde(default = "default_priority")]
    pub default_priority: Priority,

    /// Fallback log filter when `TASKBOARD_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: None,
            default_priority: default_priority(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let settings: Self = Self::figment(root).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn figment(root: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let file = config_file(root);
        if file.exists() {
            figment = figment.merge(Toml::file(file));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).only(&["db_path", "default_priority", "log_level"]))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = tracing_subscriber::EnvFilter::try_new(&self.log_level) {
            return Err(ConfigError::InvalidValue {
                field: "log_level".into(),
                reason: e.to_string(),
            });
        }
        if let Some(ref path) = self.db_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "db_path".into(),
                    reason: "must not be empty".into(),
                });
            }
        }
        Ok(())
    }

    pub fn resolve_db_path(&self, root: &Path) -> PathBuf {
        match self.db_path {
            Some(ref p) if p.is_absolute() => p.clone(),
            Some(ref p) => root.join(p),
            None => root.join(DATA_DIR).join("taskboard.db"),
        }
    }
}

pub fn config_file(root: &Path) -> PathBuf {
    root.join(DATA_DIR).join("config.toml")
}

pub fn state_file(root: &Path) -> PathBuf {
    root.join(DATA_DIR).join("state.json")
}

pub fn active_project_id(root: &Path) -> Option<String> {
    let content = fs::read_to_string(state_file(root)).ok()?;
    let state: serde_json::Value = serde_json::from_str(&content).ok()?;
    state["active_project_id"].as_str().map(|s| s.to_string())
}

pub fn set_active_project(root: &Path, project_id: &str) -> Result<(), ConfigError> {
    let path = state_file(root);
    let io_err = |source| ConfigError::Io {
        path: path.clone(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let state = json!({ "active_project_id": project_id });
    fs::write(&path, format!("{state:#}")).map_err(io_err)?;
    Ok(())
}

pub fn clear_active_project(root: &Path) -> Result<(), ConfigError> {
    let path = state_file(root);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ConfigError::Io { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_are_correct() {
        let settings = Settings::default();
        assert_eq!(settings.db_path, None);
        assert_eq!(settings.default_priority, Priority::Medium);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn loads_from_project_toml() {
        Jail::expect_with(|jail| {
            jail.create_dir(DATA_DIR)?;
            jail.create_file(
                ".taskboard/config.toml",
                r#"
default_priority = "High"
log_level = "debug"
db_path = "data/board.db"
"#,
            )?;

            let root = jail.directory().to_path_buf();
            let settings = Settings::load(&root).expect("load settings");
            assert_eq!(settings.default_priority, Priority::High);
            assert_eq!(settings.log_level, "debug");
            assert_eq!(settings.resolve_db_path(&root), root.join("data/board.db"));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_toml() {
        Jail::expect_with(|jail| {
            jail.create_dir(DATA_DIR)?;
            jail.create_file(".taskboard/config.toml", "default_priority = \"High\"\n")?;
            jail.set_env("TASKBOARD_DEFAULT_PRIORITY", "Low");

            let settings = Settings::load(jail.directory()).expect("load settings");
            assert_eq!(settings.default_priority, Priority::Low);
            Ok(())
        });
    }

    #[test]
    fn rejects_unknown_priority() {
        Jail::expect_with(|jail| {
            jail.set_env("TASKBOARD_DEFAULT_PRIORITY", "Urgent");
            assert!(Settings::load(jail.directory()).is_err());
            Ok(())
        });
    }

    #[test]
    fn default_db_path_lives_under_data_dir() {
        let root = Path::new("/repo");
        let path = Settings::default().resolve_db_path(root);
        assert_eq!(path, PathBuf::from("/repo/.taskboard/taskboard.db"));
    }

    #[test]
    fn active_project_round_trips_through_state_file() {
        Jail::expect_with(|jail| {
            let root = jail.directory();
            assert_eq!(active_project_id(root), None);

            set_active_project(root, "01ABC").expect("write state");
            assert_eq!(active_project_id(root).as_deref(), Some("01ABC"));

            clear_active_project(root).expect("clear state");
            assert_eq!(active_project_id(root), None);
            clear_active_project(root).expect("clearing twice is fine");
            Ok(())
        });
    }
}
