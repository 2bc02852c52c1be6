//! Configuration loading and database path resolution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-level configuration directory.
pub const CONFIG_DIR: &str = ".todo-graph";

/// Configuration file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.yaml";

/// Environment variable naming the database file.
pub const DB_PATH_ENV: &str = "TODO_GRAPH_DB_PATH";

/// Database file used when nothing else says otherwise.
pub const DEFAULT_DB_FILE: &str = "todo.db";

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

/// Server-specific configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Load `<project>/.todo-graph/config.yaml` if it exists, otherwise defaults.
    ///
    /// A config file that exists but does not parse is an error.
    pub fn load_or_default(project_dir: Option<&Path>) -> Result<Self> {
        let path = project_dir
            .unwrap_or_else(|| Path::new("."))
            .join(CONFIG_DIR)
            .join(CONFIG_FILE);

        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the database path: explicit `database`, then
    /// `<project_dir>/todo.db`, then the config file, then
    /// `TODO_GRAPH_DB_PATH`, then `todo.db`.
    pub fn resolve_db_path(&self, database: Option<&Path>, project_dir: Option<&Path>) -> PathBuf {
        self.resolve_db_path_with(database, project_dir, std::env::var(DB_PATH_ENV).ok())
    }

    fn resolve_db_path_with(
        &self,
        database: Option<&Path>,
        project_dir: Option<&Path>,
        env_path: Option<String>,
    ) -> PathBuf {
        if let Some(database) = database {
            return database.to_path_buf();
        }
        if let Some(dir) = project_dir {
            return dir.join(DEFAULT_DB_FILE);
        }
        if let Some(ref path) = self.server.db_path {
            return path.clone();
        }
        env_path
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
    }
}

/// Ensure the directory holding `db_path` exists.
pub fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }
    Ok(())
}
