use crate::executor::worker::MAX_WORKERS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Backups allowed to run at the same time.
    pub workers: usize,
    /// Triggers accepted but not yet picked up by a worker.
    pub queue_capacity: usize,
    pub command_timeout_secs: u64,
    pub backups: Vec<BackupConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        let database_url = crate::paths::data_dir()
            .map(|dir| format!("sqlite:{}", dir.join("schelly.db").display()))
            .unwrap_or_else(|_| "sqlite:schelly.db".to_string());
        Self {
            database_url,
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: 4,
            queue_capacity: 64,
            command_timeout_secs: 3600,
            backups: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        let path = crate::paths::conf_dir()?.join("config.json");
        if let Some(file_config) = Self::from_conf_file(&path)? {
            config.apply_file(file_config);
        }

        config.apply_env(|key| std::env::var(key).ok())?;

        config.normalize_database_url(&crate::paths::install_root()?)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(db_url) = lookup("DATABASE_URL") {
            self.database_url = db_url;
        }

        if let Some(host) = lookup("HOST") {
            self.host = host;
        }

        if let Some(port) = lookup("PORT") {
            self.port = port.parse().context("Invalid PORT")?;
        }

        if let Some(workers) = lookup("SCHELLY_WORKERS") {
            self.workers = workers.parse().context("Invalid SCHELLY_WORKERS")?;
        }

        if let Some(capacity) = lookup("SCHELLY_QUEUE_CAPACITY") {
            self.queue_capacity = capacity
                .parse()
                .context("Invalid SCHELLY_QUEUE_CAPACITY")?;
        }

        if let Some(timeout) = lookup("SCHELLY_COMMAND_TIMEOUT_SECS") {
            self.command_timeout_secs = timeout
                .parse()
                .context("Invalid SCHELLY_COMMAND_TIMEOUT_SECS")?;
        }

        Ok(())
    }

    fn from_conf_file(path: &Path) -> Result<Option<FileConfig>> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let file_config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(Some(file_config))
    }

    fn apply_file(&mut self, file_config: FileConfig) {
        if let Some(database_url) = file_config.database_url {
            self.database_url = database_url;
        }
        if let Some(host) = file_config.host {
            self.host = host;
        }
        if let Some(port) = file_config.port {
            self.port = port;
        }
        if let Some(workers) = file_config.workers {
            self.workers = workers;
        }
        if let Some(queue_capacity) = file_config.queue_capacity {
            self.queue_capacity = queue_capacity;
        }
        if let Some(timeout) = file_config.command_timeout_secs {
            self.command_timeout_secs = timeout;
        }
        if let Some(backups) = file_config.backups {
            self.backups = backups;
        }
    }

    fn normalize_database_url(&mut self, root: &Path) -> Result<()> {
        let Some(path_str) = self.database_url.strip_prefix("sqlite:") else {
            return Ok(());
        };

        let path = Path::new(path_str);

        if path.is_absolute() {
            if !path.starts_with(root) {
                anyhow::bail!(
                    "SQLite database path must be under install root: {}",
                    root.display()
                );
            }
            return Ok(());
        }

        if path
            .components()
            .any(|component| matches!(component, std::path::Component::ParentDir))
        {
            anyhow::bail!("SQLite database path cannot contain '..'");
        }

        let absolute = root.join(path);
        self.database_url = format!("sqlite:{}", absolute.display());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        if self.workers > MAX_WORKERS as usize {
            anyhow::bail!("workers cannot exceed {}", MAX_WORKERS);
        }
        if self.queue_capacity == 0 {
            anyhow::bail!("queue_capacity must be at least 1");
        }
        let mut seen = std::collections::HashSet::new();
        for backup in &self.backups {
            if backup.name.trim().is_empty() {
                anyhow::bail!("backup name in config cannot be empty");
            }
            if backup.command.trim().is_empty() {
                anyhow::bail!("backup '{}' has an empty command", backup.name);
            }
            if !seen.insert(backup.name.as_str()) {
                anyhow::bail!("duplicate backup name in config: {}", backup.name);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    database_url: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    workers: Option<usize>,
    queue_capacity: Option<usize>,
    command_timeout_secs: Option<u64>,
    backups: Option<Vec<BackupConfig>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_with_url(url: &str) -> Config {
        Config {
            database_url: url.to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "port": 9090,
                "workers": 2,
                "backups": [
                    {"name": "nightly-db", "command": "pg_dump", "args": ["-Fc", "app"]},
                    {"name": "weekly-fs", "command": "restic", "enabled": false}
                ]
            }"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.apply_file(Config::from_conf_file(&path).unwrap().unwrap());

        assert_eq!(config.port, 9090);
        assert_eq!(config.workers, 2);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.backups.len(), 2);
        assert_eq!(config.backups[0].args, vec!["-Fc", "app"]);
        assert!(config.backups[0].enabled);
        assert!(!config.backups[1].enabled);
        config.validate().unwrap();
    }

    #[test]
    fn missing_file_is_ignored_and_bad_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::from_conf_file(&dir.path().join("absent.json"))
            .unwrap()
            .is_none());

        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::from_conf_file(&path).is_err());
    }

    #[test]
    fn relative_database_path_lands_under_root() {
        let root = PathBuf::from("/opt/schelly");
        let mut config = config_with_url("sqlite:data/schelly.db");
        config.normalize_database_url(&root).unwrap();
        assert_eq!(
            config.database_url,
            format!("sqlite:{}", root.join("data/schelly.db").display())
        );

        assert!(config_with_url("sqlite:../escape.db")
            .normalize_database_url(&root)
            .is_err());
        assert!(config_with_url("sqlite:/etc/schelly.db")
            .normalize_database_url(&root)
            .is_err());
    }

    #[test]
    fn duplicate_backups_are_rejected() {
        let backup = BackupConfig {
            name: "nightly-db".to_string(),
            command: "pg_dump".to_string(),
            args: Vec::new(),
            enabled: true,
        };
        let config = Config {
            backups: vec![backup.clone(), backup],
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn env_overrides_apply_and_bad_port_fails() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("PORT", "9191"), ("SCHELLY_WORKERS", "8")]))
            .unwrap();
        assert_eq!(config.port, 9191);
        assert_eq!(config.workers, 8);

        for port in ["http", "70000", ""] {
            let mut config = Config::default();
            let err = config.apply_env(env(&[("PORT", port)])).unwrap_err();
            assert!(err.to_string().contains("Invalid PORT"));
        }
    }

    #[test]
    fn worker_count_is_bounded() {
        let config = Config {
            workers: MAX_WORKERS as usize,
            ..Config::default()
        };
        config.validate().unwrap();

        let config = Config {
            workers: MAX_WORKERS as usize + 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
