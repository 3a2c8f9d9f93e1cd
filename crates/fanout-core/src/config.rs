use crate::clock::{TimeFormat, PRECISE_FORMAT, STANDARD_FORMAT};
use crate::error::{FanoutError, Result};
use crate::pool::DEFAULT_NAME_PREFIX;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE: &str = "fanout.yaml";

/// Hard lower bound on a batch.
pub const MIN_TASK_COUNT: usize = 1;

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// TaskConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(default = "default_count")]
    pub default_count: usize,
    #[serde(default = "default_max_count")]
    pub max_count: usize,
}

fn default_count() -> usize {
    5
}

fn default_max_count() -> usize {
    100
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            default_count: default_count(),
            max_count: default_max_count(),
        }
    }
}

impl TaskConfig {
    /// Check a requested count against `[1, max_count]`.
    pub fn check_count(&self, count: i64) -> Result<usize> {
        let in_range = count >= MIN_TASK_COUNT as i64 && count <= self.max_count as i64;
        if !in_range {
            return Err(FanoutError::TaskCountOutOfRange {
                count,
                min: MIN_TASK_COUNT,
                max: self.max_count,
            });
        }
        Ok(count as usize)
    }
}

// ---------------------------------------------------------------------------
// WorkerConfig / TimeConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
}

fn default_name_prefix() -> String {
    DEFAULT_NAME_PREFIX.to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name_prefix: default_name_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeConfig {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_precise_format")]
    pub precise_format: String,
}

fn default_format() -> String {
    STANDARD_FORMAT.to_string()
}

fn default_precise_format() -> String {
    PRECISE_FORMAT.to_string()
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            precise_format: default_precise_format(),
        }
    }
}

impl TimeConfig {
    pub fn standard(&self) -> Result<TimeFormat> {
        TimeFormat::new(self.format.clone())
    }

    pub fn precise(&self) -> Result<TimeFormat> {
        TimeFormat::new(self.precise_format.clone())
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tasks: TaskConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub time: TimeConfig,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `fanout.yaml` in `cwd` is
    /// used if present, otherwise the built-in defaults.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let path: PathBuf = match explicit {
            Some(p) if !p.exists() => {
                return Err(FanoutError::ConfigNotFound(p.display().to_string()))
            }
            Some(p) => p.to_path_buf(),
            None => {
                let candidate = cwd.join(CONFIG_FILE);
                if !candidate.exists() {
                    tracing::debug!("no {CONFIG_FILE} found, using defaults");
                    return Ok(Self::default());
                }
                candidate
            }
        };

        tracing::debug!(path = %path.display(), "loading config");
        let data = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tasks.max_count < MIN_TASK_COUNT {
            return Err(FanoutError::InvalidConfig(
                "tasks.max_count must be at least 1".into(),
            ));
        }
        if self.tasks.default_count < MIN_TASK_COUNT
            || self.tasks.default_count > self.tasks.max_count
        {
            return Err(FanoutError::InvalidConfig(format!(
                "tasks.default_count {} must be between {MIN_TASK_COUNT} and {}",
                self.tasks.default_count, self.tasks.max_count
            )));
        }
        if self.worker.name_prefix.trim().is_empty() {
            return Err(FanoutError::InvalidConfig(
                "worker.name_prefix must not be empty".into(),
            ));
        }
        self.time.standard()?;
        self.time.precise()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.tasks.default_count, 5);
        assert_eq!(config.tasks.max_count, 100);
        assert_eq!(config.worker.name_prefix, "virtual-worker-");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.yaml");
        let err = Config::load(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, FanoutError::ConfigNotFound(_)));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "server:\n  port: 9090\ntasks:\n  max_count: 20\n",
        )
        .unwrap();
        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.tasks.max_count, 20);
        assert_eq!(config.tasks.default_count, 5);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.yaml");
        let mut config = Config::default();
        config.worker.name_prefix = "vt-".into();
        config.save(&path).unwrap();
        let loaded = Config::load(Some(&path), dir.path()).unwrap();
        assert_eq!(loaded.worker.name_prefix, "vt-");
    }

    #[test]
    fn default_count_above_max_is_rejected() {
        let mut config = Config::default();
        config.tasks.default_count = 150;
        assert!(matches!(
            config.validate(),
            Err(FanoutError::InvalidConfig(_))
        ));
    }

    #[test]
    fn bad_time_format_is_rejected() {
        let mut config = Config::default();
        config.time.precise_format = "%Y-%".into();
        assert!(matches!(
            config.validate(),
            Err(FanoutError::InvalidTimeFormat(_))
        ));
    }

    #[test]
    fn check_count_enforces_bounds() {
        let tasks = TaskConfig::default();
        assert_eq!(tasks.check_count(1).unwrap(), 1);
        assert_eq!(tasks.check_count(100).unwrap(), 100);
        assert!(tasks.check_count(0).is_err());
        assert!(tasks.check_count(-3).is_err());
        assert!(tasks.check_count(101).is_err());
    }
}
