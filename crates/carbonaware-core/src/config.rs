//! Configuration — `~/.carbonaware/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CarbonAwareError, Result};
use crate::types::ZoneSpec;

pub const API_KEY_ENV: &str = "CARBONAWARE_API_KEY";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarbonAwareConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<OperatorConfig>,
    #[serde(default)]
    pub host: HostConfig,
}

impl CarbonAwareConfig {
    /// `~/.carbonaware/config.toml`
    pub fn default_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Load from the default path; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        if let Some(op) = &config.operator {
            op.validate()?;
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".carbonaware")
}

/// Connection to the carbon-aware scheduling API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String { "https://api.carbonaware.dev".into() }
fn default_timeout_secs() -> u64 { 30 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SchedulerConfig {
    /// `CARBONAWARE_API_KEY` wins over the file.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

/// Parameters of one carbon-aware task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorConfig {
    #[serde(default = "default_task_id")]
    pub task_id: String,
    pub execution_window_minutes: u32,
    pub task_duration_minutes: u32,
    /// `None` means auto-detect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<ZoneSpec>,
}

fn default_task_id() -> String { "carbon_aware".into() }

impl OperatorConfig {
    pub fn new(
        task_id: impl Into<String>,
        execution_window_minutes: u32,
        task_duration_minutes: u32,
        zone: Option<ZoneSpec>,
    ) -> Result<Self> {
        let config = Self {
            task_id: task_id.into(),
            execution_window_minutes,
            task_duration_minutes,
            zone,
        };
        config.validate()?;
        Ok(config)
    }

    /// Both values positive, and the task must fit in its window.
    pub fn validate(&self) -> Result<()> {
        if self.task_duration_minutes == 0 {
            return Err(CarbonAwareError::config("task_duration_minutes must be positive"));
        }
        if self.execution_window_minutes == 0 {
            return Err(CarbonAwareError::config("execution_window_minutes must be positive"));
        }
        if self.execution_window_minutes < self.task_duration_minutes {
            return Err(CarbonAwareError::config(format!(
                "execution_window_minutes ({}) is shorter than task_duration_minutes ({})",
                self.execution_window_minutes, self.task_duration_minutes
            )));
        }
        Ok(())
    }
}

/// Settings for the in-process host that parks deferred tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 { 30 }

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            state_path: None,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl HostConfig {
    /// Configured path, else `~/.carbonaware/tasks.json`.
    pub fn state_path(&self) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(|| config_dir().join("tasks.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Zone;

    #[test]
    fn test_operator_validation() {
        assert!(OperatorConfig::new("t", 60, 30, None).is_ok());
        assert!(OperatorConfig::new("t", 30, 30, None).is_ok());

        let zero_duration = OperatorConfig::new("t", 60, 0, None);
        assert!(matches!(zero_duration, Err(CarbonAwareError::Config(_))));

        let zero_window = OperatorConfig::new("t", 0, 30, None);
        assert!(matches!(zero_window, Err(CarbonAwareError::Config(_))));

        let too_short = OperatorConfig::new("t", 20, 30, None);
        assert!(matches!(too_short, Err(CarbonAwareError::Config(_))));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CarbonAwareConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.scheduler.base_url, "https://api.carbonaware.dev");
        assert_eq!(config.scheduler.timeout_secs, 30);
        assert_eq!(config.host.poll_interval_secs, 30);
        assert!(config.operator.is_none());
    }

    #[test]
    fn test_parse_operator_with_zone_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[scheduler]
base_url = "http://localhost:8080"

[operator]
task_id = "nightly_etl"
execution_window_minutes = 120
task_duration_minutes = 45

[operator.zone]
provider = "aws"
region = "us-east-1"
"#,
        )
        .unwrap();

        let config = CarbonAwareConfig::load_from(&path).unwrap();
        assert_eq!(config.scheduler.base_url, "http://localhost:8080");
        let op = config.operator.unwrap();
        assert_eq!(op.task_id, "nightly_etl");
        assert_eq!(op.execution_window_minutes, 120);
        assert_eq!(op.task_duration_minutes, 45);
        assert_eq!(op.zone, Some(ZoneSpec::One(Zone::new("aws", "us-east-1"))));
    }

    #[test]
    fn test_invalid_operator_in_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[operator]\nexecution_window_minutes = 10\ntask_duration_minutes = 30\n",
        )
        .unwrap();
        assert!(matches!(
            CarbonAwareConfig::load_from(&path),
            Err(CarbonAwareError::Config(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = CarbonAwareConfig {
            operator: Some(
                OperatorConfig::new(
                    "t",
                    60,
                    30,
                    Some(ZoneSpec::Many(vec![
                        Zone::new("aws", "us-east-1"),
                        Zone::new("gcp", "us-central1"),
                    ])),
                )
                .unwrap(),
            ),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = CarbonAwareConfig::load_from(&path).unwrap();
        assert_eq!(loaded.operator, config.operator);
    }

    #[test]
    fn test_host_state_path_override() {
        let host = HostConfig {
            state_path: Some(PathBuf::from("/tmp/tasks.json")),
            ..Default::default()
        };
        assert_eq!(host.state_path(), PathBuf::from("/tmp/tasks.json"));
        assert!(HostConfig::default().state_path().ends_with(".carbonaware/tasks.json"));
    }
}
