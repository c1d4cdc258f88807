//! Configuration types for Retrace

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, RetraceError};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of replay workers
pub const DEFAULT_PARALLEL: usize = 1;

/// How the scheduler walks the record sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    /// Every record is replayed exactly once
    SinglePass,
    /// Records are replayed round-robin until the span elapses
    TimeBoxed(Duration),
}

/// Output format for rendered records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML
    Yaml,
}

/// Replay configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Per-request timeout
    #[serde(default = "default_timeout", with = "duration_str")]
    pub timeout: Duration,
    /// Wall-clock span for cyclic replay; zero means single pass
    #[serde(default, with = "duration_str")]
    pub duration: Duration,
    /// Number of concurrent workers
    #[serde(default = "default_parallel")]
    pub parallel: usize,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_parallel() -> usize {
    DEFAULT_PARALLEL
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            duration: Duration::ZERO,
            parallel: DEFAULT_PARALLEL,
        }
    }
}

impl ReplayConfig {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RetraceError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| RetraceError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.parallel == 0 {
            return Err(RetraceError::ConfigError(
                "parallel must be at least 1".to_string(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(RetraceError::ConfigError(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Replay mode implied by `duration`
    #[must_use]
    pub fn mode(&self) -> ReplayMode {
        if self.duration.is_zero() {
            ReplayMode::SinglePass
        } else {
            ReplayMode::TimeBoxed(self.duration)
        }
    }
}

/// Durations as human-readable strings (`"30s"`, `"1h 30m"`)
mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_parse() {
        let config_toml = r#"
            timeout = "30s"
            duration = "5m"
            parallel = 8
        "#;

        let config: ReplayConfig = toml::from_str(config_toml).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.duration, Duration::from_secs(300));
        assert_eq!(config.parallel, 8);
        assert_eq!(config.mode(), ReplayMode::TimeBoxed(Duration::from_secs(300)));
    }

    #[test]
    fn test_config_defaults() {
        let config: ReplayConfig = toml::from_str("").unwrap();
        assert_eq!(config, ReplayConfig::default());
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.mode(), ReplayMode::SinglePass);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"parallel = 4\n").unwrap();

        let config = ReplayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.parallel, 4);
    }

    #[test]
    fn test_invalid_config_zero_parallel() {
        let config: ReplayConfig = toml::from_str("parallel = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_duration_string() {
        assert!(toml::from_str::<ReplayConfig>(r#"timeout = "soon""#).is_err());
    }
}
