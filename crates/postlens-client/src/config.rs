use std::path::Path;
use std::time::Duration;

use postlens_queue::RetryPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_API_BASE: &str = "http://localhost:5000";

/// Client settings, loadable from TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Candidate API bases, probed in order. The first is the fallback.
    pub api_bases: Vec<String>,
    /// Path appended to each candidate for the health probe.
    pub health_path: String,
    /// Default total attempts per request.
    pub attempts: u32,
    /// Default backoff base in milliseconds.
    pub base_delay_ms: u64,
    /// Backoff base for the analysis request and its status polls.
    pub analyze_base_delay_ms: u64,
    /// Interval between analysis queue status polls.
    pub poll_interval_ms: u64,
    /// How long a fetched `/global-stats` reply is reused.
    pub stats_ttl_secs: u64,
    /// Serialized requests allowed to run at once.
    pub max_concurrency: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_bases: vec![DEFAULT_API_BASE.into(), "http://localhost:5001".into()],
            health_path: "/health".into(),
            attempts: 3,
            base_delay_ms: 500,
            analyze_base_delay_ms: 600,
            poll_interval_ms: 1500,
            stats_ttl_secs: 3600,
            max_concurrency: 1,
        }
    }
}

impl ClientConfig {
    /// A config that only ever talks to `base`.
    pub fn single(base: impl Into<String>) -> Self {
        Self {
            api_bases: vec![base.into()],
            ..Default::default()
        }
    }

    pub fn from_toml_str(s: &str) -> ClientResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.api_bases.is_empty() {
            return Err(ClientError::Config("api_bases must not be empty".into()));
        }
        if self.attempts == 0 {
            return Err(ClientError::Config("attempts must be at least 1".into()));
        }
        if !self.health_path.starts_with('/') {
            return Err(ClientError::Config(format!(
                "health_path must start with '/': {}",
                self.health_path
            )));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_millis(self.attempts, self.base_delay_ms)
    }

    /// Retry policy for `POST /analyze`.
    pub fn analyze_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_millis(self.attempts, self.analyze_base_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stats_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = ClientConfig::default();
        assert_eq!(c.api_bases[0], DEFAULT_API_BASE);
        assert_eq!(c.health_path, "/health");
        assert_eq!(c.retry_policy(), RetryPolicy::from_millis(3, 500));
        assert_eq!(c.analyze_retry_policy(), RetryPolicy::from_millis(3, 600));
        assert_eq!(c.poll_interval(), Duration::from_millis(1500));
        assert_eq!(c.stats_ttl(), Duration::from_secs(3600));
        assert_eq!(c.max_concurrency, 1);
        c.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ClientConfig::from_toml_str(
            r#"
            api_bases = ["https://api.example.org"]
            attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(c.api_bases, vec!["https://api.example.org"]);
        assert_eq!(c.attempts, 5);
        assert_eq!(c.base_delay_ms, 500);
    }

    #[test]
    fn empty_bases_rejected() {
        let err = ClientConfig::from_toml_str("api_bases = []").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = ClientConfig::from_toml_str("attempts = 0").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = ClientConfig::from_toml_str("attempts = \"three\"").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "health_path = \"/v1/health\"\npoll_interval_ms = 250").unwrap();
        let c = ClientConfig::load(file.path()).unwrap();
        assert_eq!(c.health_path, "/v1/health");
        assert_eq!(c.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ClientConfig::load("/nonexistent/postlens.toml").unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
    }
}
