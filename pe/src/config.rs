//! planexec configuration types and loading

use eyre::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment flag marking a containerized host
pub const DOCKER_ENV: &str = "RUNNING_IN_DOCKER";

/// Host alias that reaches the container host from inside a container
pub const DOCKER_HOST_ALIAS: &str = "host.docker.internal";

/// Main planexec configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Orchestrator connection settings
    pub orchestrator: OrchestratorConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .planexec.yml
        let local_config = PathBuf::from(".planexec.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/planexec/planexec.yml
        if let Some(user_config) = Self::user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".planexec.yml")];
                paths.extend(Self::user_config_path());
                paths
            }
        };

        candidates
            .into_iter()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("planexec").join("planexec.yml"))
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Orchestrator connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// API base URL, including any version prefix
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable that overrides the base URL when set
    #[serde(rename = "base-url-env")]
    pub base_url_env: String,

    /// Orchestrator model identifier
    pub model: String,

    /// Sampling temperature for planning requests
    pub temperature: f64,

    /// TCP connect timeout in milliseconds
    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/v1".to_string(),
            base_url_env: "MCP_AGENT_API_BASE_URL".to_string(),
            model: "mcp-orchestrator".to_string(),
            temperature: 0.3,
            connect_timeout_ms: 10_000,
        }
    }
}

impl OrchestratorConfig {
    /// Resolve environment overrides into a ready-to-use configuration
    pub fn resolve(&self) -> ResolvedOrchestratorConfig {
        let base_url = std::env::var(&self.base_url_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.base_url.clone());

        let in_docker = std::env::var(DOCKER_ENV).is_ok_and(|v| v == "true");
        debug!(%base_url, in_docker, "OrchestratorConfig::resolve: called");

        let base_url = if in_docker {
            rewrite_for_docker(&base_url)
        } else {
            base_url
        };

        ResolvedOrchestratorConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: self.model.clone(),
            temperature: self.temperature,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        }
    }
}

/// Point a loopback host at the container host alias
///
/// Only the URL's host is compared; URLs that do not parse are left as given.
pub fn rewrite_for_docker(base_url: &str) -> String {
    let mut url = match Url::parse(base_url) {
        Ok(url) => url,
        Err(e) => {
            debug!(%base_url, error = %e, "rewrite_for_docker: not a URL, leaving as is");
            return base_url.to_string();
        }
    };

    if !matches!(url.host_str(), Some("localhost" | "127.0.0.1")) {
        return base_url.to_string();
    }

    match url.set_host(Some(DOCKER_HOST_ALIAS)) {
        Ok(()) => url.to_string(),
        Err(e) => {
            debug!(%base_url, error = %e, "rewrite_for_docker: host not replaceable");
            base_url.to_string()
        }
    }
}

/// Orchestrator configuration with environment overrides applied
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOrchestratorConfig {
    /// Base URL without a trailing slash
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub connect_timeout: Duration,
}

impl ResolvedOrchestratorConfig {
    /// Configuration for an orchestrator at `base_url` with default settings
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let defaults = OrchestratorConfig::default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: defaults.model,
            temperature: defaults.temperature,
            connect_timeout: Duration::from_millis(defaults.connect_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.orchestrator.model, "mcp-orchestrator");
        assert_eq!(config.orchestrator.base_url, "http://127.0.0.1:8000/v1");
        assert!((config.orchestrator.temperature - 0.3).abs() < f64::EPSILON);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug
orchestrator:
  base-url: http://orchestrator:9000/v1
  base-url-env: MY_ORCH_URL
  model: planner-2
  temperature: 0.1
  connect-timeout-ms: 2500
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.orchestrator.base_url, "http://orchestrator:9000/v1");
        assert_eq!(config.orchestrator.base_url_env, "MY_ORCH_URL");
        assert_eq!(config.orchestrator.model, "planner-2");
        assert_eq!(config.orchestrator.connect_timeout_ms, 2500);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
orchestrator:
  model: other
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.orchestrator.model, "other");
        assert_eq!(config.orchestrator.base_url_env, "MCP_AGENT_API_BASE_URL");
        assert_eq!(config.orchestrator.connect_timeout_ms, 10_000);
    }

    #[test]
    fn test_rewrite_for_docker() {
        assert_eq!(
            rewrite_for_docker("http://localhost:8000/v1"),
            "http://host.docker.internal:8000/v1"
        );
        assert_eq!(
            rewrite_for_docker("http://127.0.0.1:8000/v1"),
            "http://host.docker.internal:8000/v1"
        );
        assert_eq!(rewrite_for_docker("https://orch.example.com/v1"), "https://orch.example.com/v1");
    }

    #[test]
    fn test_rewrite_for_docker_matches_host_only() {
        assert_eq!(
            rewrite_for_docker("http://mylocalhost.example:8000/v1"),
            "http://mylocalhost.example:8000/v1"
        );
        assert_eq!(
            rewrite_for_docker("https://orch.example.com/localhost/v1"),
            "https://orch.example.com/localhost/v1"
        );
        assert_eq!(
            rewrite_for_docker("http://localhost:8000/proxy/localhost"),
            "http://host.docker.internal:8000/proxy/localhost"
        );
        assert_eq!(rewrite_for_docker("not a url"), "not a url");
    }

    #[test]
    #[serial]
    fn test_resolve_env_override_and_docker() {
        let config = OrchestratorConfig {
            base_url_env: "PLANEXEC_TEST_BASE_URL".to_string(),
            ..Default::default()
        };

        // SAFETY: serialized test, no other thread reads these variables
        unsafe {
            std::env::remove_var("PLANEXEC_TEST_BASE_URL");
            std::env::remove_var(DOCKER_ENV);
        }
        assert_eq!(config.resolve().base_url, "http://127.0.0.1:8000/v1");

        unsafe {
            std::env::set_var("PLANEXEC_TEST_BASE_URL", "http://localhost:7000/v1/");
            std::env::set_var(DOCKER_ENV, "true");
        }
        let resolved = config.resolve();
        assert_eq!(resolved.base_url, "http://host.docker.internal:7000/v1");
        assert_eq!(resolved.connect_timeout, Duration::from_secs(10));

        unsafe {
            std::env::remove_var("PLANEXEC_TEST_BASE_URL");
            std::env::remove_var(DOCKER_ENV);
        }
    }

    #[test]
    #[serial]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log-level: warn\norchestrator:\n  model: from-file").unwrap();
        let path = file.path().to_path_buf();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.orchestrator.model, "from-file");
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let path = PathBuf::from("/nonexistent/planexec.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    fn test_for_base_url_trims_slash() {
        let resolved = ResolvedOrchestratorConfig::for_base_url("http://127.0.0.1:1234/v1/");
        assert_eq!(resolved.base_url, "http://127.0.0.1:1234/v1");
        assert_eq!(resolved.model, "mcp-orchestrator");
    }
}
