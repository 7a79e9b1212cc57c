//! Runtime configuration.
//!
//! Loaded from YAML. Every field has a default, so an empty document is a
//! valid configuration (remote tier only, no worker).
//!
//! ```yaml
//! timeout: 30s
//! worker:
//!   program: python3
//!   args: [enhanced_ai_agent.py]
//!   working_dir: ai
//! remote:
//!   api_key_env: OPENROUTER_API_KEY
//!   model: meta-llama/llama-3.1-8b-instruct:free
//! routing:
//!   remote: [chat, summarize_test]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::providers::CompletionConfig;
use crate::routing::RoutingConfig;

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Budget for each external-tier attempt
    #[serde(with = "duration_human")]
    pub timeout: Duration,

    /// Subprocess worker; `None` disables the worker tier
    pub worker: Option<WorkerConfig>,

    /// Hosted chat-completions API
    pub remote: RemoteConfig,

    /// Which actions each tier answers
    pub routing: RoutingConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            worker: None,
            remote: RemoteConfig::default(),
            routing: RoutingConfig::default(),
        }
    }
}

/// How to launch the worker process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Executable to run
    pub program: String,

    /// Arguments placed before the request JSON
    pub args: Vec<String>,

    /// Working directory for the child
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// How long to wait for a killed child to be reaped
    #[serde(with = "duration_human")]
    pub kill_grace: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["enhanced_ai_agent.py".to_string()],
            working_dir: None,
            kill_grace: Duration::from_secs(2),
        }
    }
}

/// Hosted API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    pub base_url: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    pub model: String,

    pub max_tokens: u32,

    pub temperature: f32,

    /// `HTTP-Referer` attribution header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,

    /// `X-Title` attribution header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            model: "meta-llama/llama-3.1-8b-instruct:free".to_string(),
            max_tokens: 600,
            temperature: 0.3,
            referer: Some("http://localhost:3002".to_string()),
            title: Some("Education Platform".to_string()),
        }
    }
}

impl RuntimeConfig {
    /// Parse from YAML text and validate.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = if yaml.trim().is_empty() {
            RuntimeConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be greater than zero".into()));
        }

        if let Some(worker) = &self.worker {
            if worker.program.trim().is_empty() {
                return Err(ConfigError::Invalid("worker.program must not be empty".into()));
            }
        }

        let remote = &self.remote;
        if !remote.base_url.starts_with("http://") && !remote.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(
                "remote.base_url must start with http:// or https://".into(),
            ));
        }
        if remote.api_key_env.trim().is_empty() {
            return Err(ConfigError::Invalid("remote.api_key_env must not be empty".into()));
        }
        if remote.max_tokens == 0 {
            return Err(ConfigError::Invalid("remote.max_tokens must be greater than zero".into()));
        }
        if !(0.0..=2.0).contains(&remote.temperature) {
            return Err(ConfigError::Invalid(
                "remote.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        Ok(())
    }

    /// Completion settings for the remote tier.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.remote.model.clone(),
            max_tokens: self.remote.max_tokens,
            temperature: self.remote.temperature,
            timeout: self.timeout,
        }
    }
}

/// Durations as human-readable strings ("30s", "2m 5s").
mod duration_human {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::Action;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        let config = RuntimeConfig::from_yaml("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert!(config.worker.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
timeout: 5s
worker:
  program: python3
  args: [enhanced_ai_agent.py]
  working_dir: ai
  kill_grace: 500ms
remote:
  base_url: http://localhost:8080/v1
  model: test-model
  max_tokens: 100
  temperature: 0.0
routing:
  worker: [evaluate_answer]
  remote: [chat, summarize_test]
"#;
        let config = RuntimeConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));

        let worker = config.worker.as_ref().unwrap();
        assert_eq!(worker.program, "python3");
        assert_eq!(worker.working_dir.as_deref(), Some(Path::new("ai")));
        assert_eq!(worker.kill_grace, Duration::from_millis(500));

        assert_eq!(config.remote.model, "test-model");
        assert_eq!(config.remote.api_key_env, "OPENROUTER_API_KEY");
        assert_eq!(config.routing.remote, vec![Action::Chat, Action::SummarizeTest]);

        let completion = config.completion_config();
        assert_eq!(completion.max_tokens, 100);
        assert_eq!(completion.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_worker_section_uses_defaults() {
        let config = RuntimeConfig::from_yaml("worker: {}\n").unwrap();
        let worker = config.worker.unwrap();
        assert_eq!(worker.args, vec!["enhanced_ai_agent.py"]);
        assert_eq!(worker.kill_grace, Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(RuntimeConfig::from_yaml("timeout: 0s\n").is_err());
        assert!(RuntimeConfig::from_yaml("remote:\n  base_url: ftp://x\n").is_err());
        assert!(RuntimeConfig::from_yaml("worker:\n  program: ''\n").is_err());
        assert!(RuntimeConfig::from_yaml("remote:\n  temperature: 3.5\n").is_err());
    }

    #[test]
    fn test_unknown_fields_and_bad_durations_rejected() {
        assert!(matches!(
            RuntimeConfig::from_yaml("retries: 3\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_yaml("timeout: soon\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout: 45s").unwrap();

        let config = RuntimeConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RuntimeConfig::from_yaml_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[test]
    fn test_durations_serialize_human_readable() {
        let yaml = serde_yaml::to_string(&RuntimeConfig::default()).unwrap();
        assert!(yaml.contains("timeout: 30s"));
    }
}
