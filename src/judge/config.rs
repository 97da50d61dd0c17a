use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors raised while assembling judge configuration. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_norway::Error,
    },

    #[error("Please set the {var} environment variable.")]
    MissingApiKey { var: String },

    #[error("invalid config: {message}")]
    Invalid { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Length of one backoff unit in milliseconds. Attempt `i` waits `2^i` units.
    #[serde(default = "default_backoff_unit_ms")]
    pub backoff_unit_ms: u64,
    /// Append one JSON line per judged row to the judgment log.
    #[serde(default = "default_log")]
    pub log: bool,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout: default_timeout(),
            max_attempts: default_max_attempts(),
            backoff_unit_ms: default_backoff_unit_ms(),
            log: default_log(),
        }
    }
}

impl JudgeConfig {
    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }

    /// Reject values the judge cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                message: "max_attempts must be at least 1".to_string(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "model must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Read the API key from the process environment.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        self.api_key_from(|name| std::env::var(name).ok())
    }

    /// Resolve the API key through `lookup`; blank values count as missing.
    pub fn api_key_from<F>(&self, lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(&self.api_key_env) {
            Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(ConfigError::MissingApiKey {
                var: self.api_key_env.clone(),
            }),
        }
    }
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_unit_ms() -> u64 {
    1000
}

fn default_log() -> bool {
    true
}

pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home)
        .join(".config")
        .join("answercheck")
        .join("judge.yaml")
}

/// Load config with fallback: explicit path > default path > built-in defaults.
///
/// An explicit path must exist and parse. A broken default file is reported
/// and replaced by defaults so a stale file cannot block grading.
pub fn load_config(explicit_path: Option<&Path>) -> Result<JudgeConfig, ConfigError> {
    let config = match explicit_path {
        Some(path) => load_config_from_path(path)?,
        None => {
            let path = default_config_path();
            if !path.exists() {
                JudgeConfig::default()
            } else {
                load_config_from_path(&path).unwrap_or_else(|e| {
                    eprintln!("answercheck: {e}; using defaults");
                    JudgeConfig::default()
                })
            }
        }
    };
    config.validate()?;
    Ok(config)
}

fn load_config_from_path(path: &Path) -> Result<JudgeConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(JudgeConfig::default());
    }
    serde_norway::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
