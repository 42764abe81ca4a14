use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// Environment variable holding the Groq API key.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groq_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Like [`Config::load`], but a missing or broken file only costs a warning.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring unusable config: {}", e);
                Self::new()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("carreira-ti").join("config.json"))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Where the API key was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Env,
    Config,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Env => "env",
            KeySource::Config => "config",
        }
    }
}

/// The API key together with its source.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    secret: String,
    source: KeySource,
}

impl Credential {
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn source(&self) -> KeySource {
        self.source
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Picks the API key: the environment wins over the config file, and blank
/// values count as absent.
pub fn resolve_credential(env_value: Option<String>, config: &Config) -> Option<Credential> {
    let non_blank = |value: &String| !value.trim().is_empty();

    env_value
        .filter(non_blank)
        .map(|secret| Credential {
            secret,
            source: KeySource::Env,
        })
        .or_else(|| {
            config
                .groq_api_key
                .clone()
                .filter(non_blank)
                .map(|secret| Credential {
                    secret,
                    source: KeySource::Config,
                })
        })
}

/// Reads the API key from the process environment, then the config file.
pub fn load_credential(config: &Config) -> Option<Credential> {
    let credential = resolve_credential(std::env::var(API_KEY_ENV).ok(), config);
    match &credential {
        Some(c) => debug!("API key loaded from {}", c.source().as_str()),
        None => warn!("{} is not set and no key is configured", API_KEY_ENV),
    }
    credential
}
