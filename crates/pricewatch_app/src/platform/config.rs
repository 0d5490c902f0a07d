//! Optional RON configuration file. Every field has a default, so a file
//! only needs the values it changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pricewatch_engine::{FetchSettings, PacingSettings, SelectorSet, BROWSER_USER_AGENT};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("min_delay_ms ({min}) must not exceed max_delay_ms ({max})")]
    InvalidPacing { min: u64, max: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the snapshot and legacy results files.
    pub state_dir: PathBuf,
    pub fetch: FetchConfig,
    pub pacing: PacingConfig,
    pub selectors: SelectorSet,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("."),
            fetch: FetchConfig::default(),
            pacing: PacingConfig::default(),
            selectors: SelectorSet::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub browser_headers: bool,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let settings = FetchSettings::default();
        Self {
            connect_timeout_secs: settings.connect_timeout.as_secs(),
            request_timeout_secs: settings.request_timeout.as_secs(),
            redirect_limit: settings.redirect_limit,
            max_bytes: settings.max_bytes,
            browser_headers: settings.browser_headers,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn to_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            browser_headers: self.browser_headers,
            user_agent: self.user_agent.clone(),
            ..FetchSettings::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        let pacing = PacingSettings::default();
        Self {
            min_delay_ms: pacing.min_delay.as_millis() as u64,
            max_delay_ms: pacing.max_delay.as_millis() as u64,
        }
    }
}

impl PacingConfig {
    pub fn to_settings(self) -> Result<PacingSettings, ConfigError> {
        if self.min_delay_ms > self.max_delay_ms {
            return Err(ConfigError::InvalidPacing {
                min: self.min_delay_ms,
                max: self.max_delay_ms,
            });
        }
        Ok(PacingSettings {
            min_delay: Duration::from_millis(self.min_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        })
    }
}

/// Reads `path` when given; no path means built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
