//! Configuration loading.
//!
//! Configuration is a TOML file resolved in order:
//! 1. `--config <path>` (CLI flag, must exist)
//! 2. `~/.spegil/config.toml` (user)
//! 3. `/etc/spegil/config.toml` (system)
//!
//! Every field has a default, so running without any config file is
//! fine; only an explicitly named file that cannot be read is an error.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{Error, Result};

const SYSTEM_CONFIG_PATH: &str = "/etc/spegil/config.toml";

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub origin: OriginConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address and port the HTTP listener binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Upstream origin settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OriginConfig {
    /// Base URL of the origin, e.g. `http://origin.internal:8000`.
    ///
    /// There is no usable default; startup fails without one.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout for origin fetches, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Cache storage settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Directory holding cached files. Created if missing.
    #[serde(default = "default_cache_root")]
    pub root: PathBuf,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_cache_root() -> PathBuf {
    PathBuf::from("./cache")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_cache_root(),
        }
    }
}

impl Config {
    /// Load configuration following the resolution order above.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Configuration(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Self::from_file(path);
        }

        if let Some(home) = dirs::home_dir() {
            let candidate = home.join(".spegil").join("config.toml");
            if candidate.exists() {
                return Self::from_file(&candidate);
            }
        }

        let system = Path::new(SYSTEM_CONFIG_PATH);
        if system.exists() {
            return Self::from_file(system);
        }

        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&text).map_err(|e| {
            Error::Configuration(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Timeout for origin requests as a [`std::time::Duration`].
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.origin.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = Config::default();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.origin.base_url, None);
        assert_eq!(config.origin.request_timeout_secs, 30);
        assert_eq!(config.cache.root, PathBuf::from("./cache"));
    }

    #[test]
    fn minimal_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [origin]
            base_url = "http://origin.internal:8000"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.origin.base_url.as_deref(),
            Some("http://origin.internal:8000")
        );
        assert_eq!(config.origin.request_timeout_secs, 30);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.cache.root, PathBuf::from("./cache"));
    }

    #[test]
    fn full_file_parses() {
        let config: Config = toml::from_str(
            r#"
            [server]
            bind = "0.0.0.0:9000"

            [origin]
            base_url = "http://10.0.0.5"
            request_timeout_secs = 5

            [cache]
            root = "/var/cache/spegil"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.origin.base_url.as_deref(), Some("http://10.0.0.5"));
        assert_eq!(config.origin.request_timeout_secs, 5);
        assert_eq!(config.cache.root, PathBuf::from("/var/cache/spegil"));
        assert_eq!(config.request_timeout(), std::time::Duration::from_secs(5));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            [cache]
            rooot = "/oops"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/spegil.toml")));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
