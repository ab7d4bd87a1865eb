use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::resolver::ResolverConfig;
use super::upstream::UpstreamConfig;

/// Main configuration structure for Warden DNS
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Named upstream servers. Empty means the system resolver only.
    #[serde(default)]
    pub upstreams: Vec<UpstreamConfig>,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. warden-dns.toml in current directory
    /// 3. /etc/warden-dns/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(path) = Self::get_config_path() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if overrides.disable_cache {
            self.resolver.disable_cache = true;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Resolver timeout cannot be 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for upstream in &self.upstreams {
            if upstream.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Upstream '{}' has an empty name",
                    upstream.address
                )));
            }
            if upstream.address.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Upstream '{}' has no address",
                    upstream.name
                )));
            }
            if !seen.insert(upstream.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate upstream name '{}'",
                    upstream.name
                )));
            }
            upstream
                .parsed_client_subnet()
                .map_err(ConfigError::Validation)?;
        }

        Ok(())
    }

    pub fn upstream(&self, name: &str) -> Option<&UpstreamConfig> {
        self.upstreams.iter().find(|u| u.name == name)
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        if std::path::Path::new("warden-dns.toml").exists() {
            Some("warden-dns.toml".to_string())
        } else if std::path::Path::new("/etc/warden-dns/config.toml").exists() {
            Some("/etc/warden-dns/config.toml".to_string())
        } else {
            None
        }
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub log_level: Option<String>,
    pub disable_cache: bool,
}
