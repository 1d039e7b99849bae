mod dto;

pub use dto::{PtrZoneFile, RecordEntry, ZoneFile};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::paths::{BindPaths, DnsmasqPaths};
use crate::infrastructure::remote::{ConnectionConfig, Credential};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Could not find home directory")]
    NoHomeDir,

    #[error("No remote host given. Pass --host or set connection.host in the config file")]
    NoHost,

    #[error("Invalid connect_timeout '{value}': {source}")]
    InvalidTimeout {
        value: String,
        source: humantime::DurationError,
    },

    #[error("Password variable {0} is not set")]
    MissingPassword(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionSettings,
    pub bind: BindPaths,
    pub dnsmasq: DnsmasqPaths,
}

/// How to reach the managed host. Every field can be overridden on the
/// command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,
    /// Environment variable holding the ssh password. The password itself
    /// is never stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
    /// Human-readable, e.g. `10s` or `1m`.
    pub connect_timeout: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: 22,
            user: "root".into(),
            identity_file: None,
            password_env: None,
            connect_timeout: "10s".into(),
        }
    }
}

/// Connection values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<PathBuf>,
}

impl ConnectionSettings {
    pub fn connect_timeout(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(&self.connect_timeout).map_err(|source| {
            ConfigError::InvalidTimeout {
                value: self.connect_timeout.clone(),
                source,
            }
        })
    }

    /// Merge overrides into these settings. A key file wins over a
    /// password variable; with neither, the ssh client's own defaults apply.
    pub fn resolve(
        &self,
        overrides: &ConnectionOverrides,
    ) -> Result<ConnectionConfig, ConfigError> {
        let host = overrides
            .host
            .clone()
            .or_else(|| self.host.clone())
            .ok_or(ConfigError::NoHost)?;
        let user = overrides.user.clone().unwrap_or_else(|| self.user.clone());

        let credential = match (&overrides.identity_file, &self.identity_file, &self.password_env) {
            (Some(key), _, _) | (None, Some(key), _) => Credential::KeyFile(key.clone()),
            (None, None, Some(var)) => Credential::Password(
                std::env::var(var).map_err(|_| ConfigError::MissingPassword(var.clone()))?,
            ),
            (None, None, None) => Credential::Agent,
        };

        Ok(ConnectionConfig::new(host, user)
            .with_port(overrides.port.unwrap_or(self.port))
            .with_credential(credential)
            .with_connect_timeout(self.connect_timeout()?))
    }
}

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store at `~/.dns-manager/config.toml`.
    pub fn new() -> Result<Self, ConfigError> {
        let dir = dirs::home_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join(".dns-manager");

        Ok(Self {
            path: dir.join("config.toml"),
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_config_dir(&self) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent()
            && !dir.exists()
        {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// A missing file yields the defaults.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        self.ensure_config_dir()?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
