//! Configuration management for ejp-knx
//!
//! This module handles loading and validation of the application
//! configuration from a YAML file whose path can be overridden through the
//! `CONFIG_FILE` environment variable.

use crate::error::{EjpError, Result};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming the configuration file
pub const CONFIG_FILE_ENV: &str = "CONFIG_FILE";

/// Configuration file used when `CONFIG_FILE` is unset
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// Only supported document version
pub const SUPPORTED_VERSION: u32 = 1;

fn default_date_param() -> String {
    "Date_a_remonter".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Document version
    pub version: u32,

    /// Tariff API settings
    pub ejp: EjpConfig,

    /// KNX bus settings
    pub knx: KnxConfig,
}

/// Tariff API settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EjpConfig {
    /// Base endpoint of the status API
    pub url: String,

    /// Query key carrying the date to check
    #[serde(default = "default_date_param")]
    pub date_param: String,

    /// User-Agent header sent with the request
    pub user_agent: String,

    /// Tariff zone to look up in the response
    pub zone: Zone,
}

/// KNX bus settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnxConfig {
    /// Router or multicast address
    pub ip: String,

    /// UDP port (3671 for KNXnet/IP)
    #[serde(deserialize_with = "port_from_int_or_str")]
    pub port: u16,

    /// Group address receiving the advance-warning flag
    pub preavis_group: String,

    /// Group address receiving the active-restriction flag
    pub asserv_group: String,
}

/// EJP tariff zones, named as the API names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub enum Zone {
    EjpNord,
    EjpOuest,
    EjpPaca,
    EjpSud,
}

impl Zone {
    /// All zones in API order
    pub const ALL: [Zone; 4] = [Zone::EjpNord, Zone::EjpOuest, Zone::EjpPaca, Zone::EjpSud];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EjpNord => "EjpNord",
            Self::EjpOuest => "EjpOuest",
            Self::EjpPaca => "EjpPaca",
            Self::EjpSud => "EjpSud",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Zone {
    type Err = EjpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|z| z.as_str() == s)
            .ok_or_else(|| EjpError::validation("ejp.zone".to_string(), format!("unknown zone {}", s)))
    }
}

// Older config files quote the port.
fn port_from_int_or_str<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Int(u16),
        Str(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Int(p) => Ok(p),
        Port::Str(s) => s
            .trim()
            .parse::<u16>()
            .map_err(|e| serde::de::Error::custom(format!("invalid port {:?}: {}", s, e))),
    }
}

impl KnxConfig {
    /// `host:port` text used to reach the bus; IPv6 literals are bracketed
    pub fn endpoint(&self) -> String {
        match self.ip.trim().parse::<IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.port).to_string(),
            Err(_) => format!("{}:{}", self.ip.trim(), self.port),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EjpError::file_access(path.display().to_string(), e.to_string()))?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Path named by `CONFIG_FILE`, or the default file name
    pub fn config_path() -> PathBuf {
        match std::env::var_os(CONFIG_FILE_ENV) {
            Some(p) if !p.is_empty() => PathBuf::from(p),
            _ => PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    /// Load configuration with validation
    pub fn load() -> Result<Self> {
        let config = Self::from_file(Self::config_path())?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.version != SUPPORTED_VERSION {
            return Err(EjpError::validation(
                "version".to_string(),
                format!(
                    "unsupported version {} (expected {})",
                    self.version, SUPPORTED_VERSION
                ),
            ));
        }

        match reqwest::Url::parse(&self.ejp.url) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            Ok(u) => {
                return Err(EjpError::validation(
                    "ejp.url".to_string(),
                    format!("unsupported scheme {}", u.scheme()),
                ));
            }
            Err(e) => {
                return Err(EjpError::validation(
                    "ejp.url".to_string(),
                    format!("invalid URL: {}", e),
                ));
            }
        }

        if self.ejp.user_agent.trim().is_empty() {
            return Err(EjpError::validation(
                "ejp.userAgent",
                "User agent cannot be empty",
            ));
        }

        if self.ejp.date_param.trim().is_empty() {
            return Err(EjpError::validation(
                "ejp.dateParam",
                "Date parameter cannot be empty",
            ));
        }

        if self.knx.ip.trim().is_empty() {
            return Err(EjpError::validation("knx.ip", "IP address cannot be empty"));
        }

        if self.knx.port == 0 {
            return Err(EjpError::validation(
                "knx.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}
