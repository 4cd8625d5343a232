//! Startup configuration.
//!
//! Two sources: the coin daemon's own conf file (RPC credentials and endpoint) and an
//! optional TOML file with gateway settings. Both are resolved once and handed to
//! constructors; nothing here is consulted per request.

use crate::utils::errors::{GatewayError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DAEMON_CONF: &str = "~/.nu/nu.conf";
pub const DEFAULT_RPC_HOST: &str = "localhost";
pub const DEFAULT_RPC_PORT: u16 = 14002;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 4;
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

/// Resolved connection parameters for the daemon's JSON-RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub host: String,
    /// Port actually dialled: the conf file's `rpcport` plus one.
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl DaemonConfig {
    /// Load the daemon conf file at `path` (a leading `~` is expanded).
    pub fn load<P: AsRef<Path>>(path: P, timeout: Duration) -> Result<Self> {
        let path = expand_home(path.as_ref());
        if !path.exists() {
            return Err(GatewayError::Config(format!(
                "daemon conf does not exist: {}",
                path.display()
            )));
        }
        let data = fs::read_to_string(&path)?;
        Self::from_conf_str(&data, timeout)
    }

    pub fn from_conf_str(data: &str, timeout: Duration) -> Result<Self> {
        let mut entries = parse_conf(data);

        let username = entries.remove("rpcuser").ok_or(GatewayError::MissingKey("rpcuser"))?;
        let password = entries
            .remove("rpcpassword")
            .ok_or(GatewayError::MissingKey("rpcpassword"))?;
        let host = entries
            .remove("rpchost")
            .unwrap_or_else(|| DEFAULT_RPC_HOST.to_string());

        let base_port = match entries.remove("rpcport") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| GatewayError::InvalidSetting { key: "rpcport", value: raw.clone() })?,
            None => DEFAULT_RPC_PORT,
        };
        let port = base_port.checked_add(1).ok_or(GatewayError::InvalidSetting {
            key: "rpcport",
            value: base_port.to_string(),
        })?;

        Ok(Self { host, port, username, password, timeout })
    }
}

/// Section-less `key=value` (or `key: value`) lines. Keys are case-insensitive,
/// later entries win, `#` and `;` start comment lines.
fn parse_conf(data: &str) -> HashMap<String, String> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| {
            let split = match (line.find('='), line.find(':')) {
                (Some(a), Some(b)) => a.min(b),
                (Some(a), None) => a,
                (None, Some(b)) => b,
                (None, None) => return None,
            };
            let key = line[..split].trim().to_ascii_lowercase();
            let value = line[split + 1..].trim().to_string();
            Some((key, value))
        })
        .collect()
}

/// Expand a leading `~` against `$HOME`. Other paths pass through untouched.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Gateway settings, optionally read from a TOML file. Command-line flags override them.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct GatewaySettings {
    /// HTTP listen address (host:port)
    pub listen: String,
    /// Daemon conf path; `None` means the default location
    pub daemon_conf: Option<PathBuf>,
    pub rpc_timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            daemon_conf: None,
            rpc_timeout_secs: DEFAULT_RPC_TIMEOUT_SECS,
        }
    }
}

impl GatewaySettings {
    /// Load settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: GatewaySettings = toml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn daemon_conf_path(&self) -> PathBuf {
        self.daemon_conf
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DAEMON_CONF))
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}
