//! Configuration for kisslight
//!
//! Where the hub lives and how to talk to it. Persisted as a small JSON file
//! that the `ip` and `port` subcommands rewrite.

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KlError, Result};
use crate::protocol::ProtocolVersion;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "KISSLIGHT_CONFIG";

/// Hub port used when none is configured
pub const DEFAULT_PORT: u16 = 1155;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Hub Configuration
    // -------------------------------------------------------------------------
    /// Hub IP address
    pub hub_ip: IpAddr,

    /// Hub TCP port
    pub hub_port: u16,

    /// Protocol version appended to every request
    pub protocol: ProtocolVersion,

    // -------------------------------------------------------------------------
    // Connection Configuration
    // -------------------------------------------------------------------------
    /// Connection read timeout (milliseconds, 0 waits forever)
    ///
    /// A sniff round-trip waits on a person pressing a remote button, so keep
    /// this well above the hub's own capture timeout.
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 waits forever)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            hub_port: DEFAULT_PORT,
            protocol: ProtocolVersion::CURRENT,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5_000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Hub socket address
    pub fn hub_addr(&self) -> SocketAddr {
        SocketAddr::new(self.hub_ip, self.hub_port)
    }

    /// Default config file location
    ///
    /// `$KISSLIGHT_CONFIG`, then `$HOME/.config/kisslight/client.json`, then
    /// `./kisslight.json`.
    pub fn default_path() -> PathBuf {
        if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }

        match env::var_os("HOME").filter(|h| !h.is_empty()) {
            Some(home) => PathBuf::from(home)
                .join(".config")
                .join("kisslight")
                .join("client.json"),
            None => PathBuf::from("kisslight.json"),
        }
    }

    /// Load from `path`
    ///
    /// A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(KlError::Config(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| KlError::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;

        tracing::debug!("Loaded config from {}: hub {}", path.display(), config.hub_addr());
        Ok(config)
    }

    /// Write to `path`, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.validate()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                KlError::Config(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| KlError::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content + "\n")
            .map_err(|e| KlError::Config(format!("failed to write {}: {}", path.display(), e)))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Set the hub address from its textual form
    pub fn set_ip(&mut self, ip: &str) -> Result<()> {
        self.hub_ip = ip
            .trim()
            .parse()
            .map_err(|_| KlError::Usage(format!("invalid IP address: {:?}", ip)))?;
        Ok(())
    }

    /// Set the hub port
    pub fn set_port(&mut self, port: u16) -> Result<()> {
        if port == 0 {
            return Err(KlError::Usage("port must be between 1 and 65535".to_string()));
        }
        self.hub_port = port;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.hub_port == 0 {
            return Err(KlError::Config("hub_port must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the hub IP address
    pub fn hub_ip(mut self, ip: IpAddr) -> Self {
        self.config.hub_ip = ip;
        self
    }

    /// Set the hub port
    pub fn hub_port(mut self, port: u16) -> Self {
        self.config.hub_port = port;
        self
    }

    /// Set both from a socket address
    pub fn hub_addr(mut self, addr: SocketAddr) -> Self {
        self.config.hub_ip = addr.ip();
        self.config.hub_port = addr.port();
        self
    }

    /// Set the protocol version
    pub fn protocol(mut self, version: ProtocolVersion) -> Self {
        self.config.protocol = version;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
