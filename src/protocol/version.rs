//! Protocol version tag
//!
//! Every request ends with `KL/<major>.<minor>` and every reply starts with it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{KlError, Result};

/// Prefix of the version token
pub const VERSION_PREFIX: &str = "KL/";

/// Which family of request formats a hub speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    /// Raw RF codes: `ADD <name> <on> <off> <pulse>`, `TRANSMIT <code> <pulse>`
    Rf,

    /// MQTT bridge: `ADD <name> <topic> <type>`, `TRANSMIT <topic> <cmd>`
    Mqtt,
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generation::Rf => f.write_str("RF"),
            Generation::Mqtt => f.write_str("MQTT"),
        }
    }
}

/// A `KL/<major>.<minor>` protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    /// First version with topic-based device records
    pub const MQTT_BRIDGE: ProtocolVersion = ProtocolVersion::new(0, 3);

    /// Version spoken when nothing else is configured
    pub const CURRENT: ProtocolVersion = Self::MQTT_BRIDGE;

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Request format family for this version
    pub fn generation(&self) -> Generation {
        if *self >= Self::MQTT_BRIDGE {
            Generation::Mqtt
        } else {
            Generation::Rf
        }
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}.{}", VERSION_PREFIX, self.major, self.minor)
    }
}

impl FromStr for ProtocolVersion {
    type Err = KlError;

    /// Accepts `KL/0.3`, `kl/0.3` or a bare `0.3`
    fn from_str(s: &str) -> Result<Self> {
        let bare = match s.get(..VERSION_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(VERSION_PREFIX) => {
                &s[VERSION_PREFIX.len()..]
            }
            _ => s,
        };

        let invalid = || KlError::Config(format!("invalid protocol version: {:?}", s));

        let (major, minor) = bare.split_once('.').ok_or_else(invalid)?;
        let major = major.parse::<u8>().map_err(|_| invalid())?;
        let minor = minor.parse::<u8>().map_err(|_| invalid())?;

        if major == 0 && minor == 0 {
            return Err(invalid());
        }

        Ok(Self { major, minor })
    }
}

impl TryFrom<String> for ProtocolVersion {
    type Error = KlError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ProtocolVersion> for String {
    fn from(version: ProtocolVersion) -> Self {
        version.to_string()
    }
}
