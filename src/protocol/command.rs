//! Command definitions
//!
//! Typed requests sent to the hub, one per invocation.

use std::fmt;
use std::str::FromStr;

use crate::error::{KlError, Result};
use super::version::{Generation, ProtocolVersion};

/// Request verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Toggle,
    Set,
    Transmit,
    Add,
    Delete,
    Sniff,
    List,
    Status,
    Update,
    Quit,
}

impl Verb {
    /// Keyword as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Toggle => "TOGGLE",
            Verb::Set => "SET",
            Verb::Transmit => "TRANSMIT",
            Verb::Add => "ADD",
            Verb::Delete => "DELETE",
            Verb::Sniff => "SNIFF",
            Verb::List => "LIST",
            Verb::Status => "STATUS",
            Verb::Update => "UPDATE",
            Verb::Quit => "Q",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device categories known to the hub
///
/// Sent on the wire as the integer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceType {
    Outlet = 0,
    PowerStrip = 1,
    Dimmable = 2,
    Cct = 3,
    Rgb = 4,
    Rgbw = 5,
    RgbCct = 6,
    Custom = 7,
}

impl DeviceType {
    pub fn id(&self) -> u8 {
        *self as u8
    }

    /// Whether `ADD` carries a trailing commands argument for this type
    ///
    /// Power strips carry a relay count, custom devices a comma-separated
    /// command list.
    pub fn takes_commands(&self) -> bool {
        matches!(self, DeviceType::PowerStrip | DeviceType::Custom)
    }

    fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => DeviceType::Outlet,
            1 => DeviceType::PowerStrip,
            2 => DeviceType::Dimmable,
            3 => DeviceType::Cct,
            4 => DeviceType::Rgb,
            5 => DeviceType::Rgbw,
            6 => DeviceType::RgbCct,
            7 => DeviceType::Custom,
            _ => return None,
        })
    }
}

impl FromStr for DeviceType {
    type Err = KlError;

    /// Parse an integer id or a case-insensitive type name
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();

        if let Ok(id) = lower.parse::<u8>() {
            return DeviceType::from_id(id)
                .ok_or_else(|| KlError::Usage(format!("unknown device type id {}", id)));
        }

        // Longer rgb names first, "rgb" prefixes both of them
        let device_type = match lower.as_str() {
            "outlet" | "toggleable" | "outlet/toggleable" => DeviceType::Outlet,
            "strip" | "powerstrip" => DeviceType::PowerStrip,
            "custom" => DeviceType::Custom,
            name if name.starts_with("dim") => DeviceType::Dimmable,
            name if name.starts_with("cct") => DeviceType::Cct,
            name if name.starts_with("rgbcct") => DeviceType::RgbCct,
            name if name.starts_with("rgbw") => DeviceType::Rgbw,
            name if name.starts_with("rgb") => DeviceType::Rgb,
            _ => return Err(KlError::Usage(format!("unknown device type {:?}", s))),
        };

        Ok(device_type)
    }
}

/// Field targeted by an `UPDATE` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateField {
    /// Rename the device
    Name,

    /// Move the device to a new MQTT topic
    Topic,

    /// Ask the hub to refresh the device state
    State,
}

impl UpdateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateField::Name => "NAME",
            UpdateField::Topic => "TOPIC",
            UpdateField::State => "STATE",
        }
    }

    /// Whether the request carries a new value
    pub fn takes_value(&self) -> bool {
        !matches!(self, UpdateField::State)
    }
}

/// A request to the hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Flip the power state of a device
    Toggle { name: String },

    /// Send a device command, e.g. `POWER ON` or `DIMMER 40`
    Set {
        name: String,
        command: String,
        arg: Option<String>,
    },

    /// Publish a raw message on an MQTT topic
    Transmit { topic: String, message: String },

    /// Transmit a raw RF code
    TransmitCode { code: i64, pulse: u32 },

    /// Register a topic-based device
    AddDevice {
        name: String,
        topic: String,
        device_type: DeviceType,
        commands: Option<String>,
    },

    /// Register an RF device with its ON/OFF code pair
    AddCodes {
        name: String,
        on_code: i64,
        off_code: i64,
        pulse: u32,
    },

    /// Remove a device
    Delete { name: String },

    /// Arm the hub's RF receiver to capture one code
    Sniff,

    /// List registered devices
    List,

    /// Dump the state of one device
    Status { name: String },

    /// Change a device record
    Update {
        field: UpdateField,
        name: String,
        value: Option<String>,
    },

    /// End the session
    Quit,
}

impl Command {
    /// Get the request verb
    pub fn verb(&self) -> Verb {
        match self {
            Command::Toggle { .. } => Verb::Toggle,
            Command::Set { .. } => Verb::Set,
            Command::Transmit { .. } | Command::TransmitCode { .. } => Verb::Transmit,
            Command::AddDevice { .. } | Command::AddCodes { .. } => Verb::Add,
            Command::Delete { .. } => Verb::Delete,
            Command::Sniff => Verb::Sniff,
            Command::List => Verb::List,
            Command::Status { .. } => Verb::Status,
            Command::Update { .. } => Verb::Update,
            Command::Quit => Verb::Quit,
        }
    }

    /// Device name the request is about, if any
    pub fn subject(&self) -> Option<&str> {
        match self {
            Command::Toggle { name }
            | Command::Set { name, .. }
            | Command::AddDevice { name, .. }
            | Command::AddCodes { name, .. }
            | Command::Delete { name }
            | Command::Status { name }
            | Command::Update { name, .. } => Some(name),
            Command::Transmit { topic, .. } => Some(topic),
            Command::TransmitCode { .. }
            | Command::Sniff
            | Command::List
            | Command::Quit => None,
        }
    }

    /// Protocol generation this request form belongs to, if it is not shared
    pub fn generation(&self) -> Option<Generation> {
        match self {
            Command::TransmitCode { .. } | Command::AddCodes { .. } | Command::Sniff => {
                Some(Generation::Rf)
            }
            Command::Transmit { .. } | Command::AddDevice { .. } => Some(Generation::Mqtt),
            _ => None,
        }
    }

    /// Reject a request form the hub at `version` would misparse
    ///
    /// RF and MQTT hubs reuse `ADD` and `TRANSMIT` with different argument
    /// lists, so a mismatched request would register or send garbage.
    pub fn check_generation(&self, version: ProtocolVersion) -> Result<()> {
        match self.generation() {
            Some(needed) if needed != version.generation() => Err(KlError::Usage(format!(
                "{} needs an {} hub, configured protocol is {}",
                self.form(),
                needed,
                version
            ))),
            _ => Ok(()),
        }
    }

    fn form(&self) -> &'static str {
        match self {
            Command::TransmitCode { .. } => "TRANSMIT <code> <pulse>",
            Command::Transmit { .. } => "TRANSMIT <topic> <message>",
            Command::AddCodes { .. } => "ADD <name> <on> <off> <pulse>",
            Command::AddDevice { .. } => "ADD <name> <topic> <type>",
            other => other.verb().as_str(),
        }
    }

    /// Check that every argument fits in one wire token
    ///
    /// Names, topics and values travel space-separated, so they must be
    /// non-empty and free of whitespace.
    pub fn validate(&self) -> Result<()> {
        match self {
            Command::Toggle { name } | Command::Delete { name } | Command::Status { name } => {
                check_token("device name", name)
            }
            Command::Set { name, command, arg } => {
                check_token("device name", name)?;
                check_token("command", command)?;
                arg.as_deref().map_or(Ok(()), |arg| check_token("argument", arg))
            }
            Command::Transmit { topic, message } => {
                check_token("topic", topic)?;
                check_token("message", message)
            }
            Command::TransmitCode { pulse, .. } => check_pulse(*pulse),
            Command::AddDevice {
                name,
                topic,
                device_type,
                commands,
            } => {
                check_token("device name", name)?;
                check_token("topic", topic)?;
                match (device_type.takes_commands(), commands) {
                    (true, Some(commands)) => check_token("commands", commands),
                    (true, None) => Err(KlError::Usage(format!(
                        "device type {:?} needs a commands argument",
                        device_type
                    ))),
                    (false, Some(_)) => Err(KlError::Usage(format!(
                        "device type {:?} takes no commands argument",
                        device_type
                    ))),
                    (false, None) => Ok(()),
                }
            }
            Command::AddCodes { name, pulse, .. } => {
                check_token("device name", name)?;
                check_pulse(*pulse)
            }
            Command::Update { field, name, value } => {
                check_token("device name", name)?;
                match (field.takes_value(), value) {
                    (true, Some(value)) => check_token("new value", value),
                    (true, None) => Err(KlError::Usage(format!(
                        "UPDATE {} needs a new value",
                        field.as_str()
                    ))),
                    (false, Some(_)) => Err(KlError::Usage(format!(
                        "UPDATE {} takes no value",
                        field.as_str()
                    ))),
                    (false, None) => Ok(()),
                }
            }
            Command::Sniff | Command::List | Command::Quit => Ok(()),
        }
    }
}

fn check_token(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(KlError::Usage(format!("{} must not be empty", what)));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(KlError::Usage(format!(
            "{} must not contain whitespace: {:?}",
            what, value
        )));
    }
    Ok(())
}

fn check_pulse(pulse: u32) -> Result<()> {
    if pulse == 0 {
        return Err(KlError::Usage("pulse length must be positive".to_string()));
    }
    Ok(())
}
