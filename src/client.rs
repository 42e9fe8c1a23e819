//! Hub Client
//!
//! Runs one logical command against the hub and checks the outcome.
//!
//! ## Responsibilities
//! - Send the request and read its reply (and body, for LIST/STATUS)
//! - Decide success per verb: each verb accepts `200` plus its own code
//! - Turn any other status into a `ProtocolRejection` with a verb-specific message
//! - Hand add-by-scan and manual RF adds to the learning engine

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::TcpStream;

use crate::config::Config;
use crate::error::{KlError, Result};
use crate::learn::{self, DeviceAddRequest, LearnedCode};
use crate::network::{HubSession, Session};
use crate::protocol::{
    BlockEnd, Command, DeviceType, Reply, Status, UpdateField, LIST_HEADER,
};

/// Result of a plain command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Single-line reply
    Done(Reply),

    /// Header reply plus body lines
    Lines { header: Reply, lines: Vec<String> },
}

impl Outcome {
    pub fn reply(&self) -> &Reply {
        match self {
            Outcome::Done(reply) => reply,
            Outcome::Lines { header, .. } => header,
        }
    }
}

/// Statuses that count as success for `command`
pub fn accepted_statuses(command: &Command) -> &'static [Status] {
    match command {
        Command::Toggle { .. } => &[Status::Ok],
        Command::Set { .. } => &[Status::Ok, Status::StateSet],
        Command::Transmit { .. } | Command::TransmitCode { .. } => {
            &[Status::Ok, Status::Transmitted]
        }
        Command::AddDevice { .. } | Command::AddCodes { .. } => &[Status::Ok, Status::DeviceAdded],
        Command::Delete { .. } => &[Status::Ok, Status::DeviceDeleted],
        Command::Sniff => &[Status::Ok],
        Command::List => &[Status::Ok, Status::DeviceList],
        Command::Status { .. } => &[Status::Ok, Status::DeviceStatus],
        Command::Update { field, .. } => match field {
            UpdateField::Name => &[Status::Ok, Status::NameUpdated],
            UpdateField::Topic => &[Status::Ok, Status::TopicUpdated],
            UpdateField::State => &[Status::Ok, Status::StateUpdated],
        },
        Command::Quit => &[Status::Ok, Status::Goodbye],
    }
}

/// Human message for a rejected `command`
pub fn rejection_message(command: &Command, status: Status) -> String {
    let subject = command.subject().unwrap_or("");

    match command {
        Command::Toggle { .. } => format!("unable to toggle device {}", subject),
        Command::Set { command: cmd, .. } => {
            format!("unable to set {} on device {}", cmd.to_ascii_uppercase(), subject)
        }
        Command::Transmit { .. } => format!("unable to transmit to topic {}", subject),
        Command::TransmitCode { code, .. } => format!("unable to transmit code {}", code),
        Command::AddDevice { .. } | Command::AddCodes { .. } => {
            format!("unable to add device {}", subject)
        }
        Command::Delete { .. } => format!("unable to delete device {}", subject),
        Command::Sniff => "unable to scan".to_string(),
        Command::List => "unable to list devices".to_string(),
        Command::Status { .. } if status == Status::NoPermission => {
            format!("no permission to read status of {}", subject)
        }
        Command::Status { .. } => format!("unable to get status of {}", subject),
        Command::Update { field, .. } => format!(
            "unable to update {} of device {}",
            field.as_str().to_ascii_lowercase(),
            subject
        ),
        Command::Quit => "hub did not acknowledge quit".to_string(),
    }
}

/// Client for one invocation
pub struct HubClient<R: BufRead, W: Write> {
    session: Session<R, W>,
}

impl HubClient<BufReader<TcpStream>, BufWriter<TcpStream>> {
    /// Open a connection to the configured hub
    pub fn connect(config: &Config) -> Result<Self> {
        Ok(Self::new(HubSession::connect(config)?))
    }
}

impl<R: BufRead, W: Write> HubClient<R, W> {
    pub fn new(session: Session<R, W>) -> Self {
        Self { session }
    }

    /// Underlying session
    pub fn session_mut(&mut self) -> &mut Session<R, W> {
        &mut self.session
    }

    /// Run a plain command
    ///
    /// `LIST` and `STATUS` also read their body.
    pub fn execute(&mut self, command: &Command) -> Result<Outcome> {
        let reply = self.session.request(command)?;
        Self::check(command, &reply)?;

        match command {
            Command::List => {
                let end = match LIST_HEADER.extract(&reply) {
                    Ok(fields) => BlockEnd::Count(fields.parse("count")?),
                    Err(_) => {
                        tracing::debug!("list header without count, reading to sentinel");
                        BlockEnd::Sentinel
                    }
                };
                let lines = self.session.read_block(end)?;
                Ok(Outcome::Lines {
                    header: reply,
                    lines,
                })
            }
            Command::Status { .. } => {
                let lines = self.session.read_block(BlockEnd::Sentinel)?;
                Ok(Outcome::Lines {
                    header: reply,
                    lines,
                })
            }
            _ => Ok(Outcome::Done(reply)),
        }
    }

    // -------------------------------------------------------------------------
    // Per-verb helpers
    // -------------------------------------------------------------------------

    pub fn toggle(&mut self, name: &str) -> Result<Reply> {
        self.single(Command::Toggle {
            name: name.to_string(),
        })
    }

    pub fn set(&mut self, name: &str, command: &str, arg: Option<&str>) -> Result<Reply> {
        self.single(Command::Set {
            name: name.to_string(),
            command: command.to_string(),
            arg: arg.map(str::to_string),
        })
    }

    pub fn transmit(&mut self, topic: &str, message: &str) -> Result<Reply> {
        self.single(Command::Transmit {
            topic: topic.to_string(),
            message: message.to_string(),
        })
    }

    pub fn transmit_code(&mut self, code: i64, pulse: u32) -> Result<Reply> {
        self.single(Command::TransmitCode { code, pulse })
    }

    pub fn add_device(
        &mut self,
        name: &str,
        topic: &str,
        device_type: DeviceType,
        commands: Option<&str>,
    ) -> Result<Reply> {
        self.single(Command::AddDevice {
            name: name.to_string(),
            topic: topic.to_string(),
            device_type,
            commands: commands.map(str::to_string),
        })
    }

    pub fn delete(&mut self, name: &str) -> Result<Reply> {
        self.single(Command::Delete {
            name: name.to_string(),
        })
    }

    pub fn update(&mut self, field: UpdateField, name: &str, value: Option<&str>) -> Result<Reply> {
        self.single(Command::Update {
            field,
            name: name.to_string(),
            value: value.map(str::to_string),
        })
    }

    /// Registered devices, one line each
    pub fn list(&mut self) -> Result<Vec<String>> {
        self.lines(Command::List)
    }

    /// State lines of one device
    pub fn status(&mut self, name: &str) -> Result<Vec<String>> {
        self.lines(Command::Status {
            name: name.to_string(),
        })
    }

    // -------------------------------------------------------------------------
    // RF learning
    // -------------------------------------------------------------------------

    /// Sniff a remote and report what it sent
    pub fn scan(&mut self) -> Result<LearnedCode> {
        learn::scan(&mut self.session)
    }

    /// Sniff a remote and register the derived pair as `name`
    pub fn add_by_scan(&mut self, name: &str) -> Result<DeviceAddRequest> {
        learn::add_by_scan(&mut self.session, name)
    }

    /// Register `name` from one hand-entered code
    pub fn add_code(&mut self, name: &str, code: i64, pulse: u32) -> Result<DeviceAddRequest> {
        learn::add_manual(&mut self.session, name, code, pulse)
    }

    /// Register `name` from a hand-entered ON/OFF pair
    pub fn add_pair(
        &mut self,
        name: &str,
        on: i64,
        off: i64,
        pulse: u32,
    ) -> Result<DeviceAddRequest> {
        learn::add_pair(&mut self.session, name, on, off, pulse)
    }

    /// End the session
    pub fn close(self) -> Result<()> {
        self.session.close()
    }

    fn single(&mut self, command: Command) -> Result<Reply> {
        match self.execute(&command)? {
            Outcome::Done(reply) => Ok(reply),
            Outcome::Lines { header, .. } => Ok(header),
        }
    }

    fn lines(&mut self, command: Command) -> Result<Vec<String>> {
        match self.execute(&command)? {
            Outcome::Lines { lines, .. } => Ok(lines),
            Outcome::Done(_) => Ok(Vec::new()),
        }
    }

    fn check(command: &Command, reply: &Reply) -> Result<()> {
        if accepted_statuses(command).contains(&reply.status) {
            return Ok(());
        }

        let message = rejection_message(command, reply.status);
        tracing::warn!("{} rejected: {} ({})", command.verb(), message, reply.status);
        Err(KlError::rejection(command.verb(), reply.status, message))
    }
}
