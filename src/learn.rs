//! Code Learning Module
//!
//! Learns an RF remote's code through the hub and stores it as an ON/OFF pair.
//!
//! ## Code Pairs
//! The transmitter tags each code in its low nibble and keeps the ON and OFF
//! codes of one button exactly 9 apart:
//!
//! ```text
//! ON  code: ...0011  (low nibble 3)
//! OFF code: ...1100  (low nibble 12) = ON code + 9
//! ```
//!
//! Any other low nibble means the capture is not one of these codes, and it is
//! never stored.
//!
//! ## Scan Flow
//! ```text
//! Idle ─SNIFF─▶ AwaitingArm ─200─▶ AwaitingCapture ─200─▶ Validating
//!                                                            │
//!        Done ◀─200/202─ AwaitingAddAck ◀─ADD─ Derived ◀─────┘
//! ```
//! Every other reply, and every invalid code, ends in `Failed`. Manual adds
//! enter at `Validating`.
//!
//! Only RF-generation hubs (before `KL/0.3`) sniff and take code pairs. On a
//! newer session the first request is refused before it is written.

use std::io::{BufRead, Write};
use std::mem;

use crate::error::{KlError, Result};
use crate::network::Session;
use crate::protocol::{Command, Status, Verb, SNIFF_CAPTURE};

/// Mask selecting the tag nibble
pub const NIBBLE_MASK: i64 = 0xF;

/// Tag of an ON code
pub const ON_NIBBLE: i64 = 0b0011;

/// Tag of an OFF code
pub const OFF_NIBBLE: i64 = 0b1100;

/// `off_code - on_code` for every pair
pub const CODE_OFFSET: i64 = 9;

// =============================================================================
// Codes
// =============================================================================

/// Which half of a pair a code is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRole {
    On,
    Off,
}

/// A raw code and pulse length as captured from a remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearnedCode {
    pub code: i64,
    pub pulse: u32,
}

/// Matching ON and OFF codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePair {
    pub on: i64,
    pub off: i64,
}

/// Classify a code by its low nibble
pub fn classify(code: i64) -> Option<CodeRole> {
    match code & NIBBLE_MASK {
        ON_NIBBLE => Some(CodeRole::On),
        OFF_NIBBLE => Some(CodeRole::Off),
        _ => None,
    }
}

/// Derive the full pair from either half
pub fn derive_pair(code: i64) -> Result<CodePair> {
    let invalid = || KlError::InvalidLearnedCode { code };

    match classify(code).ok_or_else(invalid)? {
        CodeRole::On => Ok(CodePair {
            on: code,
            off: code.checked_add(CODE_OFFSET).ok_or_else(invalid)?,
        }),
        CodeRole::Off => Ok(CodePair {
            on: code.checked_sub(CODE_OFFSET).ok_or_else(invalid)?,
            off: code,
        }),
    }
}

impl LearnedCode {
    pub fn new(code: i64, pulse: u32) -> Self {
        Self { code, pulse }
    }

    pub fn role(&self) -> Option<CodeRole> {
        classify(self.code)
    }

    pub fn pair(&self) -> Result<CodePair> {
        derive_pair(self.code)
    }
}

/// A validated RF device, ready to be sent as one `ADD`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddRequest {
    pub name: String,
    pub on_code: i64,
    pub off_code: i64,
    pub pulse: u32,
}

impl DeviceAddRequest {
    /// Validate `learned` and derive the missing half of its pair
    pub fn from_learned(name: impl Into<String>, learned: LearnedCode) -> Result<Self> {
        let pair = learned.pair()?;
        Ok(Self {
            name: name.into(),
            on_code: pair.on,
            off_code: pair.off,
            pulse: learned.pulse,
        })
    }

    /// Build from two manually entered codes
    ///
    /// The codes must be a real pair: `on` tagged ON and `off == on + 9`.
    pub fn from_codes(name: impl Into<String>, on: i64, off: i64, pulse: u32) -> Result<Self> {
        let pair = derive_pair(on)?;
        if classify(on) != Some(CodeRole::On) {
            return Err(KlError::InvalidLearnedCode { code: on });
        }
        if pair.off != off {
            return Err(KlError::InvalidLearnedCode { code: off });
        }
        Ok(Self {
            name: name.into(),
            on_code: on,
            off_code: off,
            pulse,
        })
    }

    pub fn to_command(&self) -> Command {
        Command::AddCodes {
            name: self.name.clone(),
            on_code: self.on_code,
            off_code: self.off_code,
            pulse: self.pulse,
        }
    }
}

// =============================================================================
// Learning State Machine
// =============================================================================

/// Where a learning run stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearnState {
    Idle,
    AwaitingArm,
    AwaitingCapture,
    Validating(LearnedCode),
    Derived(DeviceAddRequest),
    AwaitingAddAck(DeviceAddRequest),
    Done(DeviceAddRequest),
    Failed,
}

impl LearnState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LearnState::Done(_) | LearnState::Failed)
    }
}

/// Drives one add-by-scan (or manual add) over a session
pub struct CodeLearner<'s, R: BufRead, W: Write> {
    session: &'s mut Session<R, W>,
    name: String,
    state: LearnState,
}

impl<'s, R: BufRead, W: Write> CodeLearner<'s, R, W> {
    /// Start a scan for device `name`
    pub fn new(session: &'s mut Session<R, W>, name: impl Into<String>) -> Self {
        Self {
            session,
            name: name.into(),
            state: LearnState::Idle,
        }
    }

    /// Start from a code the caller already has, skipping the sniff
    pub fn from_code(
        session: &'s mut Session<R, W>,
        name: impl Into<String>,
        learned: LearnedCode,
    ) -> Self {
        Self {
            session,
            name: name.into(),
            state: LearnState::Validating(learned),
        }
    }

    /// Start from an already validated request, skipping sniff and validation
    pub fn from_request(session: &'s mut Session<R, W>, request: DeviceAddRequest) -> Self {
        Self {
            session,
            name: request.name.clone(),
            state: LearnState::Derived(request),
        }
    }

    pub fn state(&self) -> &LearnState {
        &self.state
    }

    /// Perform one transition
    ///
    /// On error the learner is left in `Failed`.
    pub fn step(&mut self) -> Result<()> {
        let current = mem::replace(&mut self.state, LearnState::Failed);
        let next = self.transition(current)?;
        tracing::debug!("learn {}: -> {:?}", self.name, next);
        self.state = next;
        Ok(())
    }

    /// Run to completion
    pub fn run(mut self) -> Result<DeviceAddRequest> {
        while !self.state.is_terminal() {
            self.step()?;
        }

        match self.state {
            LearnState::Done(request) => Ok(request),
            _ => Err(KlError::Usage(format!(
                "learning for {} already failed",
                self.name
            ))),
        }
    }

    /// Run the sniff half only and return the captured code
    pub fn sniff(mut self) -> Result<LearnedCode> {
        loop {
            match &self.state {
                LearnState::Validating(learned) => return Ok(*learned),
                LearnState::Idle | LearnState::AwaitingArm | LearnState::AwaitingCapture => {
                    self.step()?
                }
                _ => {
                    return Err(KlError::Usage(format!(
                        "sniff for {} is already past capture",
                        self.name
                    )))
                }
            }
        }
    }

    fn transition(&mut self, state: LearnState) -> Result<LearnState> {
        match state {
            LearnState::Idle => {
                self.session.send(&Command::Sniff)?;
                Ok(LearnState::AwaitingArm)
            }

            LearnState::AwaitingArm => {
                let reply = self.session.read_reply()?;
                if reply.status != Status::Ok {
                    tracing::warn!("hub refused to sniff: {}", reply.status);
                    return Err(KlError::rejection(Verb::Sniff, reply.status, "unable to scan"));
                }
                Ok(LearnState::AwaitingCapture)
            }

            LearnState::AwaitingCapture => {
                let reply = self.session.read_reply()?;
                if reply.status != Status::Ok {
                    let message = match reply.status {
                        Status::TimedOut => "timed out waiting for a remote",
                        _ => "unknown encoding",
                    };
                    tracing::warn!("sniff capture failed: {}", reply.status);
                    return Err(KlError::rejection(Verb::Sniff, reply.status, message));
                }

                let fields = SNIFF_CAPTURE.extract(&reply)?;
                let learned = LearnedCode::new(fields.parse("code")?, fields.parse("pulse")?);
                tracing::info!("captured code {} pulse {}", learned.code, learned.pulse);
                Ok(LearnState::Validating(learned))
            }

            LearnState::Validating(learned) => {
                let request = DeviceAddRequest::from_learned(self.name.clone(), learned)
                    .map_err(|e| {
                        tracing::warn!("code {} is invalid, not adding", learned.code);
                        e
                    })?;
                Ok(LearnState::Derived(request))
            }

            LearnState::Derived(request) => {
                self.session.send(&request.to_command())?;
                Ok(LearnState::AwaitingAddAck(request))
            }

            LearnState::AwaitingAddAck(request) => {
                let reply = self.session.read_reply()?;
                match reply.status {
                    Status::Ok | Status::DeviceAdded => Ok(LearnState::Done(request)),
                    status => Err(KlError::rejection(
                        Verb::Add,
                        status,
                        format!("unable to add device {}", request.name),
                    )),
                }
            }

            terminal @ (LearnState::Done(_) | LearnState::Failed) => Ok(terminal),
        }
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Learn a code from a remote and register it as device `name`
pub fn add_by_scan<R: BufRead, W: Write>(
    session: &mut Session<R, W>,
    name: &str,
) -> Result<DeviceAddRequest> {
    CodeLearner::new(session, name).run()
}

/// Capture one code from a remote without registering anything
pub fn scan<R: BufRead, W: Write>(session: &mut Session<R, W>) -> Result<LearnedCode> {
    CodeLearner::new(session, "scan").sniff()
}

/// Register device `name` from a code entered by hand
///
/// The code gets the same nibble check as a scanned one; an invalid code
/// never reaches the hub.
pub fn add_manual<R: BufRead, W: Write>(
    session: &mut Session<R, W>,
    name: &str,
    code: i64,
    pulse: u32,
) -> Result<DeviceAddRequest> {
    CodeLearner::from_code(session, name, LearnedCode::new(code, pulse)).run()
}

/// Register device `name` from a hand-entered ON/OFF pair
pub fn add_pair<R: BufRead, W: Write>(
    session: &mut Session<R, W>,
    name: &str,
    on: i64,
    off: i64,
    pulse: u32,
) -> Result<DeviceAddRequest> {
    let request = DeviceAddRequest::from_codes(name, on, off, pulse)?;
    CodeLearner::from_request(session, request).run()
}
