//! Reply definitions
//!
//! A decoded hub reply line: `<tag> <status> <tokens...>`.

use std::fmt;

/// Reply status codes
///
/// Codes the hub is known to send get their own variant. Anything else is
/// kept as `Unrecognized` so newer hubs can introduce codes without breaking
/// the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    StateSet,
    DeviceAdded,
    DeviceDeleted,
    DeviceList,
    Transmitted,
    DeviceStatus,
    Goodbye,
    NameUpdated,
    TopicUpdated,
    StateUpdated,
    BadRequest,
    NoPermission,
    DeleteFailed,
    AddFailed,
    NoSuchDevice,
    InvalidCommand,
    UnknownEncoding,
    DuplicateDevice,
    MissingArguments,
    InternalError,
    TimedOut,
    CapacityFull,
    Unrecognized(u16),
}

impl Status {
    pub fn from_code(code: u16) -> Self {
        match code {
            200 => Status::Ok,
            201 => Status::StateSet,
            202 => Status::DeviceAdded,
            203 => Status::DeviceDeleted,
            204 => Status::DeviceList,
            205 => Status::Transmitted,
            206 => Status::DeviceStatus,
            207 => Status::Goodbye,
            208 => Status::NameUpdated,
            209 => Status::TopicUpdated,
            210 => Status::StateUpdated,
            400 => Status::BadRequest,
            401 => Status::NoPermission,
            402 => Status::DeleteFailed,
            403 => Status::AddFailed,
            404 => Status::NoSuchDevice,
            405 => Status::InvalidCommand,
            406 => Status::UnknownEncoding,
            408 => Status::DuplicateDevice,
            409 => Status::MissingArguments,
            500 => Status::InternalError,
            504 => Status::TimedOut,
            505 => Status::CapacityFull,
            other => Status::Unrecognized(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::StateSet => 201,
            Status::DeviceAdded => 202,
            Status::DeviceDeleted => 203,
            Status::DeviceList => 204,
            Status::Transmitted => 205,
            Status::DeviceStatus => 206,
            Status::Goodbye => 207,
            Status::NameUpdated => 208,
            Status::TopicUpdated => 209,
            Status::StateUpdated => 210,
            Status::BadRequest => 400,
            Status::NoPermission => 401,
            Status::DeleteFailed => 402,
            Status::AddFailed => 403,
            Status::NoSuchDevice => 404,
            Status::InvalidCommand => 405,
            Status::UnknownEncoding => 406,
            Status::DuplicateDevice => 408,
            Status::MissingArguments => 409,
            Status::InternalError => 500,
            Status::TimedOut => 504,
            Status::CapacityFull => 505,
            Status::Unrecognized(code) => *code,
        }
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code())
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Status::Unrecognized(_))
    }

    /// Short description used in rejection messages
    pub fn describe(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::StateSet => "state set",
            Status::DeviceAdded => "device added",
            Status::DeviceDeleted => "device deleted",
            Status::DeviceList => "device list",
            Status::Transmitted => "transmitted",
            Status::DeviceStatus => "device status",
            Status::Goodbye => "goodbye",
            Status::NameUpdated => "name updated",
            Status::TopicUpdated => "topic updated",
            Status::StateUpdated => "state updated",
            Status::BadRequest => "bad request",
            Status::NoPermission => "no permission",
            Status::DeleteFailed => "unable to delete device",
            Status::AddFailed => "unable to add device",
            Status::NoSuchDevice => "no such device",
            Status::InvalidCommand => "invalid command",
            Status::UnknownEncoding => "unknown encoding",
            Status::DuplicateDevice => "device already exists",
            Status::MissingArguments => "missing arguments",
            Status::InternalError => "internal hub error",
            Status::TimedOut => "timed out",
            Status::CapacityFull => "hub is at client capacity",
            Status::Unrecognized(_) => "unrecognized status",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.describe())
    }
}

/// A decoded reply line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Leading token, normally `KL/<major>.<minor>`
    pub tag: String,

    /// Status code
    pub status: Status,

    /// Remaining whitespace-separated tokens, in order
    pub tokens: Vec<String>,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Human-readable remainder of the line
    pub fn reason(&self) -> String {
        self.tokens.join(" ")
    }
}
