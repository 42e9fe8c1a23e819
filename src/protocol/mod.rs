//! Protocol Module
//!
//! Defines the line protocol spoken with the hub.
//!
//! ## Protocol Format
//!
//! ### Request Format
//! ```text
//! ┌──────────┬─────────────────────────┬──────────────┐
//! │   VERB   │  ARG1 ARG2 ... (space)  │ KL/<maj.min> │ \n
//! └──────────┴─────────────────────────┴──────────────┘
//! ```
//!
//! ### Verbs
//! - TOGGLE, SET, TRANSMIT, ADD, DELETE, SNIFF, LIST, STATUS, UPDATE
//! - Q: end of session, no version token
//!
//! ### Reply Format
//! ```text
//! ┌──────────────┬──────────┬──────────────────────────┐
//! │ KL/<maj.min> │  Status  │   tokens ... (space)     │ \n
//! └──────────────┴──────────┴──────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 2xx: success (200 generic, 201-210 per verb)
//! - 4xx: request rejected (401 no permission, 404 no such device, ...)
//! - 5xx: hub failure

mod codec;
mod command;
mod reply;
mod schema;
mod version;

pub use codec::{
    decode_reply, encode_command, read_block, read_line, read_reply, write_command, BlockEnd,
    QUIT_LINE, SENTINEL,
};
pub use command::{Command, DeviceType, UpdateField, Verb};
pub use reply::{Reply, Status};
pub use schema::{Fields, ReplySchema, Slot, LIST_HEADER, SNIFF_CAPTURE};
pub use version::{Generation, ProtocolVersion, VERSION_PREFIX};
