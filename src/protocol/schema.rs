//! Reply schemas
//!
//! Replies that carry data put it at fixed positions after the status code.
//! A schema names those positions once and checks the label tokens around
//! them, so callers ask for `"code"` instead of indexing `tokens[1]`.
//!
//! ```text
//! KL/0.2 200 Code: 5592371 Pulse: 189
//!            ───── ─────── ────── ───
//!            label  code   label  pulse
//! ```

use std::str::FromStr;

use crate::error::{KlError, Result};
use super::Reply;

/// One position in a reply's token list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Fixed word, compared case-insensitively
    Label(&'static str),

    /// Named value
    Field(&'static str),
}

/// Layout of the tokens following the status code
#[derive(Debug, Clone, Copy)]
pub struct ReplySchema {
    name: &'static str,
    slots: &'static [Slot],
}

/// Second sniff reply: `Code: <code> Pulse: <pulse>`
pub const SNIFF_CAPTURE: ReplySchema = ReplySchema::new(
    "sniff capture",
    &[
        Slot::Label("Code:"),
        Slot::Field("code"),
        Slot::Label("Pulse:"),
        Slot::Field("pulse"),
    ],
);

/// `LIST` header: `Number of Devices <count>`
pub const LIST_HEADER: ReplySchema = ReplySchema::new(
    "list header",
    &[
        Slot::Label("Number"),
        Slot::Label("of"),
        Slot::Label("Devices"),
        Slot::Field("count"),
    ],
);

impl ReplySchema {
    pub const fn new(name: &'static str, slots: &'static [Slot]) -> Self {
        Self { name, slots }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Match `reply` against this schema
    ///
    /// Trailing tokens beyond the schema are ignored.
    pub fn extract<'a>(&self, reply: &'a Reply) -> Result<Fields<'a>> {
        if reply.tokens.len() < self.slots.len() {
            return Err(KlError::MalformedReply(format!(
                "{}: expected {} tokens after status, got {}",
                self.name,
                self.slots.len(),
                reply.tokens.len()
            )));
        }

        let mut values = Vec::new();
        for (position, (slot, token)) in self.slots.iter().zip(&reply.tokens).enumerate() {
            match slot {
                Slot::Label(label) => {
                    if !token.eq_ignore_ascii_case(label) {
                        return Err(KlError::MalformedReply(format!(
                            "{}: expected {:?} at token {}, got {:?}",
                            self.name, label, position, token
                        )));
                    }
                }
                Slot::Field(field) => values.push((*field, token.as_str())),
            }
        }

        Ok(Fields {
            schema: self.name,
            values,
        })
    }
}

/// Named values pulled out of a reply
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    schema: &'static str,
    values: Vec<(&'static str, &'a str)>,
}

impl<'a> Fields<'a> {
    /// Raw text of a field
    pub fn get(&self, field: &str) -> Result<&'a str> {
        self.values
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| *value)
            .ok_or_else(|| {
                KlError::MalformedReply(format!("{}: no field named {:?}", self.schema, field))
            })
    }

    /// Parse a field as a base-10 number
    pub fn parse<T: FromStr>(&self, field: &str) -> Result<T> {
        let raw = self.get(field)?;
        raw.parse().map_err(|_| {
            KlError::MalformedReply(format!(
                "{}: field {:?} is not a number: {:?}",
                self.schema, field, raw
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
