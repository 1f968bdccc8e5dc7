use serde::Serialize;
use tracing::{debug, trace};

use super::error::DecodeError;
use super::layout::RecordSpec;
use super::origin::Origin;
use super::table;
use crate::protocols::common::cursor::ByteCursor;

/// One rendered field of a decoded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventField {
    /// Caption; empty for fields shown as a bare value.
    pub label: &'static str,
    pub value: String,
}

/// One fully decoded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub origin: Origin,
    pub opcode: i16,
    pub title: &'static str,
    pub fields: Vec<EventField>,
}

/// Lazy decoder over one payload.
///
/// Yields one `Ok(Event)` per record. When the pass stops early it yields a
/// single `Err` and then ends; a clean end of payload simply ends the
/// iteration.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    origin: Origin,
    payload: &'a [u8],
    cursor: ByteCursor<'a>,
    done: bool,
}

impl<'a> Decoder<'a> {
    pub fn new(origin: Origin, payload: &'a [u8]) -> Self {
        Self {
            origin,
            payload,
            cursor: ByteCursor::new(payload),
            done: false,
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    fn next_record(&mut self) -> Result<Event, DecodeError> {
        let offset = self.cursor.offset();
        let opcode = self
            .cursor
            .take_i16_le()
            .map_err(|source| DecodeError::Underflow { offset, source })?;

        let Some(spec) = table::lookup(self.origin, opcode) else {
            debug!(origin = %self.origin, opcode, offset, "unknown opcode, stopping");
            return Err(DecodeError::UnknownOpcode {
                origin: self.origin,
                opcode,
                offset,
                payload: self.payload.to_vec(),
            });
        };

        let event = read_record(&mut self.cursor, self.origin, opcode, spec)?;
        trace!(origin = %self.origin, opcode, title = event.title, "decoded record");
        Ok(event)
    }
}

impl Iterator for Decoder<'_> {
    type Item = Result<Event, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor.is_empty() {
            return None;
        }
        let item = self.next_record();
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

impl std::iter::FusedIterator for Decoder<'_> {}

/// Reads the record body in one bounds check so no partial event escapes.
fn read_record(
    cursor: &mut ByteCursor<'_>,
    origin: Origin,
    opcode: i16,
    spec: &'static RecordSpec,
) -> Result<Event, DecodeError> {
    let needed = spec.width();
    let mut body = cursor
        .take(needed)
        .map(ByteCursor::new)
        .map_err(|underflow| {
            debug!(%origin, opcode, needed, remaining = underflow.remaining, "truncated record");
            DecodeError::TruncatedRecord {
                origin,
                opcode,
                needed,
                remaining: underflow.remaining,
            }
        })?;

    let mut fields = Vec::with_capacity(spec.fields.len());
    for field in spec.fields {
        let bytes = body
            .take(field.kind.width())
            .map_err(|underflow| DecodeError::TruncatedRecord {
                origin,
                opcode,
                needed,
                remaining: underflow.remaining,
            })?;
        fields.push(EventField {
            label: field.label,
            value: field.kind.render(bytes),
        });
    }

    Ok(Event {
        origin,
        opcode,
        title: spec.title,
        fields,
    })
}

/// How a decode pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every byte belonged to a known record.
    Complete,
    Stopped(DecodeError),
}

impl Outcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Outcome::Complete)
    }

    pub fn error(&self) -> Option<&DecodeError> {
        match self {
            Outcome::Complete => None,
            Outcome::Stopped(err) => Some(err),
        }
    }
}

/// Eager result of decoding one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub events: Vec<Event>,
    pub outcome: Outcome,
}

/// Decode `payload` as sent by `origin`.
///
/// Events decoded before a stop are kept; the record that caused the stop
/// never produces an event.
pub fn decode(origin: Origin, payload: &[u8]) -> Decoded {
    let mut events = Vec::new();
    let mut outcome = Outcome::Complete;
    for item in Decoder::new(origin, payload) {
        match item {
            Ok(event) => events.push(event),
            Err(err) => outcome = Outcome::Stopped(err),
        }
    }
    Decoded { events, outcome }
}
