use thiserror::Error;

use super::layout::format_bytes;
use super::origin::Origin;
use crate::protocols::common::cursor::Underflow;

/// Reasons a decode pass stopped before consuming the whole payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer than two bytes were left where an opcode was expected.
    #[error("payload underflow at offset {offset}: {source}")]
    Underflow {
        offset: usize,
        #[source]
        source: Underflow,
    },
    /// The side's table has no layout for this opcode.
    #[error("unknown {origin} opcode 0x{opcode:04x} at offset {offset}")]
    UnknownOpcode {
        origin: Origin,
        opcode: i16,
        offset: usize,
        payload: Vec<u8>,
    },
    /// The opcode is known but its fields run past the end of the payload.
    #[error("truncated {origin} record 0x{opcode:04x}: need {needed} bytes, {remaining} remaining")]
    TruncatedRecord {
        origin: Origin,
        opcode: i16,
        needed: usize,
        remaining: usize,
    },
}

impl DecodeError {
    pub fn opcode(&self) -> Option<i16> {
        match self {
            DecodeError::Underflow { .. } => None,
            DecodeError::UnknownOpcode { opcode, .. }
            | DecodeError::TruncatedRecord { opcode, .. } => Some(*opcode),
        }
    }

    /// Bytes left undecoded when an unknown opcode stopped the pass, opcode
    /// included.
    pub fn undecoded(&self) -> Option<&[u8]> {
        match self {
            DecodeError::UnknownOpcode {
                offset, payload, ..
            } => payload.get(*offset..),
            _ => None,
        }
    }

    pub fn payload_hex(&self) -> Option<String> {
        match self {
            DecodeError::UnknownOpcode { payload, .. } => Some(format_bytes(payload)),
            _ => None,
        }
    }
}
