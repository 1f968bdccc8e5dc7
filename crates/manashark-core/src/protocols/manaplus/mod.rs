//! ManaPlus game traffic decoding.
//!
//! Every payload is a run of records, each an `i16` little-endian opcode
//! followed by a fixed-width body whose layout depends on the opcode and on
//! which side sent it. Host and node traffic use separate tables.
//!
//! Decoding walks the payload with a single cursor in a loop and stops at the
//! first opcode it cannot size, since records carry no length prefix. Layouts
//! live in `layout` and `table`; the loop lives in `parser`.

pub mod error;
pub mod layout;
pub mod origin;
pub mod parser;
pub mod table;

pub use error::DecodeError;
pub use origin::{Origin, ParseOriginError};
pub use parser::{Decoded, Decoder, Event, EventField, Outcome, decode};
