//! ManaShark core library: ManaPlus game traffic decoding.
//!
//! The crate turns TCP payloads exchanged between a ManaPlus client and its
//! server into typed events. Decoding is byte-oriented and side-effect free:
//! `protocols` knows the wire layouts, `render` turns events into lines, and
//! all file I/O stays in `source`. `session` wires them together to replay a
//! capture offline.
//!
//! Invariants:
//! - A payload is a back-to-back run of records, each a 2-byte little-endian
//!   opcode followed by the fixed fields its origin's table declares.
//! - Decoding never emits a partial event; it stops on the first unknown
//!   opcode or truncated record and reports why.
//! - Opcode tables are immutable, so decodes may run on any thread.
//!
//! # Examples
//! ```
//! use manashark_core::{Origin, decode, render};
//!
//! let decoded = decode(Origin::Node, &[0x7d, 0x00, 0x7d, 0x00]);
//! assert!(decoded.outcome.is_complete());
//! assert_eq!(render(&decoded.events[0]), "--> Scenario change");
//! ```

pub mod config;
mod protocols;
pub mod render;
pub mod session;
mod source;

pub use config::{ConfigError, Settings};
pub use protocols::common::{ByteCursor, Underflow};
pub use protocols::manaplus::layout::{
    FieldKind, FieldSpec, IntWidth, LookupTable, OPCODE_LEN, RecordSpec, format_bytes,
};
pub use protocols::manaplus::table::{lookup, records};
pub use protocols::manaplus::{
    DecodeError, Decoded, Decoder, Event, EventField, Origin, Outcome, ParseOriginError, decode,
};
pub use render::{Renderer, Style, render};
pub use session::{
    DecodedSegment, ReplayError, ReplaySummary, SessionFilter, TcpSegment, parse_tcp_segment,
    replay_pcap_file, replay_source,
};
pub use source::{CapturedFrame, FrameSource, PcapFileSource, SourceError};
