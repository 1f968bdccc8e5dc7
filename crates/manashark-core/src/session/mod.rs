//! Offline session replay.
//!
//! Frames from a source are reduced to TCP segments, classified against the
//! configured server, and each matching payload is decoded on its own. There
//! is no stream reassembly: a segment is one decode pass.

pub mod error;
pub mod filter;
pub mod replay;
pub mod tcp;

pub use error::TcpError;
pub use filter::SessionFilter;
pub use replay::{DecodedSegment, ReplayError, ReplaySummary, replay_pcap_file, replay_source};
pub use tcp::{TcpSegment, parse_tcp_segment};
