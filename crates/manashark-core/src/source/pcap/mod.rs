//! PCAP/PCAPNG frame source.
//!
//! Detects the container from its magic bytes and walks blocks with
//! `pcap-parser`, keeping link types per interface.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::PcapFileSource;
