use std::io::{Read, Seek, SeekFrom};

use pcap_parser::Linktype;

use super::error::PcapSourceError;
use super::layout;

/// Reads the four magic bytes and rewinds to the start.
///
/// # Errors
/// Returns `PcapSourceError::Io` when fewer than four bytes are available or
/// the reader cannot seek.
pub fn read_magic_and_rewind<R: Read + Seek>(reader: &mut R) -> Result<[u8; 4], PcapSourceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(magic)
}

pub fn is_pcapng_magic(magic: &[u8; 4]) -> bool {
    *magic == layout::PCAPNG_MAGIC
}

/// Link type of interface `if_id`; unknown interfaces are treated as Ethernet.
pub fn linktype_for_interface(interfaces: &[Linktype], if_id: u32) -> Linktype {
    interfaces
        .get(if_id as usize)
        .copied()
        .unwrap_or(Linktype::ETHERNET)
}

pub fn legacy_ts_to_seconds(ts_sec: u32, ts_usec: u32) -> f64 {
    f64::from(ts_sec) + f64::from(ts_usec) * 1e-6
}

/// PCAPNG timestamps are a 64-bit microsecond count split in two words.
pub fn pcapng_ts_to_seconds(ts_high: u32, ts_low: u32) -> f64 {
    let micros = (u64::from(ts_high) << 32) | u64::from(ts_low);
    micros as f64 * 1e-6
}
