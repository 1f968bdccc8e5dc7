use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader,
    traits::PcapReaderIterator,
};
use tracing::debug;

use crate::source::{CapturedFrame, FrameSource, SourceError};

use super::error::PcapSourceError;
use super::layout::PCAP_READER_BUFFER_SIZE;
use super::reader::{
    is_pcapng_magic, legacy_ts_to_seconds, linktype_for_interface, pcapng_ts_to_seconds,
    read_magic_and_rewind,
};

/// Frames from a legacy PCAP or PCAPNG capture, in file order.
pub struct PcapFileSource<R: Read = File> {
    container: Container<R>,
}

enum Container<R: Read> {
    Legacy {
        reader: LegacyPcapReader<R>,
        linktype: Option<Linktype>,
    },
    Ng {
        reader: PcapNGReader<R>,
        interfaces: Vec<Linktype>,
    },
}

impl PcapFileSource<File> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        Self::from_reader(File::open(path)?)
    }
}

impl<R: Read + Seek> PcapFileSource<R> {
    pub fn from_reader(inner: R) -> Result<Self, SourceError> {
        Ok(Self {
            container: open_container(inner)?,
        })
    }
}

fn open_container<R: Read + Seek>(mut inner: R) -> Result<Container<R>, PcapSourceError> {
    let magic = read_magic_and_rewind(&mut inner)?;
    if is_pcapng_magic(&magic) {
        debug!("opening pcapng capture");
        let reader = PcapNGReader::new(PCAP_READER_BUFFER_SIZE, inner)
            .map_err(|e| pcap_error("pcapng reader init", e))?;
        Ok(Container::Ng {
            reader,
            interfaces: Vec::new(),
        })
    } else {
        debug!("opening legacy pcap capture");
        let reader = LegacyPcapReader::new(PCAP_READER_BUFFER_SIZE, inner)
            .map_err(|e| pcap_error("pcap reader init", e))?;
        Ok(Container::Legacy {
            reader,
            linktype: None,
        })
    }
}

impl<R: Read> FrameSource for PcapFileSource<R> {
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>, SourceError> {
        let frame = match &mut self.container {
            Container::Legacy { reader, linktype } => {
                next_block(reader, "pcap", |block| match block {
                    PcapBlockOwned::LegacyHeader(header) => {
                        *linktype = Some(header.network);
                        None
                    }
                    PcapBlockOwned::Legacy(packet) => Some(CapturedFrame {
                        ts: Some(legacy_ts_to_seconds(packet.ts_sec, packet.ts_usec)),
                        linktype: linktype.unwrap_or(Linktype::ETHERNET),
                        data: packet.data.to_vec(),
                    }),
                    _ => None,
                })
            }
            Container::Ng { reader, interfaces } => {
                next_block(reader, "pcapng", |block| match block {
                    PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                        interfaces.push(intf.linktype);
                        None
                    }
                    PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => Some(CapturedFrame {
                        ts: Some(pcapng_ts_to_seconds(packet.ts_high, packet.ts_low)),
                        linktype: linktype_for_interface(interfaces.as_slice(), packet.if_id),
                        data: packet.data.to_vec(),
                    }),
                    _ => None,
                })
            }
        };
        Ok(frame?)
    }
}

/// Walks blocks until `on_block` yields a frame or the capture ends.
fn next_block<P, F>(
    reader: &mut P,
    container: &'static str,
    mut on_block: F,
) -> Result<Option<CapturedFrame>, PcapSourceError>
where
    P: PcapReaderIterator,
    F: FnMut(PcapBlockOwned<'_>) -> Option<CapturedFrame>,
{
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                let frame = on_block(block);
                reader.consume(offset);
                if frame.is_some() {
                    return Ok(frame);
                }
            }
            Err(PcapError::Eof) => return Ok(None),
            Err(PcapError::Incomplete(_)) => {
                reader.refill().map_err(|e| pcap_error(container, e))?;
            }
            Err(e) => return Err(pcap_error(container, e)),
        }
    }
}

fn pcap_error(context: &'static str, err: impl std::fmt::Display) -> PcapSourceError {
    PcapSourceError::Pcap {
        context,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pcap_parser::Linktype;

    use super::PcapFileSource;
    use crate::source::{FrameSource, SourceError};

    fn legacy_capture(frames: &[(u32, u32, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&4u16.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&65535u32.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
        for (sec, usec, data) in frames {
            out.extend_from_slice(&sec.to_le_bytes());
            out.extend_from_slice(&usec.to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(data);
        }
        out
    }

    #[test]
    fn legacy_frames_in_order() {
        let bytes = legacy_capture(&[(10, 500_000, &[1, 2, 3]), (11, 0, &[4])]);
        let mut source = PcapFileSource::from_reader(Cursor::new(bytes)).unwrap();

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.data, vec![1, 2, 3]);
        assert_eq!(first.linktype, Linktype::ETHERNET);
        assert!((first.ts.unwrap() - 10.5).abs() < 1e-9);

        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.data, vec![4]);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn empty_capture_has_no_frames() {
        let bytes = legacy_capture(&[]);
        let mut source = PcapFileSource::from_reader(Cursor::new(bytes)).unwrap();
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn short_file_is_an_io_error() {
        let err = PcapFileSource::from_reader(Cursor::new(vec![0xd4, 0xc3])).err();
        assert!(matches!(err, Some(SourceError::Io(_))));
    }
}
