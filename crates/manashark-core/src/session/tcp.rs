use std::net::IpAddr;

use etherparse::{NetSlice, SlicedPacket, TransportSlice};
use pcap_parser::Linktype;

use super::error::TcpError;

/// TCP segment with both endpoints and its (possibly empty) payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSegment<'a> {
    pub src_ip: IpAddr,
    pub src_port: u16,
    pub dst_ip: IpAddr,
    pub dst_port: u16,
    pub payload: &'a [u8],
}

/// Extracts the TCP segment carried by a link-layer frame.
///
/// Returns `Ok(None)` for link types other than Ethernet and raw IP, for
/// frames without an IP layer, and for non-TCP transports.
pub fn parse_tcp_segment(
    linktype: Linktype,
    frame: &[u8],
) -> Result<Option<TcpSegment<'_>>, TcpError> {
    let sliced = match linktype {
        Linktype::ETHERNET => {
            SlicedPacket::from_ethernet(frame).map_err(|e| TcpError::Slice(e.to_string()))?
        }
        Linktype::RAW => SlicedPacket::from_ip(frame).map_err(|e| TcpError::Slice(e.to_string()))?,
        _ => return Ok(None),
    };

    let Some(net) = sliced.net else {
        return Ok(None);
    };
    let Some(TransportSlice::Tcp(tcp)) = sliced.transport else {
        return Ok(None);
    };

    let (src_ip, dst_ip) = match &net {
        NetSlice::Ipv4(ipv4) => (
            IpAddr::V4(ipv4.header().source_addr()),
            IpAddr::V4(ipv4.header().destination_addr()),
        ),
        NetSlice::Ipv6(ipv6) => (
            IpAddr::V6(ipv6.header().source_addr()),
            IpAddr::V6(ipv6.header().destination_addr()),
        ),
    };

    Ok(Some(TcpSegment {
        src_ip,
        src_port: tcp.source_port(),
        dst_ip,
        dst_port: tcp.destination_port(),
        payload: tcp.payload(),
    }))
}
