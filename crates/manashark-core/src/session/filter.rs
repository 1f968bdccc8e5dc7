use std::net::IpAddr;

use crate::protocols::manaplus::Origin;

use super::tcp::TcpSegment;

/// Selects the segments of one game session and tells which side sent them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionFilter {
    pub host: IpAddr,
    pub port: Option<u16>,
}

impl SessionFilter {
    pub fn new(host: IpAddr, port: Option<u16>) -> Self {
        Self { host, port }
    }

    /// `Host` when the server sent the segment, `Node` when it received it.
    ///
    /// Segments without payload, not touching the server, or not on the
    /// configured port yield `None`.
    pub fn classify(&self, segment: &TcpSegment<'_>) -> Option<Origin> {
        if segment.payload.is_empty() {
            return None;
        }
        if let Some(port) = self.port {
            if segment.src_port != port && segment.dst_port != port {
                return None;
            }
        }
        if segment.src_ip == self.host {
            Some(Origin::Host)
        } else if segment.dst_ip == self.host {
            Some(Origin::Node)
        } else {
            None
        }
    }
}
