use std::io::Write;
use std::net::{IpAddr, Ipv4Addr};

use etherparse::PacketBuilder;
use manashark_core::{
    FrameSource, Origin, PcapFileSource, Renderer, SessionFilter, SourceError, Style,
    replay_pcap_file,
};

const SERVER: [u8; 4] = [52, 174, 196, 146];
const CLIENT: [u8; 4] = [192, 168, 1, 20];

fn tcp_frame(src: ([u8; 4], u16), dst: ([u8; 4], u16), payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2([0x02; 6], [0x04; 6])
        .ipv4(src.0, dst.0, 64)
        .tcp(src.1, dst.1, 1000, 8192);
    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

fn legacy_pcap(frames: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&[0xd4, 0xc3, 0xb2, 0xa1]);
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&65535u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    for (sec, data) in frames {
        out.extend_from_slice(&sec.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
    }
    out
}

fn pcapng(frames: &[(u64, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    // Section header.
    out.extend_from_slice(&0x0a0d_0d0au32.to_le_bytes());
    out.extend_from_slice(&28u32.to_le_bytes());
    out.extend_from_slice(&0x1a2b_3c4du32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&(-1i64).to_le_bytes());
    out.extend_from_slice(&28u32.to_le_bytes());
    // Interface description, Ethernet.
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&20u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&20u32.to_le_bytes());
    for (micros, data) in frames {
        let padded = data.len().div_ceil(4) * 4;
        let total = (32 + padded) as u32;
        out.extend_from_slice(&6u32.to_le_bytes());
        out.extend_from_slice(&total.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&((micros >> 32) as u32).to_le_bytes());
        out.extend_from_slice(&(*micros as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
        out.resize(out.len() + padded - data.len(), 0);
        out.extend_from_slice(&total.to_le_bytes());
    }
    out
}

fn write_capture(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

fn session() -> SessionFilter {
    SessionFilter::new(IpAddr::V4(Ipv4Addr::from(SERVER)), Some(6901))
}

#[test]
fn replay_legacy_capture_renders_session() {
    let capture = legacy_pcap(&[
        (
            1_700_000_000,
            tcp_frame((CLIENT, 40000), (SERVER, 6901), &[0x89, 0x00, 0xb6, 0x8e, 0x8e, 0x06, 0x07]),
        ),
        (
            1_700_000_001,
            tcp_frame(
                (SERVER, 6901),
                (CLIENT, 40000),
                &[0x80, 0x00, 0x7a, 0x8c, 0xf1, 0x34, 0x5e],
            ),
        ),
        (
            1_700_000_002,
            tcp_frame((CLIENT, 40000), (SERVER, 6901), &[0x05, 0x0a, 0x28, 0x49, 0x89]),
        ),
    ]);
    let file = write_capture(&capture);

    let renderer = Renderer::new(Style::Plain);
    let mut lines = Vec::new();
    let summary = replay_pcap_file(file.path(), &session(), |segment| {
        lines.extend(renderer.render_decoded(segment.origin, segment.payload, &segment.decoded));
    })
    .unwrap();

    assert_eq!(
        lines,
        vec![
            "--> Player action | Target: 0x068e8eb6 | Action: Attack".to_string(),
            "<-- NPC monster check | ID: 0x34f18c7a | Unknown: 5e".to_string(),
            "*** NODE | ID 0x0a05 | 050a284989".to_string(),
        ]
    );
    assert_eq!(summary.packets_seen, 3);
    assert_eq!(summary.segments_decoded, 3);
    assert_eq!(summary.unknown_opcodes["node:0x0a05"], 1);
    assert_eq!(summary.first_ts.as_deref(), Some("2023-11-14T22:13:20Z"));
    assert_eq!(summary.last_ts.as_deref(), Some("2023-11-14T22:13:22Z"));
    assert_eq!(summary.capture.as_deref(), Some(file.path().to_str().unwrap()));
}

#[test]
fn replay_pcapng_capture() {
    let capture = pcapng(&[
        (
            2_000_000,
            tcp_frame(
                (SERVER, 6901),
                (CLIENT, 40000),
                &[0x80, 0x00, 0x7a, 0x8c, 0xf1, 0x34, 0x5e],
            ),
        ),
        (3_000_000, tcp_frame((CLIENT, 40000), (SERVER, 6901), &[0x18, 0x01])),
        (
            4_000_000,
            tcp_frame((SERVER, 6901), (CLIENT, 40000), &[0x7d, 0x00, 0x7d, 0x00]),
        ),
    ]);
    let file = write_capture(&capture);

    let mut origins = Vec::new();
    let summary = replay_pcap_file(file.path(), &session(), |segment| {
        origins.push(segment.origin);
    })
    .unwrap();

    assert_eq!(origins, vec![Origin::Host, Origin::Node, Origin::Host]);
    assert_eq!(summary.segments_decoded, 3);
    assert_eq!(summary.events_total, 2);
    assert_eq!(summary.events_by_title["NPC monster check"], 1);
    assert_eq!(summary.events_by_title["NPC killed"], 1);
    // Scenario change is a node record; the server never sends it.
    assert_eq!(summary.unknown_opcodes.len(), 1);
    assert_eq!(summary.unknown_opcodes["host:0x007d"], 1);
    assert_eq!(summary.first_ts.as_deref(), Some("1970-01-01T00:00:02Z"));
    assert_eq!(summary.last_ts.as_deref(), Some("1970-01-01T00:00:04Z"));
}

#[test]
fn pcap_source_counts_frames() {
    let capture = legacy_pcap(&[(1, vec![0u8; 14]), (2, vec![0u8; 14])]);
    let file = write_capture(&capture);
    let mut source = PcapFileSource::open(file.path()).unwrap();

    let mut frames = 0;
    while source.next_frame().unwrap().is_some() {
        frames += 1;
    }
    assert_eq!(frames, 2);
}

#[test]
fn pcap_source_rejects_truncated_file() {
    let file = write_capture(&[0x0a, 0x0d, 0x0d]);
    let err = match PcapFileSource::open(file.path()) {
        Ok(_) => panic!("expected truncated file to be rejected"),
        Err(err) => err,
    };
    assert!(matches!(err, SourceError::Io(_)));
}
