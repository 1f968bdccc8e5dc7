use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::debug;

use crate::protocols::manaplus::{DecodeError, Decoded, Origin, decode};
use crate::source::{CapturedFrame, FrameSource, PcapFileSource, SourceError};

use super::filter::SessionFilter;
use super::tcp::parse_tcp_segment;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// One classified payload and everything decoded from it.
#[derive(Debug, Clone)]
pub struct DecodedSegment<'a> {
    pub ts: Option<f64>,
    pub origin: Origin,
    pub payload: &'a [u8],
    pub decoded: Decoded,
}

/// Totals over a replayed capture.
///
/// Maps are ordered so the serialized form is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<String>,
    pub packets_seen: u64,
    pub segments_decoded: u64,
    pub events_total: u64,
    pub events_by_title: BTreeMap<String, u64>,
    /// Keyed by `<origin>:0x<opcode>`.
    pub unknown_opcodes: BTreeMap<String, u64>,
    pub truncated: u64,
    pub first_ts: Option<String>,
    pub last_ts: Option<String>,
}

impl ReplaySummary {
    fn record(&mut self, origin: Origin, decoded: &Decoded) {
        self.segments_decoded += 1;
        self.events_total += decoded.events.len() as u64;
        for event in &decoded.events {
            *self
                .events_by_title
                .entry(event.title.to_string())
                .or_default() += 1;
        }
        match decoded.outcome.error() {
            Some(DecodeError::UnknownOpcode { opcode, .. }) => {
                *self
                    .unknown_opcodes
                    .entry(format!("{origin}:0x{opcode:04x}"))
                    .or_default() += 1;
            }
            Some(DecodeError::TruncatedRecord { .. } | DecodeError::Underflow { .. }) => {
                self.truncated += 1;
            }
            None => {}
        }
    }
}

pub fn replay_pcap_file(
    path: &Path,
    filter: &SessionFilter,
    sink: impl FnMut(DecodedSegment<'_>),
) -> Result<ReplaySummary, ReplayError> {
    let source = PcapFileSource::open(path)?;
    let mut summary = replay_source(source, filter, sink)?;
    summary.capture = Some(path.display().to_string());
    Ok(summary)
}

/// Decodes every session payload in `source`, in capture order.
///
/// Frames that are not TCP, or that do not belong to the session, are
/// counted and skipped. Only source failures abort the replay.
pub fn replay_source<S: FrameSource>(
    mut source: S,
    filter: &SessionFilter,
    mut sink: impl FnMut(DecodedSegment<'_>),
) -> Result<ReplaySummary, ReplayError> {
    let mut summary = ReplaySummary::default();
    let mut first_ts = None;
    let mut last_ts = None;

    while let Some(CapturedFrame { ts, linktype, data }) = source.next_frame()? {
        summary.packets_seen += 1;
        update_ts_bounds(&mut first_ts, &mut last_ts, ts);

        let segment = match parse_tcp_segment(linktype, &data) {
            Ok(Some(segment)) => segment,
            Ok(None) => {
                debug!(packet = summary.packets_seen, "skipping non-TCP frame");
                continue;
            }
            Err(err) => {
                debug!(packet = summary.packets_seen, error = %err, "skipping malformed frame");
                continue;
            }
        };
        let Some(origin) = filter.classify(&segment) else {
            continue;
        };

        let decoded = decode(origin, segment.payload);
        summary.record(origin, &decoded);
        sink(DecodedSegment {
            ts,
            origin,
            payload: segment.payload,
            decoded,
        });
    }

    summary.first_ts = ts_to_rfc3339(first_ts);
    summary.last_ts = ts_to_rfc3339(last_ts);
    Ok(summary)
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: Option<f64>) {
    let Some(ts) = ts else {
        return;
    };
    if first.is_none_or(|existing| ts < existing) {
        *first = Some(ts);
    }
    if last.is_none_or(|existing| ts > existing) {
        *last = Some(ts);
    }
}

fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let nanos = (ts? * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
