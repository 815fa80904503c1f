// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Size capped JSON encoding of a wireless scan.
//!
//! The payload has one of two shapes, depending on the [`ScanHeader`]:
//!
//! ```text
//! {"w":{"i":true,"a":[{"m":"aa:bb:cc:dd:ee:ff","s":-61,"c":6}, ...]}}
//! {"c":{"o":"Telekom.de","a":[{"i":26871000,"l":41012,"c":262,"n":2}, ...]}}
//! ```
//!
//! Observations are appended in scan order. An observation that does not fit
//! anymore is dropped as a whole and the encoder continues with the next one,
//! a shorter entry may still fit. Space for the closing `]}}` is reserved up
//! front, so the payload is always well formed.

use common::observation::{ScanHeader, WirelessObservation};
use std::fmt::{self, Write};
use tracing::debug;

/// Default capacity of a [`ScanBuffer`] in bytes.
pub const DEFAULT_SCAN_CAPACITY: usize = 256;

const CLOSING: &str = "]}}";

/// A fixed size byte buffer holding an encoded scan.
///
/// The content is always valid UTF-8 because only whole `str` fragments are
/// ever committed.
#[derive(Clone)]
pub struct ScanBuffer<const N: usize = DEFAULT_SCAN_CAPACITY> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> ScanBuffer<N> {
    pub fn new() -> Self {
        ScanBuffer {
            bytes: [0; N],
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    /// Returns a writer that fails instead of growing past `limit` bytes.
    fn bounded(&mut self, limit: usize) -> BoundedWriter<'_, N> {
        BoundedWriter {
            limit: limit.min(N),
            buffer: self,
        }
    }
}

impl<const N: usize> Default for ScanBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for ScanBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanBuffer")
            .field("capacity", &N)
            .field("content", &self.as_str())
            .finish()
    }
}

struct BoundedWriter<'a, const N: usize> {
    buffer: &'a mut ScanBuffer<N>,
    limit: usize,
}

impl<const N: usize> Write for BoundedWriter<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let start = self.buffer.len;
        let end = start + s.len();
        if end > self.limit {
            return Err(fmt::Error);
        }
        self.buffer.bytes[start..end].copy_from_slice(s.as_bytes());
        self.buffer.len = end;
        Ok(())
    }
}

/// What happened to the observations of one encoding run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeSummary {
    /// Observations written to the payload.
    pub appended: usize,
    /// Observations with unknown fields or of the wrong variant.
    pub invalid: usize,
    /// Valid observations dropped because they did not fit anymore.
    pub truncated: usize,
}

/// Encodes wireless scans into an owned [`ScanBuffer`].
///
/// The buffer is reused between scans, every call to
/// [`encode`](Self::encode) starts from an empty buffer.
#[derive(Debug, Default)]
pub struct ScanResultEncoder<const N: usize = DEFAULT_SCAN_CAPACITY> {
    buffer: ScanBuffer<N>,
}

impl<const N: usize> ScanResultEncoder<N> {
    pub fn new() -> Self {
        ScanResultEncoder {
            buffer: ScanBuffer::new(),
        }
    }

    /// Encodes `observations` below `header`.
    ///
    /// If no observation could be appended the payload is empty: an empty
    /// scan is nothing to report, not an empty JSON object.
    pub fn encode<'a, I>(&mut self, header: &ScanHeader, observations: I) -> EncodeSummary
    where
        I: IntoIterator<Item = &'a WirelessObservation>,
    {
        let mut summary = EncodeSummary::default();
        self.buffer.clear();
        let limit = N.saturating_sub(CLOSING.len());

        if write_header(&mut self.buffer.bounded(limit), header).is_err() {
            debug!("Scan header does not fit into {} bytes", N);
            self.buffer.clear();
            for observation in observations {
                if is_encodable(header, observation) {
                    summary.truncated += 1;
                } else {
                    summary.invalid += 1;
                }
            }
            return summary;
        }

        for observation in observations {
            if !is_encodable(header, observation) {
                summary.invalid += 1;
                continue;
            }
            let mark = self.buffer.len;
            let separator = if summary.appended == 0 { "" } else { "," };
            let mut writer = self.buffer.bounded(limit);
            if writer.write_str(separator).is_ok() && write_entry(&mut writer, observation).is_ok()
            {
                summary.appended += 1;
            } else {
                self.buffer.len = mark;
                summary.truncated += 1;
            }
        }

        if summary.appended == 0 || self.buffer.bounded(N).write_str(CLOSING).is_err() {
            self.buffer.clear();
        }
        debug!(
            "Encoded scan: {} appended, {} invalid, {} truncated, {} bytes",
            summary.appended,
            summary.invalid,
            summary.truncated,
            self.buffer.len()
        );
        summary
    }

    /// The payload of the last [`encode`](Self::encode) call.
    pub fn payload(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &ScanBuffer<N> {
        &self.buffer
    }
}

fn is_encodable(header: &ScanHeader, observation: &WirelessObservation) -> bool {
    header.accepts(observation) && observation.is_valid()
}

fn write_header(writer: &mut impl Write, header: &ScanHeader) -> fmt::Result {
    match header {
        ScanHeader::Wifi { consider_ip } => write!(writer, r#"{{"w":{{"i":{consider_ip},"a":["#),
        ScanHeader::Cellular { operator } => {
            let operator = serde_json::to_string(operator).map_err(|_| fmt::Error)?;
            write!(writer, r#"{{"c":{{"o":{operator},"a":["#)
        }
    }
}

fn write_entry(writer: &mut impl Write, observation: &WirelessObservation) -> fmt::Result {
    match observation {
        WirelessObservation::Wifi(ap) => write!(
            writer,
            r#"{{"m":"{}","s":{},"c":{}}}"#,
            ap.bssid, ap.signal_strength, ap.channel
        ),
        WirelessObservation::Cell(tower) => write!(
            writer,
            r#"{{"i":{},"l":{},"c":{},"n":{}}}"#,
            tower.cell_id,
            tower.location_area_code,
            tower.mobile_country_code,
            tower.mobile_network_code
        ),
    }
}
