//! Receive-side frame decoder.
//!
//! The relay link is a raw UART: bytes can be lost, duplicated or corrupted,
//! and the decoder may be started in the middle of a frame. [`FrameDecoder`]
//! consumes one byte at a time and reports when a complete, CRC-valid frame
//! is available. It never fails: every malformed input is counted in
//! [`DecoderStats`] and the decoder goes back to hunting for a sync pair.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────┐ 0xAA ┌──────────┐ 0x55 ┌──────────┐ 1..=max ┌─────────────┐
//! │WaitSync1 │─────>│WaitSync2 │─────>│ReadLength│────────>│ReadPayload  │
//! └──────────┘      └──────────┘      └──────────┘         └─────────────┘
//!   ^  │ other        │  │ 0xAA           │ 0 / >max              │ len bytes
//!   │  └─(sync err)   │  └─(stay)         │ (sync err)            v
//!   │                 │ other (sync err)  │                ┌─────────────┐
//!   ├─────────────────┘                   │                │ReadCrcHigh  │
//!   ├─────────────────────────────────────┘                └─────────────┘
//!   │                                                             │
//!   │  CRC mismatch (crc err)   ┌───────────┐   match  ┌──────────v──┐
//!   └───────────────────────────│ReadCrcLow │<─────────│             │
//!                               └───────────┘          └─────────────┘
//!                                     │ CRC match
//!                                     v
//!                               ┌───────────┐
//!                               │FrameReady │── reset() ──> WaitSync1
//!                               └───────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use gridboard_protocol::{FrameDecoder, FrameEncoder};
//!
//! let frame = FrameEncoder::new().encode(&[0x07, 0x02]).unwrap();
//!
//! let mut decoder = FrameDecoder::new();
//! let mut ready = false;
//! for &b in frame.iter() {
//!     ready = decoder.push(b);
//! }
//! assert!(ready);
//! assert_eq!(decoder.payload(), Some(&[0x07, 0x02][..]));
//!
//! decoder.reset();
//! assert!(decoder.payload().is_none());
//! ```

use std::fmt;

use gridboard_core::constants::{MAX_PAYLOAD_MASTER, SYNC1, SYNC2};
use tracing::trace;

use crate::crc::frame_crc;

/// States of the receive state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Hunting for the first sync byte.
    WaitSync1,

    /// First sync byte seen; expecting the second.
    WaitSync2,

    /// Expecting the payload length byte.
    ReadLength,

    /// Accumulating `length` payload bytes.
    ReadPayload,

    /// Expecting the high CRC byte.
    ReadCrcHigh,

    /// Expecting the low CRC byte.
    ReadCrcLow,

    /// A CRC-valid frame is held until [`FrameDecoder::reset`] is called.
    FrameReady,
}

/// Monotonic diagnostic counters.
///
/// These never influence control decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// CRC-valid frames received.
    pub frames_received: u64,

    /// Frames discarded because the CRC did not match.
    pub crc_errors: u64,

    /// Unexpected bytes while hunting for a frame start or invalid lengths.
    pub sync_errors: u64,
}

impl fmt::Display for DecoderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frames={}, crc_errors={}, sync_errors={}",
            self.frames_received, self.crc_errors, self.sync_errors
        )
    }
}

/// Byte-at-a-time frame decoder with synchronization recovery.
#[derive(Debug)]
pub struct FrameDecoder {
    state: DecoderState,

    /// Largest accepted payload length.
    max_payload: usize,

    /// Declared payload length of the frame being assembled.
    length: usize,

    payload: Vec<u8>,

    /// Received CRC, assembled big-endian.
    received_crc: u16,

    stats: DecoderStats,
}

impl FrameDecoder {
    /// Create a decoder for the control-board profile (250-byte payloads).
    pub fn new() -> Self {
        Self::with_max_payload(MAX_PAYLOAD_MASTER)
    }

    /// Create a decoder with a custom payload cap.
    ///
    /// The cap is clamped to 1..=255 since the length field is one byte.
    pub fn with_max_payload(max_payload: usize) -> Self {
        let max_payload = max_payload.clamp(1, u8::MAX as usize);
        Self {
            state: DecoderState::WaitSync1,
            max_payload,
            length: 0,
            payload: Vec::with_capacity(max_payload),
            received_crc: 0,
            stats: DecoderStats::default(),
        }
    }

    /// Push one byte into the state machine.
    ///
    /// Returns `true` when this byte completed a CRC-valid frame. The
    /// payload then stays available through [`payload`](Self::payload)
    /// until [`reset`](Self::reset) is called.
    ///
    /// Pushing a byte while a frame is still held discards that frame and
    /// processes the byte from [`DecoderState::WaitSync1`].
    pub fn push(&mut self, byte: u8) -> bool {
        match self.state {
            DecoderState::WaitSync1 => {
                if byte == SYNC1 {
                    self.state = DecoderState::WaitSync2;
                } else {
                    self.sync_error(byte);
                }
            }
            DecoderState::WaitSync2 => {
                if byte == SYNC2 {
                    self.state = DecoderState::ReadLength;
                } else if byte == SYNC1 {
                    // A repeated first sync byte starts a fresh candidate.
                } else {
                    self.sync_error(byte);
                    self.reset();
                }
            }
            DecoderState::ReadLength => {
                let length = byte as usize;
                if (1..=self.max_payload).contains(&length) {
                    self.length = length;
                    self.payload.clear();
                    self.state = DecoderState::ReadPayload;
                } else {
                    self.sync_error(byte);
                    self.reset();
                }
            }
            DecoderState::ReadPayload => {
                self.payload.push(byte);
                if self.payload.len() >= self.length {
                    self.state = DecoderState::ReadCrcHigh;
                }
            }
            DecoderState::ReadCrcHigh => {
                self.received_crc = (byte as u16) << 8;
                self.state = DecoderState::ReadCrcLow;
            }
            DecoderState::ReadCrcLow => {
                self.received_crc |= byte as u16;
                let expected = frame_crc(&self.payload);
                if self.received_crc == expected {
                    self.stats.frames_received += 1;
                    self.state = DecoderState::FrameReady;
                    return true;
                }
                self.stats.crc_errors += 1;
                trace!(
                    expected = format_args!("0x{expected:04X}"),
                    received = format_args!("0x{:04X}", self.received_crc),
                    len = self.length,
                    "frame CRC mismatch"
                );
                self.reset();
            }
            DecoderState::FrameReady => {
                self.reset();
                return self.push(byte);
            }
        }
        false
    }

    /// Push a slice of bytes, stopping at the first complete frame.
    ///
    /// Returns the number of bytes consumed and whether a frame is ready.
    /// Bytes after the completed frame are left for the caller to push
    /// after [`reset`](Self::reset).
    pub fn push_slice(&mut self, bytes: &[u8]) -> (usize, bool) {
        for (i, &b) in bytes.iter().enumerate() {
            if self.push(b) {
                return (i + 1, true);
            }
        }
        (bytes.len(), false)
    }

    /// Payload of the completed frame, if one is held.
    pub fn payload(&self) -> Option<&[u8]> {
        match self.state {
            DecoderState::FrameReady => Some(&self.payload[..self.length]),
            _ => None,
        }
    }

    /// Return to [`DecoderState::WaitSync1`], discarding any partial or held frame.
    ///
    /// Statistics are preserved.
    pub fn reset(&mut self) {
        self.state = DecoderState::WaitSync1;
        self.length = 0;
        self.payload.clear();
        self.received_crc = 0;
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    fn sync_error(&mut self, byte: u8) {
        self.stats.sync_errors += 1;
        trace!(
            byte = format_args!("0x{byte:02X}"),
            state = ?self.state,
            "sync error"
        );
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
