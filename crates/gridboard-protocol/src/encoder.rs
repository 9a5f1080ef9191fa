//! Transmit-side frame builder.
//!
//! [`FrameEncoder`] wraps a payload in sync bytes, a length byte and the
//! CRC, then hands the frame to a [`ByteSink`]. Any [`std::io::Write`]
//! (a serial port, a `Vec<u8>`) is a sink.

use bytes::{BufMut, Bytes, BytesMut};
use gridboard_core::constants::{FRAME_OVERHEAD, MAX_PAYLOAD_MASTER, SYNC1, SYNC2};
use gridboard_core::{Error, Result};
use tracing::trace;

use crate::crc::frame_crc;

/// Destination for encoded frames.
///
/// A frame is written with a single call so that a sink shared between
/// writers never interleaves two frames.
pub trait ByteSink {
    /// Write one complete frame.
    fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()>;
}

impl<W: std::io::Write> ByteSink for W {
    fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.write_all(frame)?;
        self.flush()
    }
}

/// Frame encoder bound to a payload cap.
#[derive(Debug, Clone, Copy)]
pub struct FrameEncoder {
    max_payload: usize,
}

impl FrameEncoder {
    /// Encoder for frames sent by the control board.
    pub fn new() -> Self {
        Self::with_max_payload(MAX_PAYLOAD_MASTER)
    }

    /// Encoder with a custom payload cap, clamped to 1..=255.
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            max_payload: max_payload.clamp(1, u8::MAX as usize),
        }
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// Append a complete frame for `payload` to `dst`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPayloadLength` if the payload is empty or
    /// exceeds the cap. Nothing is written in that case.
    pub fn encode_into(&self, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
        self.check_len(payload.len())?;

        dst.reserve(payload.len() + FRAME_OVERHEAD);
        dst.put_u8(SYNC1);
        dst.put_u8(SYNC2);
        dst.put_u8(payload.len() as u8);
        dst.put_slice(payload);
        dst.put_u16(frame_crc(payload));
        Ok(())
    }

    /// Build a frame for `payload`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridboard_protocol::FrameEncoder;
    ///
    /// let frame = FrameEncoder::new().encode(&[0x07, 0x01]).unwrap();
    /// assert_eq!(&frame[..5], &[0xAA, 0x55, 0x02, 0x07, 0x01]);
    /// assert_eq!(frame.len(), 7);
    ///
    /// assert!(FrameEncoder::new().encode(&[]).is_err());
    /// ```
    pub fn encode(&self, payload: &[u8]) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(payload.len() + FRAME_OVERHEAD);
        self.encode_into(payload, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Encode `payload` and write it to `sink`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPayloadLength` without touching the sink if the
    /// payload does not fit, or `Error::Io` if the sink fails.
    pub fn send<S: ByteSink + ?Sized>(&self, payload: &[u8], sink: &mut S) -> Result<usize> {
        let frame = self.encode(payload)?;
        sink.write_frame(&frame)?;
        trace!(len = payload.len(), bytes = frame.len(), "frame sent");
        Ok(frame.len())
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len == 0 || len > self.max_payload {
            return Err(Error::InvalidPayloadLength {
                len,
                max: self.max_payload,
            });
        }
        Ok(())
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}
