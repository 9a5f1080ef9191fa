//! Common test utilities for protocol integration tests.
//!
//! - `encode_frame`: wire bytes of a payload with the control-board profile
//! - `decode_all`: push a byte stream through a decoder and collect payloads
//! - `garbage`: leading noise that can never start a frame

#![allow(dead_code)]

use gridboard_core::constants::SYNC1;
use gridboard_protocol::{FrameDecoder, FrameEncoder};

/// Encode `payload` as a complete frame.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    FrameEncoder::new()
        .encode(payload)
        .expect("payload length must be 1..=250")
        .to_vec()
}

/// Feed every byte through `decoder`, resetting after each frame.
pub fn decode_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    for &b in bytes {
        if decoder.push(b) {
            if let Some(payload) = decoder.payload() {
                frames.push(payload.to_vec());
            }
            decoder.reset();
        }
    }
    frames
}

/// `len` bytes of noise free of the first sync byte.
pub fn garbage(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| {
            let b = (i as u8).wrapping_mul(37).wrapping_add(11);
            if b == SYNC1 { 0x00 } else { b }
        })
        .collect()
}
