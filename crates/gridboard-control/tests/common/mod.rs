//! Common helpers for board integration tests.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use gridboard_control::Board;
use gridboard_core::{BoardConfig, ChannelConfig, DeviceKind};
use gridboard_protocol::FrameEncoder;

/// Board with one channel per kind, wired to analog inputs `0..`.
pub fn board(kinds: &[DeviceKind]) -> Board {
    Board::new(config(kinds)).unwrap()
}

pub fn config(kinds: &[DeviceKind]) -> BoardConfig {
    BoardConfig {
        channels: kinds
            .iter()
            .enumerate()
            .map(|(i, &kind)| ChannelConfig {
                kind,
                analog_input: i as u8,
            })
            .collect(),
        ..BoardConfig::default()
    }
}

/// Wire bytes of one frame.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    FrameEncoder::new().encode(payload).unwrap().to_vec()
}

/// Wire bytes of an inventory report.
pub fn report(pairs: &[(DeviceKind, u8)]) -> Vec<u8> {
    let payload: Vec<u8> = pairs.iter().flat_map(|&(k, n)| [k.as_u8(), n]).collect();
    frame(&payload)
}

pub fn status_response() -> Vec<u8> {
    frame(&[0xFF, 0x33])
}

pub fn at(t0: Instant, ms: u64) -> Instant {
    t0 + Duration::from_millis(ms)
}
