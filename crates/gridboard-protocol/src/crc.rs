//! CRC16-CCITT (poly 0x1021, init 0xFFFF, MSB-first, no reflection).
//!
//! The frame CRC covers the length byte followed by the payload. Use
//! [`frame_crc`] to compute it without building a temporary buffer.

use gridboard_core::constants::{CRC16_INIT, CRC16_POLY};

/// Feed one byte into a running CRC register.
#[inline]
fn update(mut crc: u16, byte: u8) -> u16 {
    crc ^= (byte as u16) << 8;
    for _ in 0..8 {
        if crc & 0x8000 != 0 {
            crc = (crc << 1) ^ CRC16_POLY;
        } else {
            crc <<= 1;
        }
    }
    crc
}

/// CRC16-CCITT of a byte slice.
///
/// # Examples
///
/// ```
/// use gridboard_protocol::crc16_ccitt;
///
/// // Standard check value for "123456789".
/// assert_eq!(crc16_ccitt(b"123456789"), 0x29B1);
/// ```
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    data.iter().fold(CRC16_INIT, |crc, &b| update(crc, b))
}

/// CRC of a frame: `length` byte followed by `payload`.
pub fn frame_crc(payload: &[u8]) -> u16 {
    let crc = update(CRC16_INIT, payload.len() as u8);
    payload.iter().fold(crc, |crc, &b| update(crc, b))
}
