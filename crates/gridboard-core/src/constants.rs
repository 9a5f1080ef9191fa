//! Core constants for the board <-> relay link and the control loop.
//!
//! This module defines the wire-level constants of the framed serial link
//! between the control board and the relay station, the command codes sent
//! to attractions, and the default timing and tuning values used by the
//! control loop. Runtime overrides live in [`BoardConfig`](crate::BoardConfig);
//! the values here are its defaults.
//!
//! # Frame Structure
//!
//! ```text
//! [SYNC1][SYNC2][LEN][PAYLOAD ...][CRC_HI][CRC_LO]
//!  0xAA   0x55   1..=MAX          CRC16-CCITT over LEN + PAYLOAD
//! ```
//!
//! # Usage
//!
//! ```
//! use gridboard_core::constants::*;
//!
//! assert_eq!(SYNC1, 0xAA);
//! assert_eq!(FRAME_OVERHEAD, 5);
//!
//! fn fits(len: usize) -> bool {
//!     (1..=MAX_PAYLOAD_MASTER).contains(&len)
//! }
//! assert!(fits(2));
//! ```

// ============================================================================
// Frame Synchronization
// ============================================================================

/// First synchronization byte of every frame.
pub const SYNC1: u8 = 0xAA;

/// Second synchronization byte of every frame.
pub const SYNC2: u8 = 0x55;

/// Bytes added around a payload: two sync bytes, the length byte and the
/// two CRC bytes.
pub const FRAME_OVERHEAD: usize = 5;

// ============================================================================
// Payload Limits
// ============================================================================

/// Maximum payload accepted by the control board.
pub const MAX_PAYLOAD_MASTER: usize = 250;

/// Maximum payload accepted by the relay station.
///
/// The relay runs on a smaller MCU, so frames sent toward it must stay
/// within this limit.
pub const MAX_PAYLOAD_RELAY: usize = 100;

/// Size of a command payload: `[device_type, command]`.
pub const COMMAND_PAYLOAD_LEN: usize = 2;

// ============================================================================
// CRC16-CCITT
// ============================================================================

/// CRC16-CCITT generator polynomial (MSB-first, no reflection).
pub const CRC16_POLY: u16 = 0x1021;

/// CRC16-CCITT initial register value.
pub const CRC16_INIT: u16 = 0xFFFF;

// ============================================================================
// Status Heartbeat
// ============================================================================

/// Reserved device-type byte marking status traffic.
///
/// Never a valid [`DeviceKind`](crate::DeviceKind), so status frames cannot
/// be mistaken for commands or inventory entries.
pub const STATUS_TYPE: u8 = 0xFF;

/// Second byte of the status request payload.
pub const STATUS_REQUEST_CODE: u8 = 0x33;

/// Complete status request payload.
pub const STATUS_REQUEST_PAYLOAD: [u8; 2] = [STATUS_TYPE, STATUS_REQUEST_CODE];

// ============================================================================
// Command Codes (low nibble on the wire)
// ============================================================================

/// Mask applied to every command byte before transmission.
pub const COMMAND_MASK: u8 = 0x0F;

/// Generic ON.
pub const CMD_ON: u8 = 0x01;

/// Generic OFF.
pub const CMD_OFF: u8 = 0x02;

/// Idle (battery idle, photovoltaic idle light).
pub const CMD_IDLE: u8 = 0x03;

/// Battery charging (consuming power).
pub const CMD_CHARGE: u8 = 0x04;

/// Battery discharging (producing power).
pub const CMD_DISCHARGE: u8 = 0x05;

/// Base for gas levels: level `n` (1..=10) is sent as `GAS_LEVEL_BASE + n`.
pub const GAS_LEVEL_BASE: u8 = 0x05;

/// Storage indicator: full, heavy discharging.
pub const CMD_STORAGE_FULL: u8 = 0x0B;

/// Storage indicator: 75%, light discharging.
pub const CMD_STORAGE_HIGH: u8 = 0x0C;

/// Storage indicator: 50%, idle.
pub const CMD_STORAGE_HALF: u8 = 0x0D;

/// Storage indicator: 25%, light charging.
pub const CMD_STORAGE_LOW: u8 = 0x0E;

/// Storage indicator: empty, heavy charging.
pub const CMD_STORAGE_EMPTY: u8 = 0x0F;

// ============================================================================
// Control Law Tuning
// ============================================================================

/// Percentage above which threshold kinds switch ON.
pub const ON_THRESHOLD_PERCENT: f32 = 0.5;

/// Half-width of the center deadband for symmetric envelopes (0.25%).
pub const CENTER_DEADBAND: f32 = 0.0025;

/// Relative tolerance used to decide that an envelope is symmetric about zero.
///
/// Empirically tuned against knob jitter; keep the exact value.
pub const SYMMETRY_TOLERANCE: f32 = 0.001;

/// Relative tolerance under which a computed power snaps to exactly zero.
///
/// Empirically tuned against rounding noise; keep the exact value.
pub const ZERO_SNAP_TOLERANCE: f32 = 0.002;

/// Gas below this percentage is OFF.
pub const GAS_OFF_BELOW: f32 = 0.05;

/// Number of gas levels.
pub const GAS_LEVELS: u8 = 10;

/// Normalized storage power at or beyond which the indicator shows a heavy level.
pub const STORAGE_HEAVY_THRESHOLD: f32 = 0.6;

/// Normalized storage power at or beyond which the indicator shows a light level.
pub const STORAGE_LIGHT_THRESHOLD: f32 = 0.2;

/// Default coefficient threshold for coefficient-gated kinds.
pub const DEFAULT_COEFFICIENT_THRESHOLD: f32 = 0.5;

/// Number of segments on a bargraph.
pub const BARGRAPH_LEVELS: u8 = 10;

// ============================================================================
// Timing Defaults (milliseconds)
// ============================================================================

/// Grace period before an inventory decrease is committed.
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 500;

/// Minimum spacing between two attraction driver runs.
pub const DEFAULT_DRIVER_INTERVAL_MS: u64 = 200;

/// Spacing between two status requests.
pub const DEFAULT_STATUS_REQUEST_INTERVAL_MS: u64 = 2000;

/// Time without a status response after which the relay is disconnected.
///
/// Strictly greater than [`DEFAULT_STATUS_REQUEST_INTERVAL_MS`] so at least
/// one retry happens before the link is declared lost.
pub const DEFAULT_STATUS_TIMEOUT_MS: u64 = 3000;

/// Blink period of the aggregate displays while the relay is disconnected.
pub const DEFAULT_BLINK_INTERVAL_MS: u64 = 500;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_timeout_exceeds_request_interval() {
        assert!(DEFAULT_STATUS_TIMEOUT_MS > DEFAULT_STATUS_REQUEST_INTERVAL_MS);
    }

    #[test]
    fn test_relay_payload_smaller_than_master() {
        assert!(MAX_PAYLOAD_RELAY < MAX_PAYLOAD_MASTER);
        assert!(MAX_PAYLOAD_MASTER <= u8::MAX as usize);
    }

    #[test]
    fn test_gas_levels_fit_in_nibble() {
        assert_eq!(GAS_LEVEL_BASE + GAS_LEVELS, 0x0F);
        assert_eq!(CMD_STORAGE_EMPTY & COMMAND_MASK, CMD_STORAGE_EMPTY);
    }
}
