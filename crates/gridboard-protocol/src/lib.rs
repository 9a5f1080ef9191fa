//! Framed serial protocol between the control board and the relay station.
//!
//! ```text
//! [0xAA][0x55][LEN][PAYLOAD ...][CRC_HI][CRC_LO]
//! ```
//!
//! - [`FrameDecoder`]: byte-at-a-time receive state machine with resync
//! - [`FrameEncoder`]: builds frames and hands them to a [`ByteSink`]
//! - [`payload`]: inventory reports, commands and status payloads
//! - [`RelayCodec`]: `tokio_util` codec over the two for async hosts

pub mod codec;
pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod payload;

pub use codec::{Outgoing, RelayCodec};
pub use crc::crc16_ccitt;
pub use decoder::{DecoderState, DecoderStats, FrameDecoder};
pub use encoder::{ByteSink, FrameEncoder};
pub use payload::{CommandPayload, InventoryReport, LinkPayload, ReportEntry};
