//! Tokio codec for the board <-> relay link.
//!
//! [`RelayCodec`] drives a [`FrameDecoder`] over a `BytesMut` read buffer
//! and a [`FrameEncoder`] over the write buffer, so the link can be used
//! with `tokio_util::codec::Framed` by async hosts and tests.
//!
//! Link noise never surfaces as a stream error: bad frames are counted by
//! the decoder, and CRC-valid frames with a malformed payload are logged
//! and skipped.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use gridboard_protocol::{LinkPayload, Outgoing, RelayCodec};
//! use tokio_util::codec::Framed;
//!
//! # async fn example<T>(io: T) -> gridboard_core::Result<()>
//! # where T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin {
//! let mut framed = Framed::new(io, RelayCodec::new());
//! framed.send(Outgoing::StatusRequest).await?;
//!
//! while let Some(payload) = framed.next().await {
//!     if let LinkPayload::Inventory(report) = payload? {
//!         println!("{} entries", report.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use bytes::{Buf, BytesMut};
use gridboard_core::constants::{MAX_PAYLOAD_MASTER, STATUS_REQUEST_PAYLOAD};
use gridboard_core::{Error, Result};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::{CommandPayload, DecoderStats, FrameDecoder, FrameEncoder, InventoryReport, LinkPayload};

/// Frames the codec can write.
///
/// The board sends commands and status requests. The relay-side variants
/// let the same codec play the relay in tests and simulators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Command(CommandPayload),
    StatusRequest,
    StatusResponse,
    Inventory(InventoryReport),
}

impl Outgoing {
    /// Payload bytes of this frame.
    pub fn to_payload(&self) -> Vec<u8> {
        match self {
            Outgoing::Command(command) => command.to_bytes().to_vec(),
            Outgoing::StatusRequest | Outgoing::StatusResponse => STATUS_REQUEST_PAYLOAD.to_vec(),
            Outgoing::Inventory(report) => report.to_bytes(),
        }
    }
}

impl From<CommandPayload> for Outgoing {
    fn from(command: CommandPayload) -> Self {
        Outgoing::Command(command)
    }
}

/// Tokio codec over the framed serial link.
#[derive(Debug)]
pub struct RelayCodec {
    decoder: FrameDecoder,
    encoder: FrameEncoder,
}

impl RelayCodec {
    /// Codec for the control board (250-byte payload cap both ways).
    pub fn new() -> Self {
        Self::with_max_payload(MAX_PAYLOAD_MASTER)
    }

    /// Codec with a custom payload cap, e.g. the relay profile.
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            decoder: FrameDecoder::with_max_payload(max_payload),
            encoder: FrameEncoder::with_max_payload(max_payload),
        }
    }

    /// Decoder statistics accumulated so far.
    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }
}

impl Default for RelayCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RelayCodec {
    type Item = LinkPayload;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        while !src.is_empty() {
            let (used, ready) = self.decoder.push_slice(&src[..]);
            src.advance(used);
            if !ready {
                break;
            }

            let classified = self.decoder.payload().map(LinkPayload::classify);
            self.decoder.reset();
            match classified {
                Some(Ok(payload)) => return Ok(Some(payload)),
                Some(Err(e)) => warn!(error = %e, "dropping malformed payload"),
                None => {}
            }
        }
        Ok(None)
    }
}

impl Encoder<Outgoing> for RelayCodec {
    type Error = Error;

    fn encode(&mut self, item: Outgoing, dst: &mut BytesMut) -> Result<()> {
        self.encoder.encode_into(&item.to_payload(), dst)
    }
}
