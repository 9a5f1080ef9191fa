//! Property-based tests for the frame decoder.
//!
//! These cover the round-trip and resynchronization guarantees over random
//! payloads and random leading noise.

mod common;

use gridboard_core::constants::{MAX_PAYLOAD_MASTER, SYNC1};
use gridboard_protocol::FrameDecoder;
use proptest::prelude::*;

/// Strategy for payloads of every legal length.
fn valid_payload() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=MAX_PAYLOAD_MASTER)
}

/// Strategy for leading noise that never contains the first sync byte.
fn noise() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>().prop_filter("no sync byte", |b| *b != SYNC1), 0..64)
}

proptest! {
    /// Property: every legal payload survives encode then byte-wise decode,
    /// with exactly one frame reported.
    #[test]
    fn prop_frame_roundtrip(payload in valid_payload()) {
        let bytes = common::encode_frame(&payload);
        let mut decoder = FrameDecoder::new();

        let ready = bytes.iter().filter(|&&b| decoder.push(b)).count();
        prop_assert_eq!(ready, 1);
        prop_assert_eq!(decoder.payload(), Some(&payload[..]));
        prop_assert_eq!(decoder.stats().crc_errors, 0);
    }

    /// Property: any amount of sync-free noise before a frame is skipped.
    #[test]
    fn prop_resync_after_noise(prefix in noise(), payload in valid_payload()) {
        let mut bytes = prefix.clone();
        bytes.extend(common::encode_frame(&payload));

        let mut decoder = FrameDecoder::new();
        let frames = common::decode_all(&mut decoder, &bytes);
        prop_assert_eq!(frames, vec![payload]);
        prop_assert_eq!(decoder.stats().sync_errors, prefix.len() as u64);
    }

    /// Property: flipping one CRC bit never yields a frame, and the next
    /// frame is still decoded.
    #[test]
    fn prop_crc_flip_detected(payload in valid_payload(), bit in 0u8..16) {
        let mut corrupted = common::encode_frame(&payload);
        let crc_at = corrupted.len() - 2 + (bit / 8) as usize;
        corrupted[crc_at] ^= 1 << (bit % 8);

        let mut decoder = FrameDecoder::new();
        let ready = corrupted.iter().filter(|&&b| decoder.push(b)).count();
        prop_assert_eq!(ready, 0);
        prop_assert_eq!(decoder.stats().crc_errors, 1);

        let frames = common::decode_all(&mut decoder, &common::encode_frame(&[0x07, 0x01]));
        prop_assert_eq!(frames, vec![vec![0x07, 0x01]]);
    }

    /// Property: the decoder never panics and never reports a frame larger
    /// than its cap, whatever the input.
    #[test]
    fn prop_arbitrary_input_is_safe(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut decoder = FrameDecoder::with_max_payload(100);
        for frame in common::decode_all(&mut decoder, &bytes) {
            prop_assert!(!frame.is_empty() && frame.len() <= 100);
        }
    }
}
