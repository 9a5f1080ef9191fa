//! Integration tests for RelayCodec over Tokio streams.
//!
//! A duplex stream stands in for the serial port: one end plays the control
//! board, the other the relay.

mod common;

use futures::{SinkExt, StreamExt};
use gridboard_core::{Command, DeviceKind, StorageLevel};
use gridboard_protocol::{CommandPayload, FrameDecoder, InventoryReport, LinkPayload, Outgoing, RelayCodec};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio_util::codec::Framed;

/// Helper function to create a framed board/relay pair.
fn create_framed_duplex(
    buffer_size: usize,
) -> (Framed<DuplexStream, RelayCodec>, Framed<DuplexStream, RelayCodec>) {
    let (board, relay) = tokio::io::duplex(buffer_size);
    (
        Framed::new(board, RelayCodec::new()),
        Framed::new(relay, RelayCodec::with_max_payload(100)),
    )
}

#[tokio::test]
async fn test_inventory_report_reaches_board() {
    let (mut board, mut relay) = create_framed_duplex(1024);

    let report: InventoryReport = [(DeviceKind::Coal, 2), (DeviceKind::Battery, 1)]
        .into_iter()
        .collect();
    relay.send(Outgoing::Inventory(report.clone())).await.unwrap();

    let received = board.next().await.unwrap().unwrap();
    assert_eq!(received, LinkPayload::Inventory(report));
}

#[tokio::test]
async fn test_status_request_and_response() {
    let (mut board, mut relay) = create_framed_duplex(1024);

    board.send(Outgoing::StatusRequest).await.unwrap();

    // The relay side sees the request as a status payload too.
    let request = relay.next().await.unwrap().unwrap();
    assert_eq!(request, LinkPayload::Status { code: Some(0x33) });

    relay.send(Outgoing::StatusResponse).await.unwrap();
    let response = board.next().await.unwrap().unwrap();
    assert!(response.is_status());
}

#[tokio::test]
async fn test_commands_decode_on_relay() {
    let (board, mut relay) = tokio::io::duplex(1024);
    let mut board = Framed::new(board, RelayCodec::new());

    let commands = [
        CommandPayload::new(DeviceKind::Coal, Command::On),
        CommandPayload::new(DeviceKind::Gas, Command::GasLevel(7)),
        CommandPayload::new(DeviceKind::HydroStorage, Command::Storage(StorageLevel::Full)),
    ];
    for command in commands {
        board.send(Outgoing::Command(command)).await.unwrap();
    }
    drop(board);

    let mut bytes = Vec::new();
    relay.read_to_end(&mut bytes).await.unwrap();

    let mut decoder = FrameDecoder::with_max_payload(100);
    let decoded: Vec<_> = common::decode_all(&mut decoder, &bytes)
        .iter()
        .map(|p| CommandPayload::parse(p).unwrap())
        .collect();
    assert_eq!(decoded, commands);
}

#[tokio::test]
async fn test_noise_between_frames_is_skipped() {
    let (mut raw, board) = tokio::io::duplex(1024);
    let mut board = Framed::new(board, RelayCodec::new());

    let mut bytes = common::garbage(17);
    bytes.extend(common::encode_frame(&[0x07, 0x03]));
    bytes.extend(common::garbage(5));
    bytes.extend(common::encode_frame(&[0xFF, 0x01]));
    raw.write_all(&bytes).await.unwrap();

    let first = board.next().await.unwrap().unwrap();
    assert!(matches!(first, LinkPayload::Inventory(r) if r.count_of(7) == Some(3)));

    let second = board.next().await.unwrap().unwrap();
    assert_eq!(second, LinkPayload::Status { code: Some(0x01) });
    assert_eq!(board.codec().stats().sync_errors, 22);
}

#[tokio::test]
async fn test_corrupted_frame_is_dropped() {
    let (mut raw, board) = tokio::io::duplex(1024);
    let mut board = Framed::new(board, RelayCodec::new());

    let mut corrupted = common::encode_frame(&[0x05, 0x01]);
    let last = corrupted.len() - 1;
    corrupted[last] ^= 0xFF;
    raw.write_all(&corrupted).await.unwrap();
    raw.write_all(&common::encode_frame(&[0x05, 0x02])).await.unwrap();

    let received = board.next().await.unwrap().unwrap();
    assert!(matches!(received, LinkPayload::Inventory(r) if r.count_of(5) == Some(2)));
    assert_eq!(board.codec().stats().crc_errors, 1);
}

#[tokio::test]
async fn test_byte_by_byte_delivery() {
    let (mut raw, board) = tokio::io::duplex(16);
    let mut board = Framed::new(board, RelayCodec::new());

    let frame = common::encode_frame(&[0x01, 0x04, 0x02, 0x01]);
    let writer = tokio::spawn(async move {
        for b in frame {
            raw.write_all(&[b]).await.unwrap();
            tokio::task::yield_now().await;
        }
        raw
    });

    let received = board.next().await.unwrap().unwrap();
    assert!(matches!(received, LinkPayload::Inventory(r) if r.len() == 2));
    writer.await.unwrap();
}

#[tokio::test]
async fn test_relay_profile_rejects_oversized_send() {
    let (_board, mut relay) = create_framed_duplex(1024);

    let report: InventoryReport = (0..51u8).map(|i| (i, 1)).collect();
    assert!(relay.send(Outgoing::Inventory(report)).await.is_err());
}
