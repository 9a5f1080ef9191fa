//! Performance benchmarks for the frame encoder, decoder and RelayCodec.
//!
//! The relay reports inventory every few hundred milliseconds and the board
//! sends one command per present kind every driver tick, so these mostly
//! guard against regressions in the per-byte decoder path.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gridboard_core::{Command, DeviceKind};
use gridboard_protocol::{CommandPayload, FrameDecoder, FrameEncoder, InventoryReport, Outgoing, RelayCodec};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};

/// Inventory report listing every kind.
fn create_full_report() -> InventoryReport {
    DeviceKind::ALL.into_iter().map(|kind| (kind, 3)).collect()
}

/// Benchmark encoding a command frame.
fn bench_encode_command(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_command");
    group.throughput(Throughput::Elements(1));

    let command = CommandPayload::new(DeviceKind::Gas, Command::GasLevel(6));

    group.bench_function("encode_command", |b| {
        let mut codec = RelayCodec::new();
        b.iter(|| {
            let mut buffer = BytesMut::new();
            codec
                .encode(black_box(Outgoing::Command(command)), &mut buffer)
                .unwrap();
            black_box(buffer);
        });
    });

    group.finish();
}

/// Benchmark byte-wise decoding for several payload sizes.
fn bench_decode_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_sizes");

    for size in [2usize, 16, 100, 250] {
        let payload = vec![0x42; size];
        let frame = FrameEncoder::new().encode(&payload).unwrap();
        group.throughput(Throughput::Bytes(frame.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, frame| {
            let mut decoder = FrameDecoder::new();
            b.iter(|| {
                for &byte in frame.iter() {
                    black_box(decoder.push(byte));
                }
                decoder.reset();
            });
        });
    }

    group.finish();
}

/// Benchmark decoding an inventory report through the codec.
fn bench_decode_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_report");
    group.throughput(Throughput::Elements(1));

    let mut encoded = BytesMut::new();
    RelayCodec::new()
        .encode(Outgoing::Inventory(create_full_report()), &mut encoded)
        .unwrap();

    group.bench_function("decode_full_report", |b| {
        let mut codec = RelayCodec::new();
        b.iter(|| {
            let mut buffer = encoded.clone();
            black_box(codec.decode(&mut buffer).unwrap());
        });
    });

    group.finish();
}

/// Benchmark resynchronization through leading noise.
fn bench_resync(c: &mut Criterion) {
    let mut group = c.benchmark_group("resync");

    let mut stream = vec![0x13u8; 200];
    stream.extend_from_slice(&FrameEncoder::new().encode(&[0x07, 0x02]).unwrap());
    group.throughput(Throughput::Bytes(stream.len() as u64));

    group.bench_function("noise_200_then_frame", |b| {
        let mut decoder = FrameDecoder::new();
        b.iter(|| {
            let (_, ready) = decoder.push_slice(black_box(&stream));
            decoder.reset();
            black_box(ready);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_encode_command,
    bench_decode_sizes,
    bench_decode_report,
    bench_resync
);
criterion_main!(benches);
