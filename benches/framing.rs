// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Throughput of the byte-at-a-time decoder and the encode+decode round
// trip, replacing the old allocator microbenchmark now that the hot path
// here is the framing state machine rather than arena allocation.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tinyframe::{ChecksumKind, Config, Endpoint, Peer};

type Link = Endpoint<1024, 1024, 4, 4, 4>;

fn bench_decode_throughput(c: &mut Criterion) {
    let cfg = Config::new(1024, 1024).checksum(ChecksumKind::Crc16);
    let mut tx: Link = Endpoint::new(cfg, Peer::Master).unwrap();
    let payload = vec![0xABu8; 256];
    let mut wire = Vec::new();
    tx.send(&mut wire, 0x10, &payload).unwrap();

    let mut group = c.benchmark_group("decode_byte_by_byte");
    group.throughput(Throughput::Bytes(wire.len() as u64));
    group.bench_function("256B_payload_crc16", |b| {
        b.iter(|| {
            let mut rx: Link = Endpoint::new(cfg, Peer::Slave).unwrap();
            rx.accept(black_box(&wire));
        });
    });
    group.finish();
}

fn bench_encode_decode_round_trip(c: &mut Criterion) {
    let cfg = Config::new(1024, 1024).checksum(ChecksumKind::Crc32);
    let payload = vec![0x5Au8; 64];

    c.bench_function("encode_decode_round_trip_64B", |b| {
        b.iter(|| {
            let mut tx: Link = Endpoint::new(cfg, Peer::Master).unwrap();
            let mut rx: Link = Endpoint::new(cfg, Peer::Slave).unwrap();
            let mut wire = Vec::new();
            tx.send(&mut wire, 0x01, black_box(&payload)).unwrap();
            rx.accept(&wire);
        });
    });
}

criterion_group!(benches, bench_decode_throughput, bench_encode_decode_round_trip);
criterion_main!(benches);
