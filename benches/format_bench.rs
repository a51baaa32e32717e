//! Benchmarks for UID rendering and parsing.
//!
//! Every card read renders the UID three times (hex and decimal console
//! lines plus the report payload), so these sit on the polling path.
//!
//! ```sh
//! cargo bench --bench format_bench
//! cargo bench --bench format_bench -- --save-baseline main
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use station_core::format::{decimal_spaced, hex_compact, hex_spaced, parse_hex};
use station_core::{Uid, UidFormat};

const UIDS: [(&str, &[u8]); 3] = [
    ("single", &[0x04, 0xA1, 0x3B, 0x7E]),
    ("double", &[0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66]),
    (
        "triple",
        &[0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99],
    ),
];

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("uid_render");
    group.throughput(Throughput::Elements(1));

    for (name, bytes) in UIDS {
        group.bench_with_input(BenchmarkId::new("hex_spaced", name), bytes, |b, bytes| {
            b.iter(|| black_box(hex_spaced(black_box(bytes))));
        });
        group.bench_with_input(BenchmarkId::new("hex_compact", name), bytes, |b, bytes| {
            b.iter(|| black_box(hex_compact(black_box(bytes))));
        });
        group.bench_with_input(BenchmarkId::new("decimal_spaced", name), bytes, |b, bytes| {
            b.iter(|| black_box(decimal_spaced(black_box(bytes))));
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("uid_parse");

    for (name, bytes) in UIDS {
        let spaced = hex_spaced(bytes);
        group.bench_with_input(BenchmarkId::new("parse_hex", name), &spaced, |b, text| {
            b.iter(|| black_box(parse_hex(black_box(text))));
        });
    }

    group.finish();
}

fn bench_payload_format(c: &mut Criterion) {
    let uid = Uid::from_slice(&[0x04, 0xA1, 0x3B, 0x7E]).unwrap();

    c.bench_function("payload_spaced", |b| {
        b.iter(|| black_box(UidFormat::Spaced.render(black_box(uid.as_bytes()))));
    });
}

criterion_group!(benches, bench_render, bench_parse, bench_payload_format);
criterion_main!(benches);
