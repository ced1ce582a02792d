//! Preview Scaling Benchmarks
//!
//! Fit computation, frame resize and snapshot encoding using criterion

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use framesnap::*;
use std::hint::black_box;

fn bench_fit(c: &mut Criterion) {
    let scaler = DisplayScaler::default();

    c.bench_function("fit_1080p_into_window", |b| {
        b.iter(|| {
            scaler.fit(
                black_box(Dimensions::new(1920, 1080)),
                black_box(Dimensions::new(1004, 728)),
            )
        })
    });
}

fn bench_preview(c: &mut Criterion) {
    let mut group = c.benchmark_group("preview_scaling");
    let scaler = DisplayScaler::default();
    let viewport = Dimensions::new(1004, 728);

    let scenarios = [
        ("vga", 640, 480),
        ("hd", 1280, 720),
        ("full_hd", 1920, 1080),
        ("4k", 3840, 2160),
    ];

    for (name, width, height) in scenarios {
        let frame = Frame::solid(width, height, [32, 96, 160]);
        group.throughput(Throughput::Elements(width as u64 * height as u64));

        group.bench_with_input(BenchmarkId::new("scale_frame", name), &frame, |b, frame| {
            b.iter(|| black_box(scaler.scale_frame(frame, viewport)))
        });

        group.bench_with_input(BenchmarkId::new("preview_rgb", name), &frame, |b, frame| {
            b.iter(|| black_box(scaler.preview_rgb(frame, viewport)))
        });
    }

    group.finish();
}

fn bench_snapshot_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_encoding");
    let frame = Frame::solid(1280, 720, [12, 200, 64]);
    group.throughput(Throughput::Bytes(frame.data.len() as u64));

    for format in [StillFormat::Jpeg, StillFormat::Png] {
        let encoder = encoder::encoder_for(format, 95);
        group.bench_function(BenchmarkId::new("encode", encoder.name()), |b| {
            b.iter(|| black_box(encoder.encode(&frame)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fit, bench_preview, bench_snapshot_encoding);
criterion_main!(benches);
