//! Benchmarks for the GPU-to-raster flip copy.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(clippy::expect_used, clippy::cast_possible_truncation)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vcanvas::blit::copy_flipped;
use vcanvas::ImageData;

/// Synthetic bottom-to-top RGBA stream for a square framebuffer.
fn framebuffer(size: u32) -> Vec<u8> {
    (0..size as usize * size as usize * 4)
        .map(|i| (i % 255) as u8)
        .collect()
}

fn bench_flip_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_flipped");

    for size in [256_u32, 512, 1024, 2048] {
        let src = framebuffer(size);
        let bytes = src.len() as u64;
        group.throughput(Throughput::Bytes(bytes));
        group.bench_with_input(BenchmarkId::new("square", size), &src, |b, src| {
            let mut dst = ImageData::new(size, size);
            b.iter(|| copy_flipped(black_box(src), &mut dst).expect("flip failed"));
        });
    }

    group.finish();
}

/// Wide and tall buffers stress the row arithmetic differently.
fn bench_flip_aspect_ratios(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_flipped_aspect");

    for (name, width, height) in [("wide", 2048_u32, 128_u32), ("tall", 128, 2048)] {
        let src: Vec<u8> = (0..width as usize * height as usize * 4)
            .map(|i| (i % 255) as u8)
            .collect();
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(BenchmarkId::new("flip", name), &src, |b, src| {
            let mut dst = ImageData::new(width, height);
            b.iter(|| copy_flipped(black_box(src), &mut dst).expect("flip failed"));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_flip_sizes, bench_flip_aspect_ratios);
criterion_main!(benches);
