//! Criterion benchmarks for traza-core spectral primitives
//!
//! Run with: cargo bench -p traza-core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use traza_core::{PeakTable, WindowFunction, climb_to_local_max, fftshift, parabolic_peak};

/// Generate a dB-like trace with peaks every `period` bins.
fn generate_trace(size: usize, period: usize) -> Vec<f32> {
    let mut state = 0x12345678u32;
    (0..size)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let noise = (state as i32 as f32) / (i32::MAX as f32) * 3.0;
            let tone = if i % period == period / 2 { 60.0 } else { 0.0 };
            -90.0 + noise + tone
        })
        .collect()
}

// ============================================================================
// Window table benchmarks
// ============================================================================

fn bench_window_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("WindowTable");

    let size = 4096;

    for window in [
        WindowFunction::Boxcar,
        WindowFunction::Hanning,
        WindowFunction::BlackmanHarris,
        WindowFunction::Cosine7Term,
        WindowFunction::FlatTop,
    ] {
        group.bench_function(window.name(), |b| {
            b.iter(|| {
                let table: Vec<f64> = (0..size).map(|j| window.weight(j, black_box(size))).collect();
                black_box(table)
            })
        });
    }

    group.finish();
}

// ============================================================================
// Peak scan benchmarks
// ============================================================================

fn bench_peak_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("PeakScan");

    let sizes = [1024, 4096, 16384, 65536];

    for &size in &sizes {
        let trace = generate_trace(size, 512);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut table = PeakTable::new();
                table.seed(0, trace[0]);
                table.scan(black_box(&trace), 0);
                black_box(table)
            })
        });
    }

    group.finish();
}

fn bench_climb(c: &mut Criterion) {
    let mut group = c.benchmark_group("ClimbToLocalMax");

    let trace = generate_trace(16384, 1024);

    group.bench_function("predicted_starts", |b| {
        b.iter(|| {
            let mut acc = 0usize;
            for start in (0..16384).step_by(997) {
                acc = acc.wrapping_add(climb_to_local_max(black_box(&trace), start));
            }
            black_box(acc)
        })
    });

    group.finish();
}

// ============================================================================
// Spectrum layout benchmarks
// ============================================================================

fn bench_fftshift(c: &mut Criterion) {
    let mut group = c.benchmark_group("FftShift");

    let sizes = [1024, 4096, 16384];

    for &size in &sizes {
        let bins: Vec<f32> = (0..size).map(|i| i as f32).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut spectrum = bins.clone();
                fftshift(black_box(&mut spectrum));
                black_box(spectrum)
            })
        });
    }

    group.finish();
}

fn bench_parabolic_refinement(c: &mut Criterion) {
    let mut group = c.benchmark_group("ParabolicPeak");

    group.bench_function("vertex_fit", |b| {
        b.iter(|| {
            let mut acc = 0.0f64;
            for i in 0..1000 {
                let vertex = f64::from(i) / 1000.0 - 0.5;
                let f = |x: f64| 1.0 - 0.8 * (x - vertex) * (x - vertex);
                let peak = parabolic_peak(black_box(f(-1.0)), f(0.0), f(1.0));
                acc += peak.offset;
            }
            black_box(acc)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_window_tables,
    bench_peak_scan,
    bench_climb,
    bench_fftshift,
    bench_parabolic_refinement,
);

criterion_main!(benches);
