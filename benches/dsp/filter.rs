//! Benchmarks for the state-variable filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polykeys::dsp::{filter::SVFilter, FilterType};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut buffer = input.clone();

        for filter_type in [
            FilterType::LowPass,
            FilterType::HighPass,
            FilterType::BandPass,
            FilterType::Notch,
        ] {
            let mut filter = SVFilter::new(filter_type, 1_000.0, 0.707);
            group.bench_with_input(
                BenchmarkId::new(filter_type.name(), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.copy_from_slice(&input);
                        filter.render(black_box(&mut buffer), SAMPLE_RATE);
                    })
                },
            );
        }

        // Cutoff sweep: recomputes coefficients every sample
        let mut filter = SVFilter::lowpass(200.0);
        group.bench_with_input(BenchmarkId::new("lowpass_sweep", size), &size, |b, _| {
            b.iter(|| {
                filter.ramp_cutoff(8_000.0, 0.01, SAMPLE_RATE);
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), SAMPLE_RATE);
                filter.set_cutoff(200.0);
            })
        });
    }

    group.finish();
}
