//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polykeys::dsp::{oscillator::Oscillator, Waveform};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    let waveforms = [
        Waveform::Sine,     // sin() per sample
        Waveform::Sawtooth, // ramp + PolyBLEP
        Waveform::Square,   // two PolyBLEP corrections
        Waveform::Triangle, // piecewise linear, no correction
    ];

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for waveform in waveforms {
            let mut osc = Oscillator::new(waveform);
            group.bench_with_input(BenchmarkId::new(waveform.name(), size), &size, |b, _| {
                b.iter(|| {
                    for sample in buffer.iter_mut() {
                        *sample = osc.next_sample(black_box(440.0), SAMPLE_RATE);
                    }
                    black_box(&buffer);
                })
            });
        }
    }

    group.finish();
}
