//! Benchmarks for reverb processing.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polykeys::dsp::reverb::SchroederReverb;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    for &size in BLOCK_SIZES {
        // Impulse followed by a quiet tail
        let input: Vec<f32> = (0..size)
            .map(|i| {
                if i < 10 {
                    1.0 - (i as f32 / 10.0)
                } else {
                    (i as f32 * 0.05).sin() * 0.1
                }
            })
            .collect();

        for decay in [0.5f32, 2.5, 8.0] {
            let mut reverb = SchroederReverb::new(SAMPLE_RATE, decay);
            group.bench_with_input(
                BenchmarkId::new(format!("decay_{decay}s"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        let mut sum = 0.0f32;
                        for &sample in &input {
                            sum += reverb.process(black_box(sample));
                        }
                        sum
                    })
                },
            );
        }

        // Damped tail adds a one-pole per comb
        let mut reverb = SchroederReverb::new(SAMPLE_RATE, 2.5);
        reverb.set_dampening_hz(3_000.0);
        group.bench_with_input(BenchmarkId::new("damped", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &sample in &input {
                    sum += reverb.process(black_box(sample));
                }
                sum
            })
        });
    }

    group.finish();
}
