//! Benchmarks for delay line operations.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polykeys::dsp::delay::DelayLine;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Delay times in samples at 48kHz
    let delay_times: &[f32] = &[
        480.0,   // 10ms
        4800.0,  // 100ms
        48000.0, // 1 second
    ];

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        for &delay_samples in delay_times {
            let delay_ms = delay_samples / 48.0;
            let mut delay = DelayLine::with_max_seconds(1.5, SAMPLE_RATE);
            group.bench_with_input(
                BenchmarkId::new(format!("fixed_{}ms", delay_ms as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        let mut sum = 0.0f32;
                        for &sample in &input {
                            sum += delay.next_sample(sample, black_box(delay_samples));
                        }
                        sum
                    })
                },
            );
        }

        // Modulated read, as the chorus does it
        let mut delay = DelayLine::with_max_seconds(0.05, SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("modulated", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for (i, &sample) in input.iter().enumerate() {
                    let delay_time = 168.0 + (i as f32 * 0.1).sin() * 48.0;
                    sum += delay.next_sample(sample, black_box(delay_time));
                }
                sum
            })
        });
    }

    group.finish();
}
