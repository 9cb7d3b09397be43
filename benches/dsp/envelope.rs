//! Benchmarks for ADSR envelope generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polykeys::dsp::envelope::Envelope;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack/decay: curve math every sample
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.01, 0.2, 0.5, 0.8);
        group.bench_with_input(BenchmarkId::new("attack_decay", size), &size, |b, _| {
            b.iter(|| {
                env.note_on();
                for sample in buffer.iter_mut() {
                    *sample = env.next_sample();
                }
                black_box(&buffer);
            })
        });

        // Sustain: steady state
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.001, 0.001, 0.5, 0.8);
        env.note_on();
        for _ in 0..1_000 {
            env.next_sample();
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = env.next_sample();
                }
                black_box(&buffer);
            })
        });

        // Release from sustain
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.001, 0.001, 0.5, 0.8);
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                env.note_on();
                env.note_off();
                for sample in buffer.iter_mut() {
                    *sample = env.next_sample();
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
