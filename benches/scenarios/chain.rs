//! Benchmarks for the shared master effect chain.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polykeys::{
    effects::EffectChain,
    graph::node::RenderCtx,
    patch::{EffectSettings, FilterSettings},
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/chain");
    let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);
    let filter = FilterSettings::default();

    // Every send open
    let mut wet = EffectSettings::default();
    wet.chorus.wet = 0.5;
    wet.delay.wet = 0.4;
    wet.reverb.wet = 0.3;

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin() * 0.3).collect();
        let mut buffer = input.clone();

        // Defaults: all effects dry, filter and volume still run
        let mut chain = EffectChain::new(SAMPLE_RATE, &filter, &EffectSettings::default(), 256);
        group.bench_with_input(BenchmarkId::new("dry", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                chain.process(black_box(&mut buffer), black_box(&ctx));
            })
        });

        let mut chain = EffectChain::new(SAMPLE_RATE, &filter, &wet, 256);
        group.bench_with_input(BenchmarkId::new("full_wet", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                chain.process(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
