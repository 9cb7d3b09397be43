//! Whole-engine rendering with a growing number of held keys.
//!
//! Covers the per-chunk timer service, every bound voice and the effect
//! chain. The 16-key case fills the default pool.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polykeys::{synth::Note, EngineConfig, SynthEngine};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn engine_with_keys(keys: u8) -> SynthEngine {
    let config = EngineConfig::default().with_sample_rate(SAMPLE_RATE);
    let mut engine = SynthEngine::new(config).unwrap();
    for i in 0..keys {
        let note = Note::from_midi(48 + i).unwrap();
        engine.note_on(format!("k{i}"), note).unwrap();
    }
    engine
}

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for keys in [1u8, 4, 8, 16] {
            let mut engine = engine_with_keys(keys);
            group.bench_with_input(
                BenchmarkId::new(format!("{keys}_keys"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        engine.render_block(black_box(&mut buffer));
                    })
                },
            );
        }

        // Stealing on every iteration: the pool is full and a new key
        // arrives each block
        let mut engine = engine_with_keys(16);
        let mut next = 0u32;
        group.bench_with_input(BenchmarkId::new("steal", size), &size, |b, _| {
            b.iter(|| {
                next = next.wrapping_add(1);
                let note = Note::from_midi(36 + (next % 48) as u8).unwrap();
                let _ = engine.note_on(format!("s{next}"), note);
                engine.render_block(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
