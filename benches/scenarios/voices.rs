//! Benchmarks for single voices and a hand-mixed stack of them.
//!
//! Each voice is oscillator → gain smoothing → envelope, summed into the
//! output buffer the way the pool renders them.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polykeys::{
    dsp::Waveform,
    graph::node::RenderCtx,
    patch::SynthOptions,
    synth::{Note, Voice},
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn note(midi: u8) -> Note {
    Note::from_midi(midi).unwrap()
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === SINGLE VOICE ===
        // sustained sawtooth, the default patch
        let mut voice = Voice::new(&SynthOptions::default(), SAMPLE_RATE);
        voice.trigger_attack(note(45)); // A2
        group.bench_with_input(BenchmarkId::new("single", size), &size, |b, _| {
            b.iter(|| {
                buffer.fill(0.0);
                voice.render_into(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // === GLIDING VOICE ===
        // legato pitch ramp runs per sample
        let mut voice = Voice::new(&SynthOptions::default(), SAMPLE_RATE);
        voice.trigger_attack(note(57));
        group.bench_with_input(BenchmarkId::new("glide", size), &size, |b, _| {
            b.iter(|| {
                voice.change_note(note(64), 0.05);
                buffer.fill(0.0);
                voice.render_into(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // === CHORD ===
        // four sine voices summed, a typical held chord
        let options = SynthOptions {
            waveform: Waveform::Sine,
            ..SynthOptions::default()
        };
        let mut chord: Vec<Voice> = [60u8, 64, 67, 71]
            .iter()
            .map(|&midi| {
                let mut voice = Voice::new(&options, SAMPLE_RATE);
                voice.trigger_attack(note(midi));
                voice
            })
            .collect();
        group.bench_with_input(BenchmarkId::new("chord_4", size), &size, |b, _| {
            b.iter(|| {
                buffer.fill(0.0);
                for voice in chord.iter_mut() {
                    voice.render_into(black_box(&mut buffer), black_box(&ctx));
                }
            })
        });
    }

    group.finish();
}
