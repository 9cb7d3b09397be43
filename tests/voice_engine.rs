//! End-to-end behavior of the polyphonic engine through its public API.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use polykeys::{
    engine::AudioState,
    patch::SynthOptionsUpdate,
    synth::{DropReason, KeyId, SlotState},
    EngineConfig, Note, NoteOutcome, SynthEngine,
};
use proptest::prelude::*;

const SAMPLE_RATE: f32 = 8_000.0;

fn config(max_voices: usize) -> EngineConfig {
    EngineConfig::default()
        .with_sample_rate(SAMPLE_RATE)
        .with_max_voices(max_voices)
}

fn engine(max_voices: usize) -> SynthEngine {
    SynthEngine::new(config(max_voices)).unwrap()
}

fn note(name: &str) -> Note {
    name.parse().unwrap()
}

/// Default release is 0.8 s and the guard 100 ms.
const RELEASE_PLUS_GUARD: f64 = 0.9;

#[test]
fn first_note_starts_audio_and_builds_chain() {
    let mut engine = engine(4);
    assert_eq!(engine.audio_state(), AudioState::Suspended);
    assert!(engine.analyser().is_none());

    let outcome = engine.start_note("z", "C3").unwrap();
    assert_eq!(outcome, NoteOutcome::Started { slot: 0 });
    assert_eq!(engine.audio_state(), AudioState::Running);
    assert!(engine.analyser().is_some());

    let mut out = vec![0.0f32; 512];
    engine.render_block(&mut out);
    assert!(out.iter().any(|s| s.abs() > 0.0));
    assert!(out.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
}

#[test]
fn invalid_note_name_is_dropped() {
    let mut engine = engine(4);
    let outcome = engine.start_note("z", "H9").unwrap();
    assert_eq!(
        outcome,
        NoteOutcome::Dropped(DropReason::InvalidNote("H9".to_string()))
    );
    assert_eq!(engine.voice_count(), 0);
}

#[test]
fn stealing_takes_releasing_slot_before_oldest_active() {
    let mut engine = engine(3);
    engine.start_note("a", "C4").unwrap();
    engine.advance(0.01);
    engine.start_note("b", "D4").unwrap();
    engine.advance(0.01);
    engine.start_note("c", "E4").unwrap();
    engine.advance(0.01);

    // nothing releasing: the oldest key goes
    let outcome = engine.start_note("d", "F4").unwrap();
    assert_eq!(
        outcome,
        NoteOutcome::Stolen {
            slot: 0,
            from: KeyId::from("a")
        }
    );

    // a releasing slot wins over the now-oldest active "b"
    engine.advance(0.01);
    assert!(engine.stop_note("c"));
    let outcome = engine.start_note("e", "G4").unwrap();
    assert_eq!(
        outcome,
        NoteOutcome::Stolen {
            slot: 2,
            from: KeyId::from("c")
        }
    );
    assert_eq!(engine.voice_count(), 3);
    assert_eq!(engine.pool_status().steals, 2);
}

#[test]
fn double_release_matches_single_release() {
    let mut once = engine(2);
    let mut twice = engine(2);
    for engine in [&mut once, &mut twice] {
        engine.start_note("a", "C4").unwrap();
        engine.advance(0.05);
    }

    assert!(once.stop_note("a"));
    assert!(twice.stop_note("a"));
    assert!(!twice.stop_note("a"));

    assert_eq!(once.pool_status(), twice.pool_status());
    assert_eq!(
        once.pool().reclaim_deadline("a"),
        twice.pool().reclaim_deadline("a")
    );

    once.advance(RELEASE_PLUS_GUARD + 0.05);
    twice.advance(RELEASE_PLUS_GUARD + 0.05);
    assert_eq!(once.voice_count(), 0);
    assert_eq!(twice.voice_count(), 0);
    assert_eq!(twice.pool_status().free, 2);
}

#[test]
fn repress_during_release_cancels_reclaim() {
    let mut engine = engine(4);
    engine.start_note("k", "C4").unwrap();
    engine.advance(0.1);
    engine.stop_note("k");
    engine.advance(0.2);

    let outcome = engine.start_note("k", "E4").unwrap();
    assert_eq!(outcome, NoteOutcome::Rearticulated { slot: 0 });
    assert_eq!(engine.pool().reclaim_deadline("k"), None);

    // well past the first release's deadline
    engine.advance(RELEASE_PLUS_GUARD + 0.2);
    assert_eq!(engine.voice_count(), 1);
    assert_eq!(engine.pool().slot_of("k"), Some(0));
    assert_eq!(engine.pool().slot_state(0), Some(SlotState::Active));
    assert_eq!(engine.pool().slot_note(0), Some(note("E4")));
    assert!(engine.pool().voice(0).unwrap().is_active());
}

#[test]
fn same_key_new_note_glides_without_allocating() {
    let mut engine = engine(4);
    engine.start_note("a", "C4").unwrap();
    engine.advance(0.05);

    let outcome = engine.start_note("a", "D4").unwrap();
    assert_eq!(outcome, NoteOutcome::Rearticulated { slot: 0 });
    assert_eq!(engine.voice_count(), 1);
    assert_eq!(engine.pool_status().allocations, 1);

    let voice = engine.pool().voice(0).unwrap();
    assert!((voice.target_frequency() - note("D4").frequency()).abs() < 0.01);

    engine.advance(0.2);
    let voice = engine.pool().voice(0).unwrap();
    assert!((voice.frequency() - note("D4").frequency()).abs() < 0.5);
}

#[test]
fn callback_tracks_voice_count() {
    let mut engine = engine(2);
    let seen = Arc::new(AtomicUsize::new(usize::MAX));
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let seen = Arc::clone(&seen);
        let calls = Arc::clone(&calls);
        engine.set_voice_count_callback(move |count| {
            seen.store(count, Ordering::SeqCst);
            calls.fetch_add(1, Ordering::SeqCst);
        });
    }

    engine.start_note("a", "C4").unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    engine.start_note("b", "D4").unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 2);

    // rearticulation and a steal leave the count alone
    let before = calls.load(Ordering::SeqCst);
    engine.start_note("a", "E4").unwrap();
    engine.start_note("c", "F4").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), before);

    // releasing keeps the voice counted until its tail is reclaimed
    engine.stop_note("a");
    engine.stop_note("c");
    engine.stop_note("b");
    assert_eq!(engine.voice_count(), 2);
    engine.advance(RELEASE_PLUS_GUARD + 0.05);
    assert_eq!(seen.load(Ordering::SeqCst), 0);
    assert_eq!(engine.voice_count(), 0);
}

#[test]
fn subscribers_receive_changes_until_unsubscribed() {
    let mut engine = engine(4);
    let seen = Arc::new(AtomicUsize::new(0));
    let id = {
        let seen = Arc::clone(&seen);
        engine.subscribe_voice_count(move |count| seen.store(count, Ordering::SeqCst))
    };

    engine.start_note("a", "C4").unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    assert!(engine.unsubscribe_voice_count(id));
    engine.start_note("b", "D4").unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn ninth_key_on_eight_voices_reassigns_one() {
    let mut engine = engine(8);
    let keys = ["a", "s", "d", "f", "g", "h", "j", "k"];
    for (i, key) in keys.iter().enumerate() {
        engine.note_on(*key, Note::from_midi(60 + i as u8).unwrap()).unwrap();
        engine.advance(0.005);
    }
    assert_eq!(engine.voice_count(), 8);

    let outcome = engine.start_note("l", "C5").unwrap();
    let NoteOutcome::Stolen { from, .. } = outcome else {
        panic!("expected a steal, got {outcome:?}");
    };
    assert_eq!(from, KeyId::from("a"));
    assert_eq!(engine.voice_count(), 8);

    let bound: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|key| engine.pool().slot_of(key).is_some())
        .collect();
    assert_eq!(bound.len(), 7);
    assert!(engine.pool().slot_of("l").is_some());
}

#[test]
fn quick_repress_keeps_single_allocation() {
    let mut engine = engine(8);
    engine.start_note("z", "C3").unwrap();
    engine.advance(0.1);
    engine.stop_note("z");
    engine.advance(0.3);
    engine.start_note("z", "C3").unwrap();
    engine.advance(RELEASE_PLUS_GUARD);

    let status = engine.pool_status();
    assert_eq!(status.allocations, 1);
    assert_eq!(status.active, 1);
    assert_eq!(status.releasing, 0);
    let slot = engine.pool().slot_of("z").unwrap();
    assert_eq!(engine.pool().slot_note(slot), Some(note("C3")));
}

#[test]
fn released_key_frees_slot_after_tail_and_guard() {
    let mut engine = engine(8);
    engine.start_note("z", "C3").unwrap();
    engine.advance(0.1);
    engine.stop_note("z");

    engine.advance(0.5);
    assert_eq!(engine.pool().slot_state(0), Some(SlotState::Releasing));

    engine.advance(0.5);
    assert_eq!(engine.pool().slot_state(0), Some(SlotState::Free));
    let status = engine.pool_status();
    assert_eq!(status.free, 8);
    assert_eq!(engine.voice_count(), 0);
}

#[test]
fn new_release_time_applies_to_next_stop() {
    let mut engine = engine(4);
    engine.start_note("z", "C4").unwrap();
    engine.advance(0.05);
    let before = engine.pool().voice(0).unwrap().target_frequency();

    engine.set_synth_options(&SynthOptionsUpdate::default().release(2.0));
    engine.advance(0.01);
    assert_eq!(engine.pool().voice(0).unwrap().target_frequency(), before);
    assert_eq!(engine.synth_options().envelope.release, 2.0);

    let now = engine.now();
    engine.stop_note("z");
    let deadline = engine.pool().reclaim_deadline("z").unwrap();
    assert!((deadline - (now + 2.0 + 0.1)).abs() < 1e-3);

    engine.advance(1.5);
    assert_eq!(engine.voice_count(), 1);
    engine.advance(0.7);
    assert_eq!(engine.voice_count(), 0);
}

#[test]
fn stop_right_after_option_change_uses_new_release() {
    let mut engine = engine(4);
    engine.start_note("a", "C4").unwrap();
    engine.start_note("b", "D4").unwrap();

    // slot 1's update is still staggered when the stop arrives
    engine.set_synth_options(&SynthOptionsUpdate::default().release(1.5));
    let now = engine.now();
    engine.stop_note("b");
    let deadline = engine.pool().reclaim_deadline("b").unwrap();
    assert!((deadline - (now + 1.5 + 0.1)).abs() < 1e-3);
}

#[test]
fn panic_silences_everything() {
    let mut engine = engine(4);
    for key in ["a", "b", "c"] {
        engine.start_note(key, "A3").unwrap();
    }
    engine.advance(0.05);
    engine.stop_note("c");

    engine.all_notes_off();
    assert_eq!(engine.pool_status().releasing, 3);

    // 50 ms window plus the guard
    engine.advance(0.2);
    assert_eq!(engine.voice_count(), 0);

    let mut out = vec![1.0f32; 256];
    engine.render_block(&mut out);
    assert!(out.iter().all(|s| s.abs() < 1e-3));
}

#[test]
fn dispose_is_idempotent_and_final() {
    let mut engine = engine(4);
    let seen = Arc::new(AtomicUsize::new(usize::MAX));
    {
        let seen = Arc::clone(&seen);
        engine.set_voice_count_callback(move |count| seen.store(count, Ordering::SeqCst));
    }
    engine.start_note("a", "C4").unwrap();

    engine.dispose();
    engine.dispose();
    assert!(engine.is_disposed());
    assert_eq!(engine.voice_count(), 0);
    assert_eq!(seen.load(Ordering::SeqCst), 0);
    assert!(engine.analyser().is_none());

    assert_eq!(
        engine.start_note("b", "C4").unwrap(),
        NoteOutcome::Dropped(DropReason::Disposed)
    );
    assert!(!engine.stop_note("a"));
}

#[test]
fn invalid_config_is_rejected() {
    assert!(SynthEngine::new(config(0)).is_err());
    assert!(SynthEngine::new(EngineConfig::default().with_sample_rate(-1.0)).is_err());
}

#[derive(Debug, Clone)]
enum Op {
    Press(u8),
    Release(u8),
    Wait(u16),
    Panic,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..12).prop_map(Op::Press),
        3 => (0u8..12).prop_map(Op::Release),
        2 => (1u16..400).prop_map(Op::Wait),
        1 => Just(Op::Panic),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn polyphony_bound_and_count_hold(
        max_voices in 1usize..6,
        ops in prop::collection::vec(op(), 1..40),
    ) {
        let mut engine = SynthEngine::new(config(max_voices)).unwrap();
        let seen = Arc::new(AtomicUsize::new(0));
        {
            let seen = Arc::clone(&seen);
            engine.set_voice_count_callback(move |count| seen.store(count, Ordering::SeqCst));
        }

        for op in ops {
            match op {
                Op::Press(key) => {
                    let note = Note::from_midi(48 + key).unwrap();
                    let outcome = engine.note_on(format!("k{key}"), note).unwrap();
                    prop_assert!(!outcome.is_dropped());
                }
                Op::Release(key) => {
                    engine.stop_note(&format!("k{key}"));
                }
                Op::Wait(ms) => engine.advance(f64::from(ms) / 1000.0),
                Op::Panic => engine.all_notes_off(),
            }

            let status = engine.pool_status();
            prop_assert!(status.active <= max_voices);
            prop_assert!(engine.voice_count() <= max_voices);
            prop_assert_eq!(status.active + status.releasing, engine.voice_count());
            prop_assert_eq!(status.active + status.releasing + status.free, max_voices);
            prop_assert_eq!(seen.load(Ordering::SeqCst), engine.voice_count());
        }
    }
}
