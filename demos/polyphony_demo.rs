//! Offline walk through the voice pool: a chord, a steal, a legato glide,
//! a quick re-press and a panic, rendered without an audio device.
//!
//! Run with: cargo run --example polyphony_demo
//! More detail: RUST_LOG=polykeys=debug cargo run --example polyphony_demo

use polykeys::{
    patch::SynthOptionsUpdate, EngineConfig, EngineError, NoteOutcome, SynthEngine,
};
use tracing_subscriber::EnvFilter;

const SAMPLE_RATE: f32 = 48_000.0;
const BLOCK: usize = 512;

fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EngineConfig::default()
        .with_sample_rate(SAMPLE_RATE)
        .with_max_voices(4);
    let mut engine = SynthEngine::new(config)?;
    engine.set_voice_count_callback(|count| println!("  voices: {count}"));

    println!("C major 7 on four voices");
    for (key, note) in [("a", "C4"), ("s", "E4"), ("d", "G4"), ("f", "B4")] {
        report(key, engine.start_note(key, note)?);
        bounce(&mut engine, 0.05);
    }
    bounce(&mut engine, 0.5);

    println!("fifth key steals the oldest");
    report("g", engine.start_note("g", "D5")?);
    bounce(&mut engine, 0.3);

    println!("same key, new note: glide");
    report("s", engine.start_note("s", "F4")?);
    bounce(&mut engine, 0.3);

    println!("release and re-press before the tail ends");
    engine.stop_note("d");
    bounce(&mut engine, 0.2);
    report("d", engine.start_note("d", "G4")?);
    bounce(&mut engine, 0.3);

    println!("longer release for what follows");
    engine.set_synth_options(&SynthOptionsUpdate::default().release(1.5));
    for key in ["s", "d", "f", "g"] {
        engine.stop_note(key);
    }
    bounce(&mut engine, 0.5);

    println!("panic");
    engine.all_notes_off();
    bounce(&mut engine, 0.5);

    let status = engine.pool_status();
    println!(
        "done at {:.2}s: {} allocations, {} steals, {} free slots",
        engine.now(),
        status.allocations,
        status.steals,
        status.free
    );

    engine.dispose();
    Ok(())
}

fn report(key: &str, outcome: NoteOutcome) {
    match outcome {
        NoteOutcome::Started { slot } => println!("  {key}: started on slot {slot}"),
        NoteOutcome::Rearticulated { slot } => println!("  {key}: re-articulated slot {slot}"),
        NoteOutcome::Stolen { slot, from } => println!("  {key}: stole slot {slot} from {from}"),
        NoteOutcome::Dropped(reason) => println!("  {key}: dropped ({reason:?})"),
    }
}

/// Render `seconds` of audio block by block and print the peak.
fn bounce(engine: &mut SynthEngine, seconds: f32) {
    let blocks = (seconds * SAMPLE_RATE / BLOCK as f32).ceil() as usize;
    let mut buffer = [0.0f32; BLOCK];
    let mut peak = 0.0f32;
    for _ in 0..blocks {
        engine.render_block(&mut buffer);
        peak = buffer.iter().fold(peak, |acc, &s| acc.max(s.abs()));
    }
    println!("  rendered {seconds:.2}s, peak {peak:.3}");
}
