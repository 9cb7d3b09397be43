//! Audio setup and the real-time callback

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;
use tracing::{error, info};

use polykeys::{
    config::EngineConfig, effects::AnalyserHandle, engine::SynthEngine, io::KeyboardMap,
    synth::SynthMessage, MAX_BLOCK_SIZE,
};

use super::ui::{UiApp, UiLinks};

/// Control messages buffered between UI and audio thread
const CONTROL_QUEUE: usize = 256;

pub fn run(mut config: EngineConfig, octave: i8) -> EyreResult<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let stream_config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = stream_config.sample_rate().0 as f32;
    let channels = stream_config.channels() as usize;
    config.sample_rate = sample_rate;

    info!(sample_rate, channels, voices = config.max_voices, "starting audio");

    let mut engine = SynthEngine::new(config.clone()).wrap_err("failed to build engine")?;

    let voice_count = Arc::new(AtomicUsize::new(0));
    let count_sink = Arc::clone(&voice_count);
    engine.set_voice_count_callback(move |n| count_sink.store(n, Ordering::Relaxed));

    let (control_tx, mut control_rx) = RingBuffer::<SynthMessage>::new(CONTROL_QUEUE);
    // the analyser only exists once the first note builds the chain
    let (mut analyser_tx, analyser_rx) = RingBuffer::<AnalyserHandle>::new(1);
    let mut analyser_sent = false;

    let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device.build_output_stream(
        &stream_config.into(),
        move |data: &mut [f32], _| {
            engine.process_messages(&mut control_rx);

            if !analyser_sent {
                if let Some(handle) = engine.analyser() {
                    analyser_sent = analyser_tx.push(handle).is_ok();
                }
            }

            let total_frames = data.len() / channels;
            let mut frames_written = 0;
            while frames_written < total_frames {
                let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                let block = &mut render_buf[..frames];
                engine.render_block(block);

                // mono to every channel
                let offset = frames_written * channels;
                for (i, &s) in block.iter().enumerate() {
                    let frame = offset + i * channels;
                    data[frame..frame + channels].fill(s);
                }
                frames_written += frames;
            }
        },
        |err| error!(%err, "audio stream error"),
        None,
    )?;

    stream.play().wrap_err("failed to start audio stream")?;

    let links = UiLinks {
        control_tx,
        analyser_rx,
        voice_count,
    };
    let mut app = UiApp::new(links, KeyboardMap::new(octave), &config);

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();

    drop(stream);
    info!("stopped");
    result
}
