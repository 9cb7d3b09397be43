pub mod backend;
pub mod observer;
pub mod scheduler;

use tracing::{debug, warn};

use crate::{
    config::EngineConfig,
    effects::{analyser::AnalyserHandle, controller::EffectController},
    error::EngineError,
    graph::node::RenderCtx,
    patch::{FilterSettings, FilterUpdate, SynthOptions, SynthOptionsUpdate},
    synth::{
        message::{MessageReceiver, SynthMessage},
        note::Note,
        pool::{DropReason, KeyId, NoteOutcome, PoolStatus, VoicePool},
    },
    MAX_BLOCK_SIZE,
};

use self::{
    backend::{AudioBackend, NoopBackend, UnlockState},
    observer::{SubscriptionId, VoiceCountObservers},
};

/*
Synth Engine
============

The one object a host talks to. It turns (key, note) intent into pool
operations, owns the shared effect chain, keeps the audio clock, and tells
observers how many voices are sounding.

    input ──start_note/stop_note──→ SynthEngine ──→ VoicePool ──Σ──→ EffectChain ──→ out
                                        │
                                        ├── audio clock (advanced by render_block)
                                        ├── timers serviced at every block start
                                        └── voice-count observers

Lifecycle
---------

    new ──first note──→ backend unlock ──→ effect chain built ──→ playing
                             │
                             └─ failure: error returned, pool untouched,
                                the next note tries again

    dispose: all notes off, timers cancelled, pool and chain torn down.
    Everything afterwards is a silent no-op.

Time
----

Nothing here reads a wall clock. "Release in 0.8 s" means 0.8 s of rendered
audio: `render_block` advances the clock by frames / sample rate, and
`advance` renders (and discards) audio to move time forward without a
device. Timers are checked at the start of every block of up to
MAX_BLOCK_SIZE frames, so they fire at block granularity.
*/

/// State of the audio backend as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    /// Nothing has asked for audio yet.
    Suspended,
    /// An unlock is in flight.
    Unlocking,
    Running,
    /// The last unlock failed; the next note retries.
    Failed,
}

pub struct SynthEngine {
    config: EngineConfig,
    pool: VoicePool,
    effects: EffectController,
    backend: Box<dyn AudioBackend>,
    audio_state: AudioState,
    audio_error: Option<String>,
    observers: VoiceCountObservers,
    clock: f64,
    scratch: Vec<f32>,
    disposed: bool,
}

impl SynthEngine {
    /// Engine with a backend that is always running.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_backend(config, NoopBackend)
    }

    pub fn with_backend(
        config: EngineConfig,
        backend: impl AudioBackend + 'static,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let effects = EffectController::new(
            config.sample_rate,
            config.analyser_size,
            config.filter,
            config.effects,
        );

        Ok(Self {
            pool: VoicePool::new(&config),
            effects,
            config,
            backend: Box::new(backend),
            audio_state: AudioState::Suspended,
            audio_error: None,
            observers: VoiceCountObservers::new(),
            clock: 0.0,
            scratch: vec![0.0; MAX_BLOCK_SIZE],
            disposed: false,
        })
    }

    /// Start `note` (a pitch name like `"C#4"`) on `key`.
    ///
    /// An unparseable name drops the note with a warning. The only error is
    /// an audio backend that refuses to start.
    pub fn start_note(
        &mut self,
        key: impl Into<KeyId>,
        note: &str,
    ) -> Result<NoteOutcome, EngineError> {
        match note.parse::<Note>() {
            Ok(note) => self.note_on(key, note),
            Err(err) => {
                let key = key.into();
                warn!(%key, %err, "invalid note name, note dropped");
                Ok(NoteOutcome::Dropped(DropReason::InvalidNote(note.to_string())))
            }
        }
    }

    /// Start an already-parsed note on `key`.
    pub fn note_on(
        &mut self,
        key: impl Into<KeyId>,
        note: Note,
    ) -> Result<NoteOutcome, EngineError> {
        let key = key.into();
        if self.disposed {
            debug!(%key, "note on after dispose ignored");
            return Ok(NoteOutcome::Dropped(DropReason::Disposed));
        }

        self.ensure_audio()?;
        self.effects.ensure_chain();
        self.service();

        let outcome = self.pool.acquire(key, note, self.clock);
        self.notify_count();
        Ok(outcome)
    }

    /// Release `key`. Unknown or already released keys are ignored.
    ///
    /// The voice count does not change here; it drops when the release tail
    /// and guard have elapsed and the slot is reclaimed.
    pub fn stop_note(&mut self, key: &str) -> bool {
        if self.disposed {
            return false;
        }
        self.pool.release(key, self.clock)
    }

    /// Merge a partial waveform/envelope change and send it to every voice.
    pub fn set_synth_options(&mut self, update: &SynthOptionsUpdate) {
        if self.disposed || update.is_empty() {
            return;
        }
        self.pool.update_synth_options(update, self.clock);
        debug!(options = ?self.pool.options(), "synth options updated");
    }

    pub fn synth_options(&self) -> SynthOptions {
        self.pool.options()
    }

    /// Merge a partial filter change into the shared filter.
    pub fn set_filter_settings(&mut self, update: &FilterUpdate) {
        self.effects.apply_filter_update(update);
    }

    pub fn filter_settings(&self) -> FilterSettings {
        self.effects.filter_settings()
    }

    pub fn effects(&self) -> &EffectController {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut EffectController {
        &mut self.effects
    }

    /// Panic: release every voice over the configured short window. The
    /// count reaches zero once that window and the guard have passed.
    pub fn all_notes_off(&mut self) {
        if self.disposed {
            return;
        }
        debug!(voices = self.pool.active_count(), "all notes off");
        self.pool
            .release_all(self.config.panic_release_seconds, self.clock);
    }

    /// Silence everything and tear down the pool and effect chain. Safe to
    /// call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            debug!("engine already disposed");
            return;
        }
        self.all_notes_off();
        self.pool.dispose();
        self.effects.dispose();
        self.disposed = true;
        self.notify_count();
        debug!("engine disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Voices bound to a key, including those in their release tail.
    pub fn voice_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn pool_status(&self) -> PoolStatus {
        self.pool.status()
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    /// Log the pool's slots at trace level.
    pub fn debug_status(&self) {
        self.pool.debug_status(self.clock);
    }

    pub fn subscribe_voice_count(
        &mut self,
        callback: impl FnMut(usize) + Send + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(Box::new(callback))
    }

    pub fn unsubscribe_voice_count(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Replace the single voice-count callback. Subscribers added with
    /// [`subscribe_voice_count`](Self::subscribe_voice_count) are kept.
    pub fn set_voice_count_callback(&mut self, callback: impl FnMut(usize) + Send + 'static) {
        self.observers.set_primary(Some(Box::new(callback)));
    }

    pub fn clear_voice_count_callback(&mut self) {
        self.observers.set_primary(None);
    }

    /// Waveform tap, or `None` before the first note has built the chain.
    pub fn analyser(&self) -> Option<AnalyserHandle> {
        self.effects.analyser()
    }

    pub fn audio_state(&self) -> AudioState {
        self.audio_state
    }

    /// Message from the last failed backend start, if it failed.
    pub fn audio_error(&self) -> Option<&str> {
        self.audio_error.as_deref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Audio clock in seconds.
    pub fn now(&self) -> f64 {
        self.clock
    }

    /// Render mono output into `out`, advancing the clock.
    pub fn render_block(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_chunk(chunk);
        }
    }

    /// Render and discard `seconds` of audio, firing any timers that fall
    /// due along the way.
    pub fn advance(&mut self, seconds: f64) {
        let frames = (seconds.max(0.0) * f64::from(self.config.sample_rate)).round() as usize;
        let mut scratch = std::mem::take(&mut self.scratch);

        let mut remaining = frames;
        while remaining > 0 {
            let n = remaining.min(scratch.len());
            self.render_chunk(&mut scratch[..n]);
            remaining -= n;
        }

        self.scratch = scratch;
        self.service();
    }

    /// Fire timers due at the current clock and report count changes.
    pub fn service(&mut self) {
        if self.pool.service(self.clock) {
            self.notify_count();
        }
    }

    /// Drain and apply every pending control message.
    pub fn process_messages<R: MessageReceiver + ?Sized>(&mut self, rx: &mut R) {
        while let Some(msg) = rx.pop() {
            self.handle_message(msg);
        }
    }

    pub fn handle_message(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::NoteOn { key, note } => {
                if let Err(err) = self.note_on(key, note) {
                    warn!(%err, "note on failed");
                }
            }
            SynthMessage::NoteOff { key } => {
                self.stop_note(key.as_str());
            }
            SynthMessage::AllNotesOff => self.all_notes_off(),
            SynthMessage::SetSynthOptions(update) => self.set_synth_options(&update),
            SynthMessage::SetFilter(update) => self.set_filter_settings(&update),
            SynthMessage::Effect(param) => self.effects.apply(param),
        }
    }

    fn render_chunk(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        if self.disposed {
            return;
        }

        self.service();

        let ctx = RenderCtx::new(self.config.sample_rate, self.clock);
        self.pool.render(out, &ctx);
        if let Some(chain) = self.effects.chain_mut() {
            chain.process(out, &ctx);
        }

        self.clock += ctx.frames_to_seconds(out.len());
    }

    fn ensure_audio(&mut self) -> Result<(), EngineError> {
        let result = match self.audio_state {
            AudioState::Running => return Ok(()),
            AudioState::Unlocking => self.backend.poll(),
            AudioState::Suspended | AudioState::Failed => self.backend.unlock(),
        };

        match result {
            Ok(UnlockState::Running) => {
                debug!("audio running");
                self.audio_state = AudioState::Running;
                self.audio_error = None;
                Ok(())
            }
            Ok(UnlockState::Pending) => {
                self.audio_state = AudioState::Unlocking;
                Ok(())
            }
            Err(err) => {
                warn!(%err, "audio backend failed to start");
                self.audio_state = AudioState::Failed;
                self.audio_error = Some(err.to_string());
                Err(EngineError::AudioInit(err.to_string()))
            }
        }
    }

    fn notify_count(&mut self) {
        self.observers.notify(self.pool.active_count());
    }
}
