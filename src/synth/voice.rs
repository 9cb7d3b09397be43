use crate::{
    dsp::{
        envelope::Envelope,
        oscillator::{Oscillator, Waveform},
        ramp::LinearRamp,
    },
    graph::node::RenderCtx,
    patch::SynthOptions,
    synth::note::Note,
};

/*
Voice
=====

One oscillator, one ADSR envelope and one smoothing gain stage:

    Oscillator ──→ × Envelope ──→ × Smoothing ──→ + out

The envelope shapes each note. The smoothing stage exists only to hide
discontinuities the envelope cannot: cutting a sounding note short for a
retrigger or a steal, and masking any residual DC after a release.

Activity
--------

`is_active()` is the musical state: true from `trigger_attack` until
`trigger_release`. It says nothing about audio. A released voice keeps
sounding through its release tail while `is_active()` is already false;
`is_sounding()` reports the audio state.

Transitions
-----------

    trigger_attack(same note, active)  no-op
    trigger_attack(voice silent)       attack starts now
    trigger_attack(voice sounding)     smoothing fades to 0 over RETRIGGER_FADE,
                                       then the attack starts from silence
    trigger_release                    envelope release; over the last
                                       TAIL_FADE of the tail the smoothing
                                       stage fades out as well
    change_note                        pitch glides in log-frequency space,
                                       envelope untouched
    reset                              gain-ramped stop over FORCE_STOP_FADE
    update_options (released, sounding) waveform waits for the next attack

Pitch glides are linear in log2(frequency), so a glide sounds even: the
same time is spent on every semitone.
*/

/// Fade used to silence a sounding voice before a retrigger.
pub const RETRIGGER_FADE_SECONDS: f32 = 0.005;
/// Fade used when a voice is cut off (steal, reset).
pub const FORCE_STOP_FADE_SECONDS: f32 = 0.01;
/// Fade applied by the smoothing stage over the end of a release tail.
pub const TAIL_FADE_SECONDS: f32 = 0.01;
/// Per-voice output level, leaving headroom when many voices sum.
pub const VOICE_GAIN: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterFade {
    Nothing,
    Attack(Note),
    Silence,
}

pub struct Voice {
    sample_rate: f32,
    oscillator: Oscillator,
    envelope: Envelope,
    smoothing: LinearRamp,
    log2_freq: LinearRamp,
    frequency: f32,
    note: Option<Note>,
    active: bool,
    after_fade: AfterFade,
    tail_countdown: Option<u32>,
    pending_waveform: Option<Waveform>,
    disposed: bool,
}

impl Voice {
    pub fn new(options: &SynthOptions, sample_rate: f32) -> Self {
        let env = options.envelope.sanitized();
        Self {
            sample_rate,
            oscillator: Oscillator::new(options.waveform),
            envelope: Envelope::adsr(sample_rate, env.attack, env.decay, env.sustain, env.release),
            smoothing: LinearRamp::new(1.0),
            log2_freq: LinearRamp::new(440.0f32.log2()),
            frequency: 440.0,
            note: None,
            active: false,
            after_fade: AfterFade::Nothing,
            tail_countdown: None,
            pending_waveform: None,
            disposed: false,
        }
    }

    /// Start `note`. Returns false if the call was a no-op (already
    /// playing that note, or disposed).
    pub fn trigger_attack(&mut self, note: Note) -> bool {
        if self.disposed || (self.active && self.note == Some(note)) {
            return false;
        }

        self.active = true;
        self.note = Some(note);
        self.tail_countdown = None;

        if self.is_sounding() {
            self.smoothing
                .ramp_to(0.0, RETRIGGER_FADE_SECONDS, self.sample_rate);
            self.after_fade = AfterFade::Attack(note);
        } else {
            self.begin_attack(note);
        }
        true
    }

    /// Release the current note. Returns false if the voice was not active.
    pub fn trigger_release(&mut self) -> bool {
        self.release_with(None)
    }

    /// Release over an explicit window instead of the envelope's release
    /// time. Used for panic.
    pub fn release_over(&mut self, seconds: f32) -> bool {
        self.release_with(Some(seconds))
    }

    fn release_with(&mut self, window: Option<f32>) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;

        if let AfterFade::Attack(_) = self.after_fade {
            // the attack never started: finish the fade and stay silent
            self.after_fade = AfterFade::Silence;
            return true;
        }

        let seconds = window.unwrap_or_else(|| self.envelope.release_time());
        self.envelope.release_over(seconds);
        // fade starts inside the tail so it lands on audible samples
        let fade = TAIL_FADE_SECONDS.min(seconds);
        self.tail_countdown = Some(((seconds - fade) * self.sample_rate).round() as u32);
        true
    }

    /// Glide to `note` over `glide_seconds` without retriggering the
    /// envelope. An inactive voice has nothing to glide, so it falls back to
    /// a fresh attack. Returns true if a glide was started.
    pub fn change_note(&mut self, note: Note, glide_seconds: f32) -> bool {
        if self.disposed {
            return false;
        }
        if !self.active {
            self.trigger_attack(note);
            return false;
        }
        if self.note == Some(note) {
            return false;
        }

        self.note = Some(note);
        if let AfterFade::Attack(_) = self.after_fade {
            // still fading out the previous sound: start on the new pitch
            self.after_fade = AfterFade::Attack(note);
            return true;
        }

        self.log2_freq
            .ramp_to(note.frequency().log2(), glide_seconds.max(0.0), self.sample_rate);
        true
    }

    /// Apply new waveform/envelope settings. On an active or silent voice
    /// the waveform switches at once. A releasing voice keeps its waveform
    /// until the next attack so its tail does not click. Envelope times
    /// apply to the next segment; a release already running keeps its
    /// length.
    pub fn update_options(&mut self, options: &SynthOptions) {
        let env = options.envelope.sanitized();
        if !self.active && self.is_sounding() {
            self.pending_waveform = Some(options.waveform);
        } else {
            self.oscillator.set_waveform(options.waveform);
            self.pending_waveform = None;
        }
        self.envelope
            .set_params(env.attack, env.decay, env.sustain, env.release);
    }

    /// Stop immediately with a short gain ramp and forget the note.
    pub fn reset(&mut self) {
        self.active = false;
        self.note = None;
        self.tail_countdown = None;
        if self.is_sounding() {
            self.smoothing
                .ramp_to(0.0, FORCE_STOP_FADE_SECONDS, self.sample_rate);
            self.after_fade = AfterFade::Silence;
        } else {
            self.after_fade = AfterFade::Nothing;
        }
    }

    /// Stop and refuse all further work. Safe to call more than once and
    /// while a fade is still running; the fade simply finishes silent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.reset();
        self.disposed = true;
    }

    fn begin_attack(&mut self, note: Note) {
        let freq = note.frequency();
        self.log2_freq.set_immediate(freq.log2());
        self.frequency = freq;
        if let Some(waveform) = self.pending_waveform.take() {
            self.oscillator.set_waveform(waveform);
        }
        self.oscillator.reset();
        self.smoothing.set_immediate(1.0);
        self.envelope.note_on();
        self.after_fade = AfterFade::Nothing;
    }

    fn finish_fade(&mut self) {
        match self.after_fade {
            AfterFade::Attack(note) => self.begin_attack(note),
            AfterFade::Silence => {
                self.envelope.reset();
                if let Some(waveform) = self.pending_waveform.take() {
                    self.oscillator.set_waveform(waveform);
                }
                self.after_fade = AfterFade::Nothing;
            }
            AfterFade::Nothing => {}
        }
    }

    /// Render and add this voice's output into `out`.
    pub fn render_into(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        if !self.is_sounding() {
            return;
        }

        for sample in out.iter_mut() {
            if self.after_fade != AfterFade::Nothing && self.smoothing.is_settled() {
                self.finish_fade();
            }

            if let Some(remaining) = self.tail_countdown {
                if remaining == 0 {
                    self.smoothing
                        .ramp_to(0.0, TAIL_FADE_SECONDS, self.sample_rate);
                    self.tail_countdown = None;
                } else {
                    self.tail_countdown = Some(remaining - 1);
                }
            }

            if !self.log2_freq.is_settled() {
                self.frequency = self.log2_freq.next_sample().exp2();
            }

            let osc = self.oscillator.next_sample(self.frequency, ctx.sample_rate);
            let env = self.envelope.next_sample();
            let gain = self.smoothing.next_sample();

            *sample += osc * env * gain * VOICE_GAIN;
        }

        if self.after_fade != AfterFade::Nothing && self.smoothing.is_settled() {
            self.finish_fade();
        }
    }

    /// Musical state: between attack and release.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Audio state: producing (or about to produce) non-zero output.
    pub fn is_sounding(&self) -> bool {
        !self.disposed && (self.envelope.is_active() || self.after_fade != AfterFade::Nothing)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn note(&self) -> Option<Note> {
        self.note
    }

    /// Oscillator frequency on the most recent sample.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Waveform the next attack will use.
    pub fn waveform(&self) -> Waveform {
        self.pending_waveform
            .unwrap_or_else(|| self.oscillator.waveform())
    }

    /// Frequency the voice is gliding toward.
    pub fn target_frequency(&self) -> f32 {
        self.log2_freq.target().exp2()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}
