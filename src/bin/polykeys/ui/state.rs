//! Control-panel state
//!
//! The UI keeps its own copy of every setting it can change. Each change
//! returns the message that carries it to the audio thread, so the engine
//! itself is never read from the UI side.

use polykeys::{
    config::EngineConfig,
    dsp::{
        filter::{MAX_CUTOFF_HZ, MIN_CUTOFF_HZ},
        FilterType, Waveform,
    },
    effects::EffectParam,
    patch::{FilterUpdate, SynthOptionsUpdate},
    synth::SynthMessage,
};

const VOLUME_STEP: f32 = 5.0;
const CUTOFF_STEP: f32 = 1.25;
const MIX_STEP: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct PanelState {
    pub waveform: Waveform,
    pub filter_type: FilterType,
    pub cutoff_hz: f32,
    /// 0-100
    pub volume_percent: f32,
    pub reverb_mix: f32,
    pub delay_mix: f32,
    pub chorus_mix: f32,
    pub sample_rate: f32,
    pub max_voices: usize,
}

impl PanelState {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            waveform: config.synth.waveform,
            filter_type: config.filter.filter_type,
            cutoff_hz: config.filter.frequency,
            // invert percent_to_db: dB = p/100*60 - 60
            volume_percent: ((config.effects.master_volume_db + 60.0) / 60.0 * 100.0)
                .clamp(0.0, 100.0),
            reverb_mix: config.effects.reverb.wet,
            delay_mix: config.effects.delay.wet,
            chorus_mix: config.effects.chorus.wet,
            sample_rate: config.sample_rate,
            max_voices: config.max_voices,
        }
    }

    pub fn cycle_waveform(&mut self) -> SynthMessage {
        self.waveform = self.waveform.next();
        SynthMessage::SetSynthOptions(SynthOptionsUpdate::default().waveform(self.waveform))
    }

    pub fn cycle_filter(&mut self) -> SynthMessage {
        self.filter_type = match self.filter_type {
            FilterType::LowPass => FilterType::HighPass,
            FilterType::HighPass => FilterType::BandPass,
            FilterType::BandPass => FilterType::Notch,
            FilterType::Notch => FilterType::LowPass,
        };
        SynthMessage::SetFilter(FilterUpdate::default().filter_type(self.filter_type))
    }

    /// Move the cutoff by a musical step (a third of an octave).
    pub fn nudge_cutoff(&mut self, up: bool) -> SynthMessage {
        let factor = if up { CUTOFF_STEP } else { 1.0 / CUTOFF_STEP };
        self.cutoff_hz = (self.cutoff_hz * factor).clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ);
        SynthMessage::SetFilter(FilterUpdate::default().frequency(self.cutoff_hz))
    }

    pub fn nudge_volume(&mut self, up: bool) -> SynthMessage {
        let step = if up { VOLUME_STEP } else { -VOLUME_STEP };
        self.volume_percent = (self.volume_percent + step).clamp(0.0, 100.0);
        SynthMessage::Effect(EffectParam::MasterVolume(self.volume_percent))
    }

    pub fn nudge_reverb(&mut self, up: bool) -> SynthMessage {
        self.reverb_mix = step_mix(self.reverb_mix, up);
        SynthMessage::Effect(EffectParam::ReverbMix(self.reverb_mix))
    }

    pub fn nudge_delay(&mut self, up: bool) -> SynthMessage {
        self.delay_mix = step_mix(self.delay_mix, up);
        SynthMessage::Effect(EffectParam::DelayMix(self.delay_mix))
    }

    pub fn nudge_chorus(&mut self, up: bool) -> SynthMessage {
        self.chorus_mix = step_mix(self.chorus_mix, up);
        SynthMessage::Effect(EffectParam::ChorusMix(self.chorus_mix))
    }
}

fn step_mix(value: f32, up: bool) -> f32 {
    let step = if up { MIX_STEP } else { -MIX_STEP };
    // keep to one decimal so repeated steps land on 0 and 1 exactly
    ((value + step) * 10.0).round().clamp(0.0, 10.0) / 10.0
}
