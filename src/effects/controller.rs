//! User-facing effect controls.
//!
//! A thin layer of unit conversions in front of the effect chain: volume as a
//! percentage, reverb "size" as 0-1, everything else in the node's own units.
//! Every write is stored in [`EffectSettings`] / [`FilterSettings`] first and
//! forwarded to the chain if it exists, so values set before the first note
//! are applied when the chain is created.

use tracing::debug;

use crate::{
    dsp::{filter::FilterType, gain::percent_to_db},
    effects::{analyser::AnalyserHandle, chain::EffectChain},
    graph::{
        chorus::ChorusParam, delay::DelayParam, filter::FilterParam, node::Parameterized,
        reverb::ReverbParam, volume::VolumeParam,
    },
    patch::{EffectSettings, FilterSettings, FilterUpdate},
};

/// Shortest reverb the size control reaches.
pub const REVERB_MIN_DECAY: f32 = 0.5;
/// Longest reverb the size control reaches.
pub const REVERB_MAX_DECAY: f32 = 10.0;

/// Map the 0-1 reverb size control onto a decay time in seconds.
pub fn reverb_size_to_decay(size: f32) -> f32 {
    let size = if size.is_finite() { size.clamp(0.0, 1.0) } else { 0.0 };
    REVERB_MIN_DECAY + size * (REVERB_MAX_DECAY - REVERB_MIN_DECAY)
}

/// One effect-control write, as sent across threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectParam {
    /// 0-100 %
    MasterVolume(f32),
    /// Hz
    FilterFrequency(f32),
    /// Q
    FilterResonance(f32),
    FilterType(FilterType),
    /// LFO Hz
    ChorusFrequency(f32),
    /// 0-1
    ChorusDepth(f32),
    /// 0-1
    ChorusMix(f32),
    /// Seconds
    DelayTime(f32),
    /// 0-0.95
    DelayFeedback(f32),
    /// 0-1
    DelayMix(f32),
    /// 0-1, mapped to 0.5-10 s of decay
    ReverbSize(f32),
    /// Hz
    ReverbDampening(f32),
    /// 0-1
    ReverbMix(f32),
}

pub struct EffectController {
    sample_rate: f32,
    analyser_size: usize,
    filter: FilterSettings,
    settings: EffectSettings,
    chain: Option<EffectChain>,
}

impl EffectController {
    pub fn new(
        sample_rate: f32,
        analyser_size: usize,
        filter: FilterSettings,
        settings: EffectSettings,
    ) -> Self {
        Self {
            sample_rate,
            analyser_size,
            filter,
            settings,
            chain: None,
        }
    }

    /// Create the chain from the stored settings if it does not exist yet.
    pub fn ensure_chain(&mut self) -> &mut EffectChain {
        let (sample_rate, analyser_size) = (self.sample_rate, self.analyser_size);
        let (filter, settings) = (&self.filter, &self.settings);
        self.chain.get_or_insert_with(|| {
            debug!(sample_rate, "creating effect chain");
            EffectChain::new(sample_rate, filter, settings, analyser_size)
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.chain.is_some()
    }

    pub fn chain_mut(&mut self) -> Option<&mut EffectChain> {
        self.chain.as_mut()
    }

    /// `None` until the chain has been created.
    pub fn analyser(&self) -> Option<AnalyserHandle> {
        self.chain.as_ref().map(EffectChain::analyser)
    }

    /// Tear the chain down. Stored settings survive; a later
    /// [`ensure_chain`](Self::ensure_chain) rebuilds it from them.
    pub fn dispose(&mut self) {
        if self.chain.take().is_some() {
            debug!("effect chain disposed");
        }
    }

    pub fn filter_settings(&self) -> FilterSettings {
        self.filter
    }

    pub fn settings(&self) -> EffectSettings {
        self.settings
    }

    /// Merge a partial filter change and apply it. Type switches are
    /// immediate; frequency and Q glide.
    pub fn apply_filter_update(&mut self, update: &FilterUpdate) {
        self.filter.apply(update);
        if let Some(chain) = self.chain.as_mut() {
            if let Some(filter_type) = update.filter_type {
                chain.filter.set_filter_type(filter_type);
            }
            if let Some(frequency) = update.frequency {
                chain.filter.set_param(FilterParam::Cutoff, frequency);
            }
            if let Some(q) = update.q {
                chain.filter.set_param(FilterParam::Q, q);
            }
        }
    }

    pub fn set_master_volume(&mut self, percent: f32) {
        let db = percent_to_db(percent);
        self.settings.master_volume_db = db;
        if let Some(chain) = self.chain.as_mut() {
            chain.volume.set_param(VolumeParam::Decibels, db);
        }
    }

    pub fn set_filter_frequency(&mut self, hz: f32) {
        self.apply_filter_update(&FilterUpdate::default().frequency(hz));
    }

    pub fn set_filter_resonance(&mut self, q: f32) {
        self.apply_filter_update(&FilterUpdate::default().q(q));
    }

    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        self.apply_filter_update(&FilterUpdate::default().filter_type(filter_type));
    }

    pub fn set_chorus_frequency(&mut self, hz: f32) {
        self.settings.chorus.frequency = hz;
        if let Some(chain) = self.chain.as_mut() {
            chain.chorus.set_param(ChorusParam::Rate, hz);
        }
    }

    pub fn set_chorus_depth(&mut self, depth: f32) {
        self.settings.chorus.depth = depth;
        if let Some(chain) = self.chain.as_mut() {
            chain.chorus.set_param(ChorusParam::Depth, depth);
        }
    }

    pub fn set_chorus_mix(&mut self, wet: f32) {
        self.settings.chorus.wet = wet;
        if let Some(chain) = self.chain.as_mut() {
            chain.chorus.set_param(ChorusParam::Mix, wet);
        }
    }

    pub fn set_delay_time(&mut self, seconds: f32) {
        self.settings.delay.time = seconds;
        if let Some(chain) = self.chain.as_mut() {
            chain.delay.set_param(DelayParam::Time, seconds);
        }
    }

    pub fn set_delay_feedback(&mut self, feedback: f32) {
        self.settings.delay.feedback = feedback;
        if let Some(chain) = self.chain.as_mut() {
            chain.delay.set_param(DelayParam::Feedback, feedback);
        }
    }

    pub fn set_delay_mix(&mut self, wet: f32) {
        self.settings.delay.wet = wet;
        if let Some(chain) = self.chain.as_mut() {
            chain.delay.set_param(DelayParam::Mix, wet);
        }
    }

    /// 0-1 size, mapped to 0.5-10 s of decay.
    pub fn set_reverb_size(&mut self, size: f32) {
        let decay = reverb_size_to_decay(size);
        self.settings.reverb.decay = decay;
        if let Some(chain) = self.chain.as_mut() {
            chain.reverb.set_param(ReverbParam::Decay, decay);
        }
    }

    pub fn set_reverb_dampening(&mut self, hz: f32) {
        self.settings.reverb.dampening = hz;
        if let Some(chain) = self.chain.as_mut() {
            chain.reverb.set_param(ReverbParam::Dampening, hz);
        }
    }

    pub fn set_reverb_mix(&mut self, wet: f32) {
        self.settings.reverb.wet = wet;
        if let Some(chain) = self.chain.as_mut() {
            chain.reverb.set_param(ReverbParam::Mix, wet);
        }
    }

    /// Dispatch one [`EffectParam`] to its setter.
    pub fn apply(&mut self, param: EffectParam) {
        match param {
            EffectParam::MasterVolume(v) => self.set_master_volume(v),
            EffectParam::FilterFrequency(v) => self.set_filter_frequency(v),
            EffectParam::FilterResonance(v) => self.set_filter_resonance(v),
            EffectParam::FilterType(t) => self.set_filter_type(t),
            EffectParam::ChorusFrequency(v) => self.set_chorus_frequency(v),
            EffectParam::ChorusDepth(v) => self.set_chorus_depth(v),
            EffectParam::ChorusMix(v) => self.set_chorus_mix(v),
            EffectParam::DelayTime(v) => self.set_delay_time(v),
            EffectParam::DelayFeedback(v) => self.set_delay_feedback(v),
            EffectParam::DelayMix(v) => self.set_delay_mix(v),
            EffectParam::ReverbSize(v) => self.set_reverb_size(v),
            EffectParam::ReverbDampening(v) => self.set_reverb_dampening(v),
            EffectParam::ReverbMix(v) => self.set_reverb_mix(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> EffectController {
        EffectController::new(
            48_000.0,
            256,
            FilterSettings::default(),
            EffectSettings::default(),
        )
    }

    #[test]
    fn reverb_size_maps_to_decay_range() {
        assert_eq!(reverb_size_to_decay(0.0), 0.5);
        assert_eq!(reverb_size_to_decay(1.0), 10.0);
        assert_eq!(reverb_size_to_decay(0.5), 5.25);
        assert_eq!(reverb_size_to_decay(7.0), 10.0);
    }

    #[test]
    fn volume_percent_is_stored_as_db() {
        let mut fx = controller();
        fx.set_master_volume(50.0);
        assert_eq!(fx.settings().master_volume_db, -30.0);
    }

    #[test]
    fn writes_before_creation_are_applied_on_creation() {
        let mut fx = controller();
        assert!(fx.analyser().is_none());

        fx.set_reverb_mix(0.3);
        fx.set_filter_frequency(900.0);
        fx.set_filter_type(FilterType::BandPass);
        fx.set_delay_feedback(0.6);
        assert!(!fx.is_initialized());

        let chain = fx.ensure_chain();
        let (filter, effects) = chain.settings();
        assert_eq!(filter.frequency, 900.0);
        assert_eq!(filter.filter_type, FilterType::BandPass);
        assert_eq!(effects.reverb.wet, 0.3);
        assert_eq!(effects.delay.feedback, 0.6);
        assert!(fx.analyser().is_some());
    }

    #[test]
    fn writes_after_creation_reach_the_chain() {
        let mut fx = controller();
        fx.ensure_chain();

        fx.apply(EffectParam::ChorusMix(0.5));
        fx.apply(EffectParam::ReverbSize(1.0));
        fx.apply(EffectParam::FilterResonance(3.0));

        let (filter, effects) = fx.chain_mut().map(|c| c.settings()).unwrap_or_default();
        assert_eq!(effects.chorus.wet, 0.5);
        assert_eq!(effects.reverb.decay, 10.0);
        assert_eq!(filter.q, 3.0);
    }

    #[test]
    fn ensure_chain_is_idempotent() {
        let mut fx = controller();
        fx.ensure_chain().reverb.set_param(ReverbParam::Mix, 0.9);
        let (_, effects) = fx.ensure_chain().settings();
        assert_eq!(effects.reverb.wet, 0.9);
    }

    #[test]
    fn dispose_keeps_settings() {
        let mut fx = controller();
        fx.ensure_chain();
        fx.set_delay_mix(0.25);
        fx.dispose();
        assert!(!fx.is_initialized());
        assert!(fx.analyser().is_none());

        let (_, effects) = fx.ensure_chain().settings();
        assert_eq!(effects.delay.wet, 0.25);
    }
}
