use crate::{
    effects::analyser::{Analyser, AnalyserHandle},
    graph::{
        chorus::{ChorusNode, ChorusParam},
        delay::{DelayNode, DelayParam},
        filter::{FilterNode, FilterParam},
        node::{GraphNode, Parameterized, RenderCtx},
        reverb::{ReverbNode, ReverbParam},
        volume::{VolumeNode, VolumeParam},
    },
    patch::{EffectSettings, FilterSettings},
};

/*
Master Effect Chain
===================

One instance per engine. Every voice is summed into a single buffer, and that
buffer runs through the same fixed pipeline:

    voices ──Σ──→ Filter ──→ Chorus ──→ Delay ──→ Reverb ──→ Volume ──→ Analyser ──→ out

There is no per-voice effect isolation: a cutoff change darkens everything
that is sounding. All parameter writes are last-writer-wins and go straight
to the node, which ramps where a jump would click.
*/

pub struct EffectChain {
    pub filter: FilterNode,
    pub chorus: ChorusNode,
    pub delay: DelayNode,
    pub reverb: ReverbNode,
    pub volume: VolumeNode,
    analyser: Analyser,
}

impl EffectChain {
    /// Build the chain with every node already at its stored setting.
    pub fn new(
        sample_rate: f32,
        filter: &FilterSettings,
        effects: &EffectSettings,
        analyser_size: usize,
    ) -> Self {
        let chorus = &effects.chorus;
        let delay = &effects.delay;
        let reverb = &effects.reverb;

        let mut reverb_node = ReverbNode::new(reverb.decay, reverb.wet, sample_rate);
        reverb_node.set_param(ReverbParam::Dampening, reverb.dampening);

        Self {
            filter: FilterNode::new(filter.filter_type, filter.frequency, filter.q, sample_rate),
            chorus: ChorusNode::new(
                chorus.frequency,
                chorus.delay_time_ms,
                chorus.depth,
                chorus.wet,
                sample_rate,
            ),
            delay: DelayNode::new(delay.time, delay.feedback, delay.wet, sample_rate),
            reverb: reverb_node,
            volume: VolumeNode::new(effects.master_volume_db, sample_rate),
            analyser: Analyser::new(analyser_size),
        }
    }

    pub fn analyser(&self) -> AnalyserHandle {
        self.analyser.handle()
    }

    /// Run the summed voice signal through every stage, in place.
    pub fn process(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        self.filter.render_block(buffer, ctx);
        self.chorus.render_block(buffer, ctx);
        self.delay.render_block(buffer, ctx);
        self.reverb.render_block(buffer, ctx);
        self.volume.render_block(buffer, ctx);
        self.analyser.process(buffer);
    }

    /// Current node values, read back into settings form.
    pub fn settings(&self) -> (FilterSettings, EffectSettings) {
        let filter = FilterSettings {
            filter_type: self.filter.filter_type(),
            frequency: self.filter.get_param(FilterParam::Cutoff),
            q: self.filter.get_param(FilterParam::Q),
        };

        let mut effects = EffectSettings {
            master_volume_db: self.volume.get_param(VolumeParam::Decibels),
            ..EffectSettings::default()
        };
        effects.chorus.frequency = self.chorus.get_param(ChorusParam::Rate);
        effects.chorus.depth = self.chorus.get_param(ChorusParam::Depth);
        effects.chorus.delay_time_ms = self.chorus.get_param(ChorusParam::DelayTime);
        effects.chorus.wet = self.chorus.get_param(ChorusParam::Mix);
        effects.delay.time = self.delay.get_param(DelayParam::Time);
        effects.delay.feedback = self.delay.get_param(DelayParam::Feedback);
        effects.delay.wet = self.delay.get_param(DelayParam::Mix);
        effects.reverb.decay = self.reverb.get_param(ReverbParam::Decay);
        effects.reverb.dampening = self.reverb.get_param(ReverbParam::Dampening);
        effects.reverb.wet = self.reverb.get_param(ReverbParam::Mix);

        (filter, effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::filter::FilterType;

    const SAMPLE_RATE: f32 = 48_000.0;

    #[test]
    fn stored_settings_are_applied_on_creation() {
        let filter = FilterSettings {
            filter_type: FilterType::HighPass,
            frequency: 800.0,
            q: 2.0,
        };
        let mut effects = EffectSettings::default();
        effects.master_volume_db = -12.0;
        effects.reverb.wet = 0.4;
        effects.delay.time = 0.5;

        let chain = EffectChain::new(SAMPLE_RATE, &filter, &effects, 256);
        let (read_filter, read_effects) = chain.settings();

        assert_eq!(read_filter, filter);
        assert_eq!(read_effects.master_volume_db, -12.0);
        assert_eq!(read_effects.reverb.wet, 0.4);
        assert!((read_effects.delay.time - 0.5).abs() < 1e-6);
    }

    #[test]
    fn processed_signal_reaches_analyser() {
        let mut chain = EffectChain::new(
            SAMPLE_RATE,
            &FilterSettings::default(),
            &EffectSettings::default(),
            256,
        );
        let handle = chain.analyser();
        let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);

        let mut buffer = vec![0.5; 512];
        chain.process(&mut buffer, &ctx);

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.len(), 256);
        assert_eq!(snapshot[255], buffer[511]);
        // lowpass passes DC, -6 dB halves it
        assert!((buffer[511] - 0.25).abs() < 0.01, "got {}", buffer[511]);
    }
}
