use crate::{
    dsp::{
        gain::{db_to_linear, VOLUME_FLOOR_DB},
        ramp::LinearRamp,
    },
    graph::node::{GraphNode, Parameterized, RenderCtx},
};

/*
Master Volume
=============

The last gain stage before the analyser and the output. The level is stored
in decibels; the linear gain it implies glides over a short ramp so a volume
change never steps the waveform.

At or below the -60 dB floor the stage is silent rather than merely quiet,
which is what users expect when they pull the volume control all the way
down.
*/

const VOLUME_RAMP_SECONDS: f32 = 0.02;

#[derive(Clone, Copy, Debug)]
pub enum VolumeParam {
    Decibels,
}

pub struct VolumeNode {
    db: f32,
    gain: LinearRamp,
    sample_rate: f32,
}

impl VolumeNode {
    pub fn new(db: f32, sample_rate: f32) -> Self {
        let db = clamp_db(db);
        Self {
            db,
            gain: LinearRamp::new(gain_for(db)),
            sample_rate,
        }
    }
}

fn clamp_db(db: f32) -> f32 {
    if db.is_finite() {
        db.clamp(VOLUME_FLOOR_DB, 12.0)
    } else {
        VOLUME_FLOOR_DB
    }
}

fn gain_for(db: f32) -> f32 {
    if db <= VOLUME_FLOOR_DB {
        0.0
    } else {
        db_to_linear(db)
    }
}

impl GraphNode for VolumeNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        for sample in out.iter_mut() {
            *sample *= self.gain.next_sample();
        }
    }
}

impl Parameterized for VolumeNode {
    type Param = VolumeParam;

    fn get_param(&self, param: Self::Param) -> f32 {
        match param {
            VolumeParam::Decibels => self.db,
        }
    }

    fn set_param(&mut self, param: Self::Param, value: f32) {
        match param {
            VolumeParam::Decibels => {
                self.db = clamp_db(value);
                self.gain.ramp_to(gain_for(self.db), VOLUME_RAMP_SECONDS, self.sample_rate);
            }
        }
    }
}
