#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::{
    effects::controller::EffectParam,
    patch::{FilterUpdate, SynthOptionsUpdate},
    synth::{note::Note, pool::KeyId},
};

/// Control messages sent from input threads to the audio thread.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn { key: KeyId, note: Note },
    NoteOff { key: KeyId },
    AllNotesOff,
    SetSynthOptions(SynthOptionsUpdate),
    SetFilter(FilterUpdate),
    Effect(EffectParam),
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}

impl MessageReceiver for std::collections::VecDeque<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        self.pop_front()
    }
}
