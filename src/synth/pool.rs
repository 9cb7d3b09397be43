use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::{
    config::EngineConfig,
    engine::scheduler::{Scheduler, TimerHandle},
    graph::node::RenderCtx,
    patch::{SynthOptions, SynthOptionsUpdate},
    synth::{note::Note, voice::Voice},
};

/*
Voice Pool
==========

A fixed set of pre-built voices, each bound to at most one logical key.
The key is whatever the input layer uses to identify a press ("z", a
pointer id, a MIDI channel/note pair); the note is the pitch it plays.
Keeping them apart lets one key change pitch without a second voice.

Slot states
-----------

    FREE ──acquire──→ ACTIVE ──release──→ RELEASING ──timer──→ FREE
                        ↑                     │
                        └──── same key ───────┘

Release schedules reclamation at `release time + guard` on the audio clock.
The guard absorbs the gap between the envelope ending and the timer being
serviced, so a slot is never handed out while it is still audible.
Re-acquiring the same key first cancels that timer, so a fast key-up/key-down
keeps its one voice instead of racing a stale cleanup.

Acquire
-------

    key already bound?  ──yes──→  re-articulate (legato if ACTIVE,
          │                        fresh attack if RELEASING)
          no
          ↓
    any FREE slot?      ──yes──→  first FREE slot
          │
          no
          ↓
    any RELEASING slot? ──yes──→  steal the one released earliest
          │                        (ties: lowest slot index)
          no
          ↓
    steal the oldest ACTIVE slot (start time, then acquisition order)

Every non-free slot is either ACTIVE or RELEASING, so with at least one slot
a note always gets a voice and the bound of N voices is never exceeded.

Counting
--------

The voice count is the number of bound keys: ACTIVE + RELEASING. It falls
only when a slot is reclaimed, never at key-up, so "something is still
sounding" stays true for the whole release tail.
*/

/// Logical input identifier, independent of the note it plays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(String);

impl KeyId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for KeyId {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for KeyId {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<char> for KeyId {
    fn from(key: char) -> Self {
        Self(key.to_string())
    }
}

impl Borrow<str> for KeyId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Free,
    Active,
    Releasing,
}

/// Why a note request produced no sound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The pool has no slots at all.
    PoolExhausted,
    /// The pool (or engine) has been disposed.
    Disposed,
    /// The note name did not parse.
    InvalidNote(String),
}

/// What a note request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteOutcome {
    /// A free slot was bound to the key.
    Started { slot: usize },
    /// The key already held a voice; it was reused.
    Rearticulated { slot: usize },
    /// A slot was taken from another key.
    Stolen { slot: usize, from: KeyId },
    /// Nothing sounds.
    Dropped(DropReason),
}

impl NoteOutcome {
    pub fn slot(&self) -> Option<usize> {
        match *self {
            NoteOutcome::Started { slot }
            | NoteOutcome::Rearticulated { slot }
            | NoteOutcome::Stolen { slot, .. } => Some(slot),
            NoteOutcome::Dropped(_) => None,
        }
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, NoteOutcome::Dropped(_))
    }
}

/// Snapshot of slot usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStatus {
    pub total: usize,
    pub active: usize,
    pub releasing: usize,
    pub free: usize,
    /// Keys bound to a slot since the pool was built (re-articulations excluded).
    pub allocations: u64,
    /// Slots taken from another key.
    pub steals: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolTimer {
    Reclaim(usize),
    ApplyOptions(usize),
}

struct Slot {
    voice: Voice,
    key: Option<KeyId>,
    note: Option<Note>,
    start_time: f64,
    sequence: u64,
    releasing_since: Option<f64>,
    reclaim: Option<TimerHandle>,
    options_update: Option<TimerHandle>,
}

impl Slot {
    fn state(&self) -> SlotState {
        match (&self.key, self.releasing_since) {
            (None, _) => SlotState::Free,
            (Some(_), None) => SlotState::Active,
            (Some(_), Some(_)) => SlotState::Releasing,
        }
    }
}

pub struct VoicePool {
    slots: Vec<Slot>,
    index: HashMap<KeyId, usize>,
    timers: Scheduler<PoolTimer>,
    options: SynthOptions,
    release_guard: f64,
    glide: f32,
    option_stagger: f64,
    sequence: u64,
    allocations: u64,
    steals: u64,
    disposed: bool,
}

impl VoicePool {
    pub fn new(config: &EngineConfig) -> Self {
        let options = config.synth.merged(&SynthOptionsUpdate::default());
        let slots = (0..config.max_voices)
            .map(|_| Slot {
                voice: Voice::new(&options, config.sample_rate),
                key: None,
                note: None,
                start_time: 0.0,
                sequence: 0,
                releasing_since: None,
                reclaim: None,
                options_update: None,
            })
            .collect();

        Self {
            slots,
            index: HashMap::with_capacity(config.max_voices),
            // one reclaim and one option update per slot at most
            timers: Scheduler::with_capacity(config.max_voices * 2),
            options,
            release_guard: f64::from(config.release_guard_ms) / 1000.0,
            glide: config.glide_seconds,
            option_stagger: f64::from(config.option_stagger_ms) / 1000.0,
            sequence: 0,
            allocations: 0,
            steals: 0,
            disposed: false,
        }
    }

    /// Bind `key` to a voice playing `note`.
    pub fn acquire(&mut self, key: KeyId, note: Note, now: f64) -> NoteOutcome {
        if self.disposed {
            debug!(%key, "acquire on disposed pool");
            return NoteOutcome::Dropped(DropReason::Disposed);
        }

        if let Some(&slot) = self.index.get(&key) {
            self.rearticulate(slot, note, now);
            return NoteOutcome::Rearticulated { slot };
        }

        if let Some(slot) = self.slots.iter().position(|s| s.key.is_none()) {
            self.bind(slot, key, note, now);
            return NoteOutcome::Started { slot };
        }

        let Some(slot) = self.steal_candidate() else {
            warn!(%key, %note, "no voice available, note dropped");
            return NoteOutcome::Dropped(DropReason::PoolExhausted);
        };

        let from = self.evict(slot);
        self.steals += 1;
        debug!(slot, %from, to = %key, "voice stolen");
        self.bind(slot, key, note, now);
        NoteOutcome::Stolen { slot, from }
    }

    /// Release the voice bound to `key`. Returns false for an unknown or
    /// already releasing key.
    pub fn release(&mut self, key: &str, now: f64) -> bool {
        let Some(&slot) = self.index.get(key) else {
            trace!(key, "release of unbound key ignored");
            return false;
        };
        if self.slots[slot].releasing_since.is_some() {
            trace!(key, "key already releasing");
            return false;
        }

        self.flush_options(slot);
        let entry = &mut self.slots[slot];
        entry.voice.trigger_release();
        entry.releasing_since = Some(now);

        let release = f64::from(entry.voice.envelope().release_time());
        self.schedule_reclaim(slot, now + release + self.release_guard);
        true
    }

    /// Release every bound key over `window` seconds, whatever its state,
    /// and reclaim all of them after `window + guard`.
    pub fn release_all(&mut self, window: f32, now: f64) {
        let window = window.max(0.0);
        let deadline = now + f64::from(window) + self.release_guard;

        for slot in 0..self.slots.len() {
            if self.slots[slot].key.is_none() {
                continue;
            }
            self.flush_options(slot);

            let entry = &mut self.slots[slot];
            if entry.releasing_since.is_none() {
                entry.voice.release_over(window);
                entry.releasing_since = Some(now);
            } else {
                entry.voice.reset();
            }
            self.schedule_reclaim(slot, deadline);
        }
    }

    /// Merge `update` into the shared options and push the result to every
    /// slot, spaced `option_stagger` apart on the audio clock.
    pub fn update_synth_options(&mut self, update: &SynthOptionsUpdate, now: f64) {
        self.options.apply(update);

        for slot in 0..self.slots.len() {
            if let Some(pending) = self.slots[slot].options_update.take() {
                self.timers.cancel(pending);
            }

            if self.option_stagger <= 0.0 {
                self.slots[slot].voice.update_options(&self.options);
            } else {
                let deadline = now + slot as f64 * self.option_stagger;
                let handle = self.timers.schedule(deadline, PoolTimer::ApplyOptions(slot));
                self.slots[slot].options_update = Some(handle);
            }
        }
    }

    /// Fire every timer due at `now`. Returns true if any slot was reclaimed.
    pub fn service(&mut self, now: f64) -> bool {
        let mut reclaimed = false;

        while let Some((handle, timer)) = self.timers.pop_due(now) {
            match timer {
                PoolTimer::Reclaim(slot) => {
                    if self.slots[slot].reclaim != Some(handle) {
                        trace!(slot, "stale reclaim timer discarded");
                        continue;
                    }
                    let entry = &mut self.slots[slot];
                    entry.reclaim = None;
                    entry.releasing_since = None;
                    entry.note = None;
                    entry.voice.reset();
                    if let Some(key) = entry.key.take() {
                        self.index.remove(&key);
                        debug!(slot, %key, "voice reclaimed");
                    }
                    reclaimed = true;
                }
                PoolTimer::ApplyOptions(slot) => {
                    let entry = &mut self.slots[slot];
                    if entry.options_update == Some(handle) {
                        entry.options_update = None;
                        entry.voice.update_options(&self.options);
                    }
                }
            }
        }

        reclaimed
    }

    /// Sum every sounding voice into `out`.
    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        for slot in &mut self.slots {
            slot.voice.render_into(out, ctx);
        }
    }

    /// Release and reclaim everything immediately, cancel all timers and
    /// dispose every voice. Safe to call twice.
    pub fn dispose(&mut self) {
        if self.disposed {
            debug!("pool already disposed");
            return;
        }
        self.timers.clear();
        self.index.clear();
        for slot in &mut self.slots {
            slot.key = None;
            slot.note = None;
            slot.releasing_since = None;
            slot.reclaim = None;
            slot.options_update = None;
            slot.voice.dispose();
        }
        self.disposed = true;
        debug!(slots = self.slots.len(), "voice pool disposed");
    }

    /// Bound keys: ACTIVE plus RELEASING slots.
    pub fn active_count(&self) -> usize {
        self.index.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn options(&self) -> SynthOptions {
        self.options
    }

    pub fn status(&self) -> PoolStatus {
        let mut status = PoolStatus {
            total: self.slots.len(),
            allocations: self.allocations,
            steals: self.steals,
            ..PoolStatus::default()
        };
        for slot in &self.slots {
            match slot.state() {
                SlotState::Free => status.free += 1,
                SlotState::Active => status.active += 1,
                SlotState::Releasing => status.releasing += 1,
            }
        }
        status
    }

    /// Log every slot at trace level.
    pub fn debug_status(&self, now: f64) {
        let status = self.status();
        trace!(
            total = status.total,
            active = status.active,
            releasing = status.releasing,
            free = status.free,
            "voice pool status"
        );
        for (idx, slot) in self.slots.iter().enumerate() {
            let key = slot.key.as_ref().map(KeyId::as_str).unwrap_or("-");
            let note = slot.note.map(|n| n.to_string()).unwrap_or_default();
            let age = if slot.key.is_some() {
                now - slot.start_time
            } else {
                0.0
            };
            trace!(
                slot = idx,
                key,
                note = %note,
                state = ?slot.state(),
                sounding = slot.voice.is_sounding(),
                age,
                "slot"
            );
        }
    }

    pub fn slot_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn slot_state(&self, slot: usize) -> Option<SlotState> {
        self.slots.get(slot).map(Slot::state)
    }

    pub fn slot_note(&self, slot: usize) -> Option<Note> {
        self.slots.get(slot).and_then(|s| s.note)
    }

    pub fn slot_key(&self, slot: usize) -> Option<&KeyId> {
        self.slots.get(slot).and_then(|s| s.key.as_ref())
    }

    pub fn voice(&self, slot: usize) -> Option<&Voice> {
        self.slots.get(slot).map(|s| &s.voice)
    }

    /// Audio-clock time at which `key`'s reclamation is due, if releasing.
    pub fn reclaim_deadline(&self, key: &str) -> Option<f64> {
        let slot = self.slot_of(key)?;
        self.slots[slot]
            .reclaim
            .and_then(|handle| self.timers.deadline(handle))
    }

    fn rearticulate(&mut self, slot: usize, note: Note, now: f64) {
        self.flush_options(slot);
        if let Some(handle) = self.slots[slot].reclaim.take() {
            self.timers.cancel(handle);
        }

        let glide = self.glide;
        let entry = &mut self.slots[slot];
        if entry.releasing_since.take().is_some() {
            // key pressed again during its tail: a new press, so a new attack
            entry.voice.trigger_attack(note);
            entry.start_time = now;
            entry.sequence = self.sequence;
            self.sequence += 1;
            debug!(slot, %note, "releasing voice re-triggered");
        } else if entry.note != Some(note) && !entry.voice.change_note(note, glide) {
            warn!(slot, %note, "glide unavailable, re-attacked instead");
        }
        entry.note = Some(note);
    }

    fn bind(&mut self, slot: usize, key: KeyId, note: Note, now: f64) {
        self.flush_options(slot);

        let entry = &mut self.slots[slot];
        entry.voice.trigger_attack(note);
        entry.key = Some(key.clone());
        entry.note = Some(note);
        entry.start_time = now;
        entry.sequence = self.sequence;
        entry.releasing_since = None;

        self.sequence += 1;
        self.allocations += 1;
        self.index.insert(key, slot);
    }

    /// Unbind a slot for reuse, cutting its voice with a short ramp.
    fn evict(&mut self, slot: usize) -> KeyId {
        if let Some(handle) = self.slots[slot].reclaim.take() {
            self.timers.cancel(handle);
        }
        let entry = &mut self.slots[slot];
        entry.voice.reset();
        entry.releasing_since = None;
        entry.note = None;

        let key = entry.key.take().unwrap_or_else(|| KeyId::from(""));
        self.index.remove(&key);
        key
    }

    fn steal_candidate(&self) -> Option<usize> {
        let releasing = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(idx, s)| s.releasing_since.map(|since| (idx, since)))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(idx, _)| idx);

        releasing.or_else(|| {
            self.slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.key.is_some())
                .min_by(|(_, a), (_, b)| {
                    a.start_time
                        .total_cmp(&b.start_time)
                        .then(a.sequence.cmp(&b.sequence))
                })
                .map(|(idx, _)| idx)
        })
    }

    fn schedule_reclaim(&mut self, slot: usize, deadline: f64) {
        if let Some(old) = self.slots[slot].reclaim.take() {
            self.timers.cancel(old);
        }
        let handle = self.timers.schedule(deadline, PoolTimer::Reclaim(slot));
        self.slots[slot].reclaim = Some(handle);
    }

    fn flush_options(&mut self, slot: usize) {
        let entry = &mut self.slots[slot];
        if let Some(pending) = entry.options_update.take() {
            self.timers.cancel(pending);
            entry.voice.update_options(&self.options);
        }
    }
}
