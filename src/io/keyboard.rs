use crate::synth::note::Note;

/*
Computer Keyboard Layout
========================

Two rows of a QWERTY keyboard laid out like a piano, an octave apart:

     2 3   5 6 7            upper row: base octave + 1
    q w e r t y u i         (i is the C above, base octave + 2)

     s d   g h j            lower row: base octave
    z x c v b n m

The key character itself is the logical key id handed to the engine, so
holding "z" and shifting octave does not orphan the held voice: its key-up
still finds it.
*/

pub const MIN_OCTAVE: i8 = 1;
pub const MAX_OCTAVE: i8 = 6;
pub const DEFAULT_OCTAVE: i8 = 3;

pub const LOWER_ROW: [char; 12] = ['z', 's', 'x', 'd', 'c', 'v', 'g', 'b', 'h', 'n', 'j', 'm'];
pub const UPPER_ROW: [char; 12] = ['q', '2', 'w', '3', 'e', 'r', '5', 't', '6', 'y', '7', 'u'];
/// Top C, two octaves above the base.
pub const TOP_KEY: char = 'i';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardMap {
    base_octave: i8,
}

impl Default for KeyboardMap {
    fn default() -> Self {
        Self {
            base_octave: DEFAULT_OCTAVE,
        }
    }
}

impl KeyboardMap {
    pub fn new(base_octave: i8) -> Self {
        Self {
            base_octave: base_octave.clamp(MIN_OCTAVE, MAX_OCTAVE),
        }
    }

    pub fn base_octave(&self) -> i8 {
        self.base_octave
    }

    /// Returns the new base octave.
    pub fn octave_up(&mut self) -> i8 {
        self.base_octave = (self.base_octave + 1).min(MAX_OCTAVE);
        self.base_octave
    }

    pub fn octave_down(&mut self) -> i8 {
        self.base_octave = (self.base_octave - 1).max(MIN_OCTAVE);
        self.base_octave
    }

    /// Note for a key press, case-insensitive. `None` for unmapped keys.
    pub fn note_for(&self, key: char) -> Option<Note> {
        let key = key.to_ascii_lowercase();
        let (octave, semitone) = if key == TOP_KEY {
            (self.base_octave + 2, 0)
        } else if let Some(idx) = LOWER_ROW.iter().position(|&k| k == key) {
            (self.base_octave, idx)
        } else {
            let idx = UPPER_ROW.iter().position(|&k| k == key)?;
            (self.base_octave + 1, idx)
        };

        let midi = (i16::from(octave) + 1) * 12 + semitone as i16;
        u8::try_from(midi).ok().and_then(Note::from_midi)
    }

    pub fn is_mapped(key: char) -> bool {
        let key = key.to_ascii_lowercase();
        key == TOP_KEY || LOWER_ROW.contains(&key) || UPPER_ROW.contains(&key)
    }

    /// Every mapped key with its note, lowest first.
    pub fn layout(&self) -> Vec<(char, Note)> {
        let mut keys: Vec<(char, Note)> = LOWER_ROW
            .iter()
            .chain(UPPER_ROW.iter())
            .chain(std::iter::once(&TOP_KEY))
            .filter_map(|&k| self.note_for(k).map(|n| (k, n)))
            .collect();
        keys.sort_by_key(|&(_, n)| n);
        keys
    }
}
