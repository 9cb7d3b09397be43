use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::NoteParseError;

/*
Note Names
==========

Notes arrive from the input layer as scientific pitch names: a letter,
an optional accidental, and an octave number.

    "C4"   middle C        MIDI 60   261.63 Hz
    "A4"   concert A       MIDI 69   440.00 Hz
    "C#3"  = "Db3"         MIDI 49
    "C-1"  lowest MIDI     MIDI 0

    midi = (octave + 1) × 12 + semitone
    freq = 440 × 2^((midi - 69) / 12)

Sharps and flats both parse; formatting always uses sharps, so "Db4"
round-trips to "C#4".
*/

const NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A pitch in MIDI range 0..=127.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Note(u8);

impl Note {
    pub const MAX_MIDI: u8 = 127;

    pub fn from_midi(midi: u8) -> Option<Self> {
        (midi <= Self::MAX_MIDI).then_some(Self(midi))
    }

    pub fn midi(self) -> u8 {
        self.0
    }

    /// Equal-tempered frequency with A4 = 440 Hz.
    pub fn frequency(self) -> f32 {
        440.0 * 2.0_f32.powf((self.0 as f32 - 69.0) / 12.0)
    }

    /// Octave number in scientific pitch notation (C4 is middle C).
    pub fn octave(self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    /// Shift by `semitones`, or `None` if that leaves MIDI range.
    pub fn transpose(self, semitones: i16) -> Option<Self> {
        let midi = self.0 as i16 + semitones;
        u8::try_from(midi).ok().and_then(Self::from_midi)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", NAMES[(self.0 % 12) as usize], self.octave())
    }
}

impl FromStr for Note {
    type Err = NoteParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();

        let letter = chars.next().ok_or(NoteParseError::Empty)?;
        let base: i32 = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(NoteParseError::UnknownLetter(trimmed.to_string())),
        };

        let rest = chars.as_str();
        let (accidental, octave_str) = match rest.chars().next() {
            Some('#') => (1, &rest[1..]),
            Some('b') => (-1, &rest[1..]),
            _ => (0, rest),
        };

        let octave: i32 = octave_str
            .parse()
            .map_err(|_| NoteParseError::InvalidOctave(trimmed.to_string()))?;

        octave
            .checked_add(1)
            .and_then(|o| o.checked_mul(12))
            .and_then(|m| m.checked_add(base + accidental))
            .and_then(|m| u8::try_from(m).ok())
            .and_then(Note::from_midi)
            .ok_or_else(|| NoteParseError::OutOfRange(trimmed.to_string()))
    }
}

impl TryFrom<String> for Note {
    type Error = NoteParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Note> for String {
    fn from(note: Note) -> Self {
        note.to_string()
    }
}
