// Voices, the pool that binds them to keys, and the messages that drive them.

pub mod message;
pub mod note;
pub mod pool;
pub mod voice;

pub use message::{MessageReceiver, SynthMessage};
pub use note::Note;
pub use pool::{DropReason, KeyId, NoteOutcome, PoolStatus, SlotState, VoicePool};
pub use voice::Voice;
