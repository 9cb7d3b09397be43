// Purpose - input mappings from outside the engine

pub mod keyboard;

pub use keyboard::KeyboardMap;
