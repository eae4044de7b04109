//! KeyMagic input method engine core: KM2 keyboard loading, rule matching,
//! and the key-processing state machine. No platform integration lives
//! here — this crate is consumed by per-platform shells.

pub mod engine;
pub mod error;
pub mod hotkey;
pub mod km2;
pub mod rule;
pub mod utf;
pub mod virtual_key;

pub use engine::{ActionType, Engine, KeyInput, KeyboardMeta, Output};
pub use error::{Error, Result};
pub use hotkey::{Hotkey, HotkeyParser};
pub use km2::{Km2Decoder, Km2File};
pub use virtual_key::{KeyCodeMap, Modifiers, VirtualKey};
