//! KM2 binary format: on-disk types and a pure decoder.

pub mod decoder;
pub mod types;

pub use decoder::Km2Decoder;
pub use types::{
    info_id, opcode, FileHeader, InfoEntry, Km2File, LayoutOptions, Rule, StringEntry, MAGIC,
};
