//! Error types for the KeyMagic core.
//!
//! Decoding errors abort the load and leave any previously loaded keyboard
//! untouched. Runtime matching never fails: unknown opcodes are skipped
//! during segmentation and out-of-range indices emit nothing.

use thiserror::Error;

/// Errors produced by the KM2 decoder and the engine's loading surface.
#[derive(Debug, Error)]
pub enum Error {
    /// The file does not start with the `KMKL` magic code.
    #[error("invalid KM2 magic code: {0:?}")]
    InvalidMagic([u8; 4]),

    /// `major.minor` is outside the supported range (1.3, 1.4, 1.5).
    #[error("unsupported KM2 version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version read from the header.
        major: u8,
        /// Minor version read from the header.
        minor: u8,
    },

    /// A length field pointed past the end of the buffer.
    #[error("truncated KM2 file at offset {0}")]
    Truncated(usize),

    /// A string table or STRING opcode entry was not valid UTF-16.
    #[error("KM2 string table entry is not valid UTF-16 at offset {0}")]
    InvalidUtf16(usize),

    /// `process_key` was called before a keyboard was successfully loaded.
    #[error("no keyboard loaded")]
    NoKeyboard,

    /// A public entry point received an argument it cannot act on.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Failure reading a keyboard file from disk (loader convenience only).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
