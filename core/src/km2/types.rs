//! KM2 on-disk data types. All layouts are little-endian, unpadded, except
//! for the single trailing pad byte v1.5 files carry after the header.
//!
//! Grounded in `other_examples/.../keymagic-core-src-types-km2.rs.rs` and
//! `keymagic-core-cpp/include/keymagic/km2_format.h`.

/// Opcode words. High byte is always `0x00`.
///
/// `0x00F5`/`0x00F7` never appear in opcode position on real rule data —
/// they only ever show up as the operand of a `MODIFIER` word immediately
/// following `VARIABLE`, marking it as `ANYOF`/`NANYOF` rather than a plain
/// variable reference or a parallel-array index. See
/// `rule::preprocessor::segmentate`.
pub mod opcode {
    pub const STRING: u16 = 0x00F0;
    pub const VARIABLE: u16 = 0x00F1;
    pub const REFERENCE: u16 = 0x00F2;
    pub const PREDEFINED: u16 = 0x00F3;
    pub const MODIFIER: u16 = 0x00F4;
    pub const AND: u16 = 0x00F6;
    pub const ANY: u16 = 0x00F8;
    pub const SWITCH: u16 = 0x00F9;
}

/// The four bytes read little-endian, compared directly against `b"KMKL"`.
pub const MAGIC: [u8; 4] = *b"KMKL";

/// `track_caps`, `auto_bksp`, `eat`, `pos_based`, `right_alt` — each 0/1 in
/// the file, stored here as `bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutOptions {
    pub track_caps: bool,
    pub auto_bksp: bool,
    pub eat: bool,
    pub pos_based: bool,
    pub right_alt: bool,
}

/// Decoded file header, normalized to the v1.5 shape regardless of which
/// on-disk version was actually read.
#[derive(Debug, Clone, Copy)]
pub struct FileHeader {
    pub major: u8,
    pub minor: u8,
    pub string_count: u16,
    pub info_count: u16,
    pub rule_count: u16,
    pub layout_options: LayoutOptions,
}

/// One string-table entry, kept as raw UTF-16 code units (surrogate
/// pairing is not validated at decode time, per spec).
#[derive(Debug, Clone, Default)]
pub struct StringEntry {
    pub units: Vec<u16>,
}

impl StringEntry {
    /// Lossy UTF-8 rendering, for display/debug purposes only.
    pub fn to_utf8_lossy(&self) -> String {
        crate::utf::utf16_to_utf8(&self.units)
    }
}

/// One info-table entry (v1.4+): a 4-byte id plus raw payload bytes.
#[derive(Debug, Clone)]
pub struct InfoEntry {
    pub id: [u8; 4],
    pub data: Vec<u8>,
}

/// Well-known info ids. Textual payloads (`name`, `desc`, `font`, `htky`)
/// are UTF-8; `icon` is raw image bytes.
pub mod info_id {
    pub const NAME: [u8; 4] = *b"name";
    pub const DESC: [u8; 4] = *b"desc";
    pub const FONT: [u8; 4] = *b"font";
    pub const ICON: [u8; 4] = *b"icon";
    pub const HOTKEY: [u8; 4] = *b"htky";
}

impl InfoEntry {
    /// Decode this entry's payload as a UTF-8 string, if its id is one of
    /// the known textual ids. Returns `None` for `icon` or unknown ids.
    pub fn as_text(&self) -> Option<String> {
        if self.id == info_id::ICON {
            return None;
        }
        Some(String::from_utf8_lossy(&self.data).into_owned())
    }
}

/// One rule: two sides, each a raw, undecoded sequence of 16-bit opcode
/// words. [`crate::rule::RulePreprocessor`] is responsible for
/// interpreting these.
#[derive(Debug, Clone, Default)]
pub struct Rule {
    pub lhs: Vec<u16>,
    pub rhs: Vec<u16>,
}

/// A fully decoded KM2 file. Immutable after decode.
#[derive(Debug, Clone)]
pub struct Km2File {
    pub header: FileHeader,
    pub strings: Vec<StringEntry>,
    pub info: Vec<InfoEntry>,
    pub rules: Vec<Rule>,
}

impl Km2File {
    /// Look up a string-table entry by its 1-based KM2 index.
    pub fn string(&self, one_based_index: usize) -> Option<&StringEntry> {
        one_based_index
            .checked_sub(1)
            .and_then(|i| self.strings.get(i))
    }
}
