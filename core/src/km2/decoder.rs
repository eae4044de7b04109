//! KM2 binary decoder. Pure function of a byte buffer; no I/O.
//!
//! Grounded in `other_examples/.../keymagic-core-src-km2-loader.rs.rs`
//! (structure, `byteorder` usage) and `keymagic-core-cpp/src/km2/loader.cpp`
//! (version-fallback semantics).

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use super::types::{FileHeader, InfoEntry, Km2File, LayoutOptions, Rule, StringEntry, MAGIC};
use crate::error::{Error, Result};

/// Decodes a KM2 byte buffer into a [`Km2File`].
pub struct Km2Decoder;

impl Km2Decoder {
    /// Parse a KM2 byte stream. Fails on bad magic, unsupported version,
    /// truncation, or length fields that overrun the buffer.
    pub fn decode(bytes: &[u8]) -> Result<Km2File> {
        let mut cursor = Cursor::new(bytes);

        let header = read_header(&mut cursor)?;
        tracing::debug!(
            major = header.major,
            minor = header.minor,
            rule_count = header.rule_count,
            "decoded KM2 header"
        );

        let strings = read_strings(&mut cursor, header.string_count as usize)?;
        let info = read_info(&mut cursor, header.info_count as usize)?;
        let rules = read_rules(&mut cursor, header.rule_count as usize)?;

        Ok(Km2File {
            header,
            strings,
            info,
            rules,
        })
    }
}

fn truncated(cursor: &Cursor<&[u8]>) -> Error {
    Error::Truncated(cursor.position() as usize)
}

fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8> {
    cursor.read_u8().map_err(|_| truncated(cursor))
}

fn read_u16(cursor: &mut Cursor<&[u8]>) -> Result<u16> {
    cursor.read_u16::<LittleEndian>().map_err(|_| truncated(cursor))
}

fn read_exact(cursor: &mut Cursor<&[u8]>, buf: &mut [u8]) -> Result<()> {
    cursor.read_exact(buf).map_err(|_| truncated(cursor))
}

/// Reads the header, falling back between v1.3/v1.4/v1.5 layouts based on
/// the minor version, then normalizing to the v1.5 shape.
fn read_header(cursor: &mut Cursor<&[u8]>) -> Result<FileHeader> {
    let mut magic = [0u8; 4];
    read_exact(cursor, &mut magic)?;
    if magic != MAGIC {
        return Err(Error::InvalidMagic(magic));
    }

    let major = read_u8(cursor)?;
    let minor = read_u8(cursor)?;
    if major != 1 || !(3..=5).contains(&minor) {
        return Err(Error::UnsupportedVersion { major, minor });
    }

    let string_count = read_u16(cursor)?;

    let (info_count, rule_count, layout_options) = match minor {
        3 => {
            let rule_count = read_u16(cursor)?;
            let options = LayoutOptions {
                track_caps: read_u8(cursor)? != 0,
                auto_bksp: read_u8(cursor)? != 0,
                eat: read_u8(cursor)? != 0,
                pos_based: read_u8(cursor)? != 0,
                right_alt: true, // v1.3 predates the flag; default enabled.
            };
            (0u16, rule_count, options)
        }
        4 => {
            let info_count = read_u16(cursor)?;
            let rule_count = read_u16(cursor)?;
            let options = LayoutOptions {
                track_caps: read_u8(cursor)? != 0,
                auto_bksp: read_u8(cursor)? != 0,
                eat: read_u8(cursor)? != 0,
                pos_based: read_u8(cursor)? != 0,
                right_alt: true,
            };
            (info_count, rule_count, options)
        }
        5 => {
            let info_count = read_u16(cursor)?;
            let rule_count = read_u16(cursor)?;
            let options = LayoutOptions {
                track_caps: read_u8(cursor)? != 0,
                auto_bksp: read_u8(cursor)? != 0,
                eat: read_u8(cursor)? != 0,
                pos_based: read_u8(cursor)? != 0,
                right_alt: read_u8(cursor)? != 0,
            };
            read_u8(cursor)?; // trailing pad byte
            (info_count, rule_count, options)
        }
        _ => unreachable!("minor checked above"),
    };

    Ok(FileHeader {
        major,
        minor,
        string_count,
        info_count,
        rule_count,
        layout_options,
    })
}

fn read_strings(cursor: &mut Cursor<&[u8]>, count: usize) -> Result<Vec<StringEntry>> {
    let mut strings = Vec::with_capacity(count);
    for _ in 0..count {
        strings.push(StringEntry {
            units: read_utf16_units(cursor)?,
        });
    }
    Ok(strings)
}

fn read_utf16_units(cursor: &mut Cursor<&[u8]>) -> Result<Vec<u16>> {
    let length = read_u16(cursor)? as usize;
    let mut units = Vec::with_capacity(length);
    for _ in 0..length {
        units.push(read_u16(cursor)?);
    }
    Ok(units)
}

fn read_info(cursor: &mut Cursor<&[u8]>, count: usize) -> Result<Vec<InfoEntry>> {
    let mut info = Vec::with_capacity(count);
    for _ in 0..count {
        let mut id = [0u8; 4];
        read_exact(cursor, &mut id)?;
        let length = read_u16(cursor)? as usize;
        let mut data = vec![0u8; length];
        read_exact(cursor, &mut data)?;
        info.push(InfoEntry { id, data });
    }
    Ok(info)
}

fn read_rules(cursor: &mut Cursor<&[u8]>, count: usize) -> Result<Vec<Rule>> {
    let mut rules = Vec::with_capacity(count);
    for _ in 0..count {
        let lhs = read_rule_side(cursor)?;
        let rhs = read_rule_side(cursor)?;
        rules.push(Rule { lhs, rhs });
    }
    Ok(rules)
}

/// A rule side's length field is in 16-bit *words*, not bytes. An empty
/// side (word_length == 0) is legal.
fn read_rule_side(cursor: &mut Cursor<&[u8]>) -> Result<Vec<u16>> {
    let word_length = read_u16(cursor)? as usize;
    let mut words = Vec::with_capacity(word_length);
    for _ in 0..word_length {
        words.push(read_u16(cursor)?);
    }
    Ok(words)
}
