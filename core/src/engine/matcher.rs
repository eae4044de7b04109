//! Rule matching: state gate, virtual-key gate, then suffix-anchored
//! segment matching against the composing buffer.
//!
//! Grounded in `keymagic-core-cpp/src/matching/matcher.cpp` (`matchRule`).

use crate::rule::{Capture, ProcessedRule, Segment};
use crate::utf::scalar_at;
use crate::virtual_key::{Modifiers, VirtualKey};
use crate::km2::Km2File;

/// One keystroke, as presented to the matcher: an optional virtual key (for
/// VK-gated rules) and an optional printable character it produced (for
/// text-pattern rules).
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyInput {
    pub virtual_key: Option<VirtualKey>,
    pub modifiers: Modifiers,
    pub character: Option<char>,
}

/// A successful match: which rule fired, the captures its LHS segments
/// recorded, and where in the candidate buffer (composing text plus this
/// keystroke's character, if any) the match's unconsumed prefix ends.
#[derive(Debug, Clone)]
pub struct MatchOutcome<'a> {
    pub rule: &'a ProcessedRule,
    pub captures: Vec<Capture>,
    pub candidate: Vec<u16>,
    pub consumed_from: usize,
}

/// Tries each rule in priority order and returns the first that matches.
pub struct Matcher;

impl Matcher {
    pub fn find_match<'a>(
        rules: &'a [ProcessedRule],
        km2: &Km2File,
        composing: &[u16],
        active_states: &std::collections::HashSet<usize>,
        input: &KeyInput,
    ) -> Option<MatchOutcome<'a>> {
        for rule in rules {
            if !states_satisfied(rule, active_states) {
                continue;
            }
            if !vk_gate_satisfied(rule, input) {
                continue;
            }
            if let Some((captures, candidate, consumed_from)) =
                match_text_segments(rule, km2, composing, input)
            {
                return Some(MatchOutcome {
                    rule,
                    captures,
                    candidate,
                    consumed_from,
                });
            }
        }
        None
    }
}

fn states_satisfied(rule: &ProcessedRule, active_states: &std::collections::HashSet<usize>) -> bool {
    rule.lhs.iter().all(|segment| match segment {
        Segment::State(idx) => active_states.contains(idx),
        _ => true,
    })
}

/// Every `VirtualKey` combo on the LHS must hold. Within a combo, a
/// modifier-family key is checked against the keystroke's modifier bits;
/// any other key must be the keystroke's own virtual key. Grounded on
/// `matchVirtualKey` in `matcher.cpp`.
fn vk_gate_satisfied(rule: &ProcessedRule, input: &KeyInput) -> bool {
    rule.lhs.iter().all(|segment| match segment {
        Segment::VirtualKey { keys } => keys.iter().all(|key| key_satisfied(*key, input)),
        _ => true,
    })
}

fn key_satisfied(key: VirtualKey, input: &KeyInput) -> bool {
    if key.is_modifier() {
        modifier_bit(key, input.modifiers)
    } else {
        input.virtual_key == Some(key)
    }
}

fn modifier_bit(key: VirtualKey, actual: Modifiers) -> bool {
    match key {
        VirtualKey::Shift | VirtualKey::LShift | VirtualKey::RShift => actual.shift,
        VirtualKey::Control | VirtualKey::LControl | VirtualKey::RControl | VirtualKey::Ctrl => {
            actual.ctrl
        }
        VirtualKey::Menu | VirtualKey::LMenu | VirtualKey::RMenu | VirtualKey::Alt | VirtualKey::AltGr => {
            actual.alt
        }
        _ => false,
    }
}

/// Suffix-anchored match: walk the LHS text segments in reverse, consuming
/// the candidate buffer (composing text plus this keystroke's character,
/// if any) from the end backward.
fn match_text_segments(
    rule: &ProcessedRule,
    km2: &Km2File,
    composing: &[u16],
    input: &KeyInput,
) -> Option<(Vec<Capture>, Vec<u16>, usize)> {
    let mut candidate = composing.to_vec();
    if let Some(c) = input.character {
        crate::utf::push_scalar(&mut candidate, c);
    }

    let text_segments: Vec<(usize, &Segment)> = rule
        .lhs
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_text_segment())
        .collect();

    let mut cursor = candidate.len();
    let mut captures = vec![None; rule.lhs.len()];

    for (segment_index, segment) in text_segments.into_iter().rev() {
        let capture = match segment {
            Segment::String(units) => {
                let len = units.len();
                if cursor < len || candidate[cursor - len..cursor] != units[..] {
                    return None;
                }
                cursor -= len;
                Capture {
                    value: units.clone(),
                    position: 0,
                    segment_index,
                }
            }
            Segment::Variable { index, .. } => {
                let entry = km2.string(*index)?;
                let len = entry.units.len();
                if cursor < len || candidate[cursor - len..cursor] != entry.units[..] {
                    return None;
                }
                cursor -= len;
                Capture {
                    value: entry.units.clone(),
                    position: 0,
                    segment_index,
                }
            }
            Segment::AnyOfVariable(idx) => {
                let (scalar, width, position) =
                    consume_scalar_matching(km2, *idx, &candidate, cursor, true)?;
                cursor -= width;
                let mut value = Vec::new();
                crate::utf::push_scalar(&mut value, scalar);
                Capture {
                    value,
                    position,
                    segment_index,
                }
            }
            Segment::NotAnyOfVariable(idx) => {
                let (scalar, width, position) =
                    consume_scalar_matching(km2, *idx, &candidate, cursor, false)?;
                cursor -= width;
                let mut value = Vec::new();
                crate::utf::push_scalar(&mut value, scalar);
                Capture {
                    value,
                    position,
                    segment_index,
                }
            }
            Segment::Any => {
                if cursor == 0 {
                    return None;
                }
                let (scalar, width) = scalar_ending_at(&candidate, cursor)?;
                cursor -= width;
                let mut value = Vec::new();
                crate::utf::push_scalar(&mut value, scalar);
                Capture {
                    value,
                    position: 0,
                    segment_index,
                }
            }
            _ => unreachable!("filtered to text segments"),
        };
        captures[segment_index] = Some(capture);
    }

    Some((captures.into_iter().flatten().collect(), candidate, cursor))
}

/// Reads the scalar whose UTF-16 encoding ends exactly at `end` in `units`.
fn scalar_ending_at(units: &[u16], end: usize) -> Option<(char, usize)> {
    if end >= 2 {
        if let Some((c, 2)) = scalar_at(units, end - 2) {
            return Some((c, 2));
        }
    }
    if end >= 1 {
        if let Some((c, 1)) = scalar_at(units, end - 1) {
            return Some((c, 1));
        }
    }
    None
}

/// Consumes one scalar ending at `cursor` and checks membership (or
/// non-membership) in the variable's scalar list, returning the scalar,
/// its UTF-16 width, and its index within the variable's scalar list.
fn consume_scalar_matching(
    km2: &Km2File,
    variable_index: usize,
    candidate: &[u16],
    cursor: usize,
    require_member: bool,
) -> Option<(char, usize, usize)> {
    if cursor == 0 {
        return None;
    }
    let (scalar, width) = scalar_ending_at(candidate, cursor)?;
    let entry = km2.string(variable_index)?;
    let members = scalars_of(&entry.units);
    let position = members.iter().position(|&c| c == scalar);

    match (require_member, position) {
        (true, Some(pos)) => Some((scalar, width, pos)),
        (false, None) => Some((scalar, width, 0)),
        _ => None,
    }
}

fn scalars_of(units: &[u16]) -> Vec<char> {
    let mut out = Vec::new();
    let mut i = 0;
    while let Some((c, len)) = scalar_at(units, i) {
        out.push(c);
        i += len;
    }
    out
}
