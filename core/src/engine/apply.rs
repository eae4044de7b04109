//! RHS application: walks a matched rule's RHS segments and produces the
//! engine's next composing buffer and active-state set.
//!
//! Grounded in `keymagic-core-cpp/src/matching/matcher.cpp` (`applyRule`,
//! `generateOutputSegmented`).

use std::collections::HashSet;

use crate::km2::Km2File;
use crate::rule::{Capture, ProcessedRule, Segment};
use crate::utf::scalar_at;

/// Applies `rule`'s RHS against the captures recorded during matching.
/// `prefix_len` is how much of the buffer the match consumed (everything
/// before that point is preserved unchanged).
pub fn apply(
    rule: &ProcessedRule,
    km2: &Km2File,
    composing: &[u16],
    consumed_from: usize,
    captures: &[Capture],
    active_states: &mut HashSet<usize>,
) -> Vec<u16> {
    let mut output: Vec<u16> = composing[..consumed_from].to_vec();

    for segment in &rule.rhs {
        match segment {
            Segment::String(units) => output.extend_from_slice(units),
            Segment::Null => output.clear(),
            Segment::State(idx) => {
                active_states.insert(*idx);
            }
            Segment::Reference(n) => {
                // Bare `$(n)` back-reference: re-emit LHS capture n's text.
                if let Some(capture) = n.checked_sub(1).and_then(|i| captures.get(i)) {
                    output.extend_from_slice(&capture.value);
                }
            }
            Segment::Variable { index, capture_ref } => match capture_ref {
                // `VARIABLE idx` followed by `MODIFIER k`: index `idx` at
                // the scalar position LHS capture `k` recorded (the
                // "parallel array" idiom).
                Some(k) => {
                    if let Some(capture) = k.checked_sub(1).and_then(|i| captures.get(i)) {
                        if let Some(entry) = km2.string(*index) {
                            if let Some((scalar, _)) = scalar_at(&entry.units, capture.position) {
                                crate::utf::push_scalar(&mut output, scalar);
                            }
                        }
                    }
                }
                None => {
                    if let Some(entry) = km2.string(*index) {
                        output.extend_from_slice(&entry.units);
                    }
                }
            },
            // A VK/AnyOf/Any/NotAnyOf segment has no meaning as RHS output;
            // the decoder never emits these on a rule's RHS in practice.
            Segment::VirtualKey { .. }
            | Segment::AnyOfVariable(_)
            | Segment::NotAnyOfVariable(_)
            | Segment::Any => {
                tracing::warn!(?segment, "non-output segment on rule RHS, ignoring");
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::km2::{opcode, FileHeader, LayoutOptions, Rule, StringEntry};
    use crate::rule::RulePreprocessor;

    fn km2_with(strings: Vec<&str>, rules: Vec<Rule>) -> Km2File {
        Km2File {
            header: FileHeader {
                major: 1,
                minor: 5,
                string_count: strings.len() as u16,
                info_count: 0,
                rule_count: rules.len() as u16,
                layout_options: LayoutOptions::default(),
            },
            strings: strings
                .into_iter()
                .map(|s| StringEntry {
                    units: crate::utf::utf8_to_utf16(s),
                })
                .collect(),
            info: vec![],
            rules,
        }
    }

    #[test]
    fn literal_rhs_appends_text() {
        let km2 = km2_with(
            vec![],
            vec![Rule {
                lhs: vec![],
                rhs: vec![opcode::STRING, 2, 'x' as u16, 'y' as u16],
            }],
        );
        let rules = RulePreprocessor::preprocess(&km2);
        let out = apply(
            &rules[0],
            &km2,
            &[],
            0,
            &[],
            &mut HashSet::new(),
        );
        assert_eq!(crate::utf::utf16_to_utf8(&out), "xy");
    }

    #[test]
    fn null_clears_output() {
        let km2 = km2_with(
            vec![],
            vec![Rule {
                lhs: vec![],
                rhs: vec![
                    opcode::STRING,
                    1,
                    'x' as u16,
                    opcode::PREDEFINED,
                    crate::virtual_key::VirtualKey::Null as u16,
                ],
            }],
        );
        let rules = RulePreprocessor::preprocess(&km2);
        let out = apply(
            &rules[0],
            &km2,
            &crate::utf::utf8_to_utf16("prefix"),
            6,
            &[],
            &mut HashSet::new(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn reference_reemits_capture() {
        let km2 = km2_with(
            vec![],
            vec![Rule {
                lhs: vec![opcode::ANY],
                rhs: vec![opcode::REFERENCE, 1],
            }],
        );
        let rules = RulePreprocessor::preprocess(&km2);
        let captures = vec![Capture {
            value: vec!['z' as u16],
            position: 0,
            segment_index: 0,
        }];
        let out = apply(&rules[0], &km2, &[], 0, &captures, &mut HashSet::new());
        assert_eq!(crate::utf::utf16_to_utf8(&out), "z");
    }

    #[test]
    fn indexed_variable_uses_capture_position() {
        let km2 = km2_with(
            vec!["abc", "xyz"],
            vec![Rule {
                lhs: vec![opcode::VARIABLE, 1, opcode::MODIFIER, 0x00F5],
                rhs: vec![opcode::VARIABLE, 2, opcode::MODIFIER, 1],
            }],
        );
        let rules = RulePreprocessor::preprocess(&km2);
        let captures = vec![Capture {
            value: vec!['b' as u16],
            position: 1,
            segment_index: 0,
        }];
        let out = apply(&rules[0], &km2, &[], 0, &captures, &mut HashSet::new());
        assert_eq!(crate::utf::utf16_to_utf8(&out), "y");
    }
}
