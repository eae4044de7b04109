//! Turns raw KM2 rule opcode words into [`ProcessedRule`]s: segmentation,
//! expected-length calculation, and priority-based sorting.
//!
//! Grounded in `keymagic-core-cpp/src/preprocessing/rule_preprocessor.cpp`
//! (`segmentateOpcodes`, `calculateCharLength`, `calculateRulePriority`,
//! `sortRulesByPriority`).

use crate::km2::{opcode, Km2File};
use crate::rule::segment::{PriorityClass, ProcessedRule, RulePriority, Segment};
use crate::virtual_key::VirtualKey;

/// Classifies every rule in a decoded keyboard and returns them sorted by
/// match priority (most specific first).
pub struct RulePreprocessor;

impl RulePreprocessor {
    pub fn preprocess(km2: &Km2File) -> Vec<ProcessedRule> {
        let mut rules: Vec<ProcessedRule> = km2
            .rules
            .iter()
            .enumerate()
            .map(|(original_index, rule)| {
                let lhs = segmentate(&rule.lhs);
                let rhs = segmentate(&rule.rhs);
                let priority = calculate_priority(original_index, &lhs, km2);
                ProcessedRule {
                    original_index,
                    lhs,
                    rhs,
                    priority,
                }
            })
            .collect();

        rules.sort_by(|a, b| a.priority.cmp(&b.priority));
        rules
    }
}

/// `MODIFIER`'s operand when it immediately follows `VARIABLE`, marking the
/// variable as an `ANYOF`/`NANYOF` class match rather than a plain
/// reference or a parallel-array index. These values never appear in
/// opcode position on real rule data.
const ANYOF_MARKER: u16 = 0x00F5;
const NANYOF_MARKER: u16 = 0x00F7;

/// Walk a raw opcode word stream into typed segments. Never fails: an
/// opcode whose operand runs past the end of the stream is truncated to
/// what remains, and an unrecognized word is skipped.
fn segmentate(words: &[u16]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut combo: Option<Vec<VirtualKey>> = None;
    let mut i = 0;

    while i < words.len() {
        let word = words[i];
        i += 1;

        match word {
            opcode::STRING => {
                let len = words.get(i).copied().unwrap_or(0) as usize;
                i += 1;
                let end = (i + len).min(words.len());
                segments.push(Segment::String(words[i..end].to_vec()));
                i = end;
            }
            opcode::VARIABLE => {
                let Some(&index) = words.get(i) else {
                    continue;
                };
                i += 1;
                if words.get(i).copied() == Some(opcode::MODIFIER) {
                    match words.get(i + 1).copied() {
                        Some(ANYOF_MARKER) => {
                            segments.push(Segment::AnyOfVariable(index as usize));
                            i += 2;
                        }
                        Some(NANYOF_MARKER) => {
                            segments.push(Segment::NotAnyOfVariable(index as usize));
                            i += 2;
                        }
                        Some(capture_ref) => {
                            segments.push(Segment::Variable {
                                index: index as usize,
                                capture_ref: Some(capture_ref as usize),
                            });
                            i += 2;
                        }
                        None => {
                            segments.push(Segment::Variable {
                                index: index as usize,
                                capture_ref: None,
                            });
                        }
                    }
                } else {
                    segments.push(Segment::Variable {
                        index: index as usize,
                        capture_ref: None,
                    });
                }
            }
            opcode::REFERENCE => {
                if let Some(&index) = words.get(i) {
                    segments.push(Segment::Reference(index as usize));
                    i += 1;
                }
            }
            opcode::ANY => {
                segments.push(Segment::Any);
            }
            opcode::SWITCH => {
                if let Some(&index) = words.get(i) {
                    segments.push(Segment::State(index as usize));
                    i += 1;
                }
            }
            opcode::AND => match combo.take() {
                None => combo = Some(Vec::new()),
                Some(keys) => push_vk_combo(&mut segments, keys),
            },
            opcode::PREDEFINED => {
                let Some(&key_code) = words.get(i) else {
                    continue;
                };
                i += 1;
                if let Some(key) = VirtualKey::from_code(key_code) {
                    match &mut combo {
                        Some(keys) => keys.push(key),
                        None => push_vk_combo(&mut segments, vec![key]),
                    }
                }
            }
            _ => {
                // Unrecognized opcode word (including a stray MODIFIER not
                // following VARIABLE): drop it and resynchronize on the
                // next word.
            }
        }
    }

    // Malformed stream with no closing AND: flush whatever the combo holds.
    if let Some(keys) = combo {
        push_vk_combo(&mut segments, keys);
    }

    segments
}

/// A lone `PREDEFINED Null` combo is the RHS "clear output" marker, not an
/// ordinary key gate — `Null` can never be a real keystroke.
fn push_vk_combo(segments: &mut Vec<Segment>, keys: Vec<VirtualKey>) {
    match keys.as_slice() {
        [] => {}
        [VirtualKey::Null] => segments.push(Segment::Null),
        _ => segments.push(Segment::VirtualKey { keys }),
    }
}

fn calculate_priority(original_index: usize, lhs: &[Segment], km2: &Km2File) -> RulePriority {
    let length = expected_lhs_length(lhs, km2);
    let class = if lhs.iter().any(|s| matches!(s, Segment::State(_))) {
        PriorityClass::StateSpecific
    } else if lhs.iter().any(|s| matches!(s, Segment::VirtualKey { .. })) {
        PriorityClass::VirtualKeyRule
    } else if length > 3 {
        PriorityClass::LongPattern
    } else {
        PriorityClass::ShortPattern
    };

    RulePriority {
        class,
        expected_lhs_length: length,
        original_index,
    }
}

/// Sum of UTF-16 code units this LHS is expected to consume when matched,
/// used to order same-class rules longest-pattern-first.
fn expected_lhs_length(lhs: &[Segment], km2: &Km2File) -> usize {
    lhs.iter()
        .map(|segment| match segment {
            Segment::String(units) => units.len(),
            Segment::Variable { index, .. } => km2
                .string(*index)
                .map(|entry| entry.units.len())
                .unwrap_or(0),
            Segment::AnyOfVariable(_) | Segment::NotAnyOfVariable(_) | Segment::Any => 1,
            Segment::VirtualKey { .. }
            | Segment::State(_)
            | Segment::Reference(_)
            | Segment::Null => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::km2::{FileHeader, LayoutOptions, Rule, StringEntry};

    fn empty_km2(rules: Vec<Rule>) -> Km2File {
        Km2File {
            header: FileHeader {
                major: 1,
                minor: 5,
                string_count: 0,
                info_count: 0,
                rule_count: rules.len() as u16,
                layout_options: LayoutOptions::default(),
            },
            strings: vec![StringEntry {
                units: vec!['a' as u16, 'b' as u16, 'c' as u16],
            }],
            info: vec![],
            rules,
        }
    }

    #[test]
    fn segments_literal_string() {
        let lhs = vec![opcode::STRING, 2, 'a' as u16, 'b' as u16];
        let segments = segmentate(&lhs);
        assert_eq!(segments, vec![Segment::String(vec!['a' as u16, 'b' as u16])]);
    }

    #[test]
    fn truncates_string_past_end() {
        let lhs = vec![opcode::STRING, 5, 'a' as u16];
        let segments = segmentate(&lhs);
        assert_eq!(segments, vec![Segment::String(vec!['a' as u16])]);
    }

    #[test]
    fn segments_vk_combo_from_bracketed_predefined_codes() {
        let lhs = vec![
            opcode::AND,
            opcode::PREDEFINED,
            VirtualKey::Control as u16,
            opcode::PREDEFINED,
            VirtualKey::KeyA as u16,
            opcode::AND,
        ];
        let segments = segmentate(&lhs);
        assert_eq!(
            segments,
            vec![Segment::VirtualKey {
                keys: vec![VirtualKey::Control, VirtualKey::KeyA]
            }]
        );
    }

    #[test]
    fn segments_a_single_predefined_key_without_and_brackets() {
        let lhs = vec![opcode::PREDEFINED, VirtualKey::Space as u16];
        assert_eq!(
            segmentate(&lhs),
            vec![Segment::VirtualKey {
                keys: vec![VirtualKey::Space]
            }]
        );
    }

    #[test]
    fn predefined_null_becomes_null_segment() {
        let rhs = vec![opcode::PREDEFINED, VirtualKey::Null as u16];
        assert_eq!(segmentate(&rhs), vec![Segment::Null]);
    }

    #[test]
    fn variable_followed_by_anyof_marker_becomes_anyof_variable() {
        let lhs = vec![opcode::VARIABLE, 1, opcode::MODIFIER, ANYOF_MARKER];
        assert_eq!(segmentate(&lhs), vec![Segment::AnyOfVariable(1)]);
    }

    #[test]
    fn variable_followed_by_nanyof_marker_becomes_not_anyof_variable() {
        let lhs = vec![opcode::VARIABLE, 1, opcode::MODIFIER, NANYOF_MARKER];
        assert_eq!(segmentate(&lhs), vec![Segment::NotAnyOfVariable(1)]);
    }

    #[test]
    fn variable_followed_by_modifier_index_becomes_parallel_array_ref() {
        let rhs = vec![opcode::VARIABLE, 2, opcode::MODIFIER, 1];
        assert_eq!(
            segmentate(&rhs),
            vec![Segment::Variable {
                index: 2,
                capture_ref: Some(1)
            }]
        );
    }

    #[test]
    fn bare_variable_has_no_capture_ref() {
        let lhs = vec![opcode::VARIABLE, 1];
        assert_eq!(
            segmentate(&lhs),
            vec![Segment::Variable {
                index: 1,
                capture_ref: None
            }]
        );
    }

    #[test]
    fn priority_prefers_state_then_vk_then_length() {
        let km2 = empty_km2(vec![
            Rule {
                lhs: vec![opcode::STRING, 1, 'x' as u16],
                rhs: vec![],
            },
            Rule {
                lhs: vec![opcode::SWITCH, 0],
                rhs: vec![],
            },
            Rule {
                lhs: vec![opcode::PREDEFINED, VirtualKey::Space as u16],
                rhs: vec![],
            },
        ]);
        let processed = RulePreprocessor::preprocess(&km2);
        assert!(processed[0].has_state());
        assert!(processed[1].has_virtual_key());
    }

    #[test]
    fn variable_length_resolved_from_string_table() {
        let km2 = empty_km2(vec![Rule {
            lhs: vec![opcode::VARIABLE, 1],
            rhs: vec![],
        }]);
        let processed = RulePreprocessor::preprocess(&km2);
        assert_eq!(processed[0].priority.expected_lhs_length, 3);
    }
}
