//! End-to-end `Engine::process_key` scenarios, built against hand-assembled
//! KM2 keyboards.

use keymagic_core::km2::opcode;
use keymagic_core::{Engine, KeyInput, VirtualKey};
use rstest::rstest;

struct RuleSpec {
    lhs: Vec<u16>,
    rhs: Vec<u16>,
}

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn build_keyboard(strings: &[&str], rules: &[RuleSpec]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"KMKL");
    buf.push(1);
    buf.push(5);
    push_u16(&mut buf, strings.len() as u16);
    push_u16(&mut buf, 0);
    push_u16(&mut buf, rules.len() as u16);
    buf.extend_from_slice(&[1, 1, 0, 0, 1]);
    buf.push(0);

    for s in strings {
        let units: Vec<u16> = s.encode_utf16().collect();
        push_u16(&mut buf, units.len() as u16);
        for u in units {
            push_u16(&mut buf, u);
        }
    }

    for rule in rules {
        push_u16(&mut buf, rule.lhs.len() as u16);
        for w in &rule.lhs {
            push_u16(&mut buf, *w);
        }
        push_u16(&mut buf, rule.rhs.len() as u16);
        for w in &rule.rhs {
            push_u16(&mut buf, *w);
        }
    }

    buf
}

fn string_rule(pattern: &str, replacement: &str) -> RuleSpec {
    let pat: Vec<u16> = pattern.encode_utf16().collect();
    let rep: Vec<u16> = replacement.encode_utf16().collect();
    let mut lhs = vec![opcode::STRING, pat.len() as u16];
    lhs.extend(pat);
    let mut rhs = vec![opcode::STRING, rep.len() as u16];
    rhs.extend(rep);
    RuleSpec { lhs, rhs }
}

fn type_text(engine: &mut Engine, text: &str) {
    for c in text.chars() {
        engine
            .process_key(KeyInput {
                character: Some(c),
                ..Default::default()
            })
            .unwrap();
    }
}

#[rstest]
fn unmatched_characters_append_literally() {
    let bytes = build_keyboard(&[], &[]);
    let mut engine = Engine::new();
    engine.load_keyboard(&bytes).unwrap();
    type_text(&mut engine, "hello");
    assert_eq!(engine.composing_text(), "hello");
}

#[rstest]
fn a_two_character_rule_rewrites_the_buffer_tail() {
    let bytes = build_keyboard(&[], &[string_rule("ka", "X")]);
    let mut engine = Engine::new();
    engine.load_keyboard(&bytes).unwrap();
    type_text(&mut engine, "ka");
    assert_eq!(engine.composing_text(), "X");
}

#[rstest]
fn rule_only_fires_when_the_full_pattern_is_present() {
    let bytes = build_keyboard(&[], &[string_rule("ka", "X")]);
    let mut engine = Engine::new();
    engine.load_keyboard(&bytes).unwrap();
    type_text(&mut engine, "k");
    assert_eq!(engine.composing_text(), "k");
}

#[rstest]
fn chained_rewrites_cascade_through_recursive_rematching() {
    // "a" + "b" -> "c", then "c" + "c" -> "d": typing a,b,c should leave "d".
    let bytes = build_keyboard(
        &[],
        &[string_rule("ab", "c"), string_rule("cc", "d")],
    );
    let mut engine = Engine::new();
    engine.load_keyboard(&bytes).unwrap();
    type_text(&mut engine, "abc");
    assert_eq!(engine.composing_text(), "d");
}

#[rstest]
fn undo_restores_the_previous_composing_text() {
    let bytes = build_keyboard(&[], &[string_rule("ka", "X")]);
    let mut engine = Engine::new();
    engine.load_keyboard(&bytes).unwrap();
    type_text(&mut engine, "ka");
    assert_eq!(engine.composing_text(), "X");
    assert!(engine.can_undo());
    engine.undo();
    assert_eq!(engine.composing_text(), "k");
}

#[rstest]
fn backspace_without_a_matching_rule_deletes_one_scalar() {
    let bytes = build_keyboard(&[], &[]);
    let mut engine = Engine::new();
    engine.load_keyboard(&bytes).unwrap();
    type_text(&mut engine, "ab");
    engine
        .process_key(KeyInput {
            virtual_key: Some(VirtualKey::Back),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(engine.composing_text(), "a");
}

#[rstest]
fn auto_bksp_undoes_a_fired_rule_instead_of_deleting_a_scalar() {
    // auto_bksp is on in build_keyboard's default header. "ka" collapses to
    // "X"; backspace should revert the merge (back to "k"), not delete one
    // scalar off "X" (which would leave "").
    let bytes = build_keyboard(&[], &[string_rule("ka", "X")]);
    let mut engine = Engine::new();
    engine.load_keyboard(&bytes).unwrap();
    type_text(&mut engine, "ka");
    assert_eq!(engine.composing_text(), "X");

    engine
        .process_key(KeyInput {
            virtual_key: Some(VirtualKey::Back),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(engine.composing_text(), "k");
}

#[rstest]
fn reset_clears_composing_text_and_history() {
    let bytes = build_keyboard(&[], &[]);
    let mut engine = Engine::new();
    engine.load_keyboard(&bytes).unwrap();
    type_text(&mut engine, "abc");
    engine.reset();
    assert_eq!(engine.composing_text(), "");
    assert!(!engine.can_undo());
}

#[rstest]
fn keyboard_metadata_is_readable_after_load() {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"KMKL");
    buf.push(1);
    buf.push(5);
    push_u16(&mut buf, 0);
    push_u16(&mut buf, 1);
    push_u16(&mut buf, 0);
    buf.extend_from_slice(&[1, 1, 0, 0, 1]);
    buf.push(0);
    buf.extend_from_slice(b"name");
    push_u16(&mut buf, 4);
    buf.extend_from_slice(b"Demo");

    let mut engine = Engine::new();
    engine.load_keyboard(&buf).unwrap();
    assert_eq!(engine.keyboard_meta().name.as_deref(), Some("Demo"));
}
