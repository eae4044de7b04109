//! Criterion benchmarks for the key-processing hot path.
//!
//! Run: cargo bench --bench process_key

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use keymagic_core::km2::opcode;
use keymagic_core::{Engine, KeyInput};

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn string_rule(pattern: &str, replacement: &str) -> (Vec<u16>, Vec<u16>) {
    let pat: Vec<u16> = pattern.encode_utf16().collect();
    let rep: Vec<u16> = replacement.encode_utf16().collect();
    let mut lhs = vec![opcode::STRING, pat.len() as u16];
    lhs.extend(pat);
    let mut rhs = vec![opcode::STRING, rep.len() as u16];
    rhs.extend(rep);
    (lhs, rhs)
}

fn demo_keyboard() -> Vec<u8> {
    let rules = [
        string_rule("ka", "\u{1000}\u{102c}"),
        string_rule("kha", "\u{1001}\u{102c}"),
        string_rule("nga", "\u{1004}\u{102c}"),
    ];

    let mut buf = Vec::new();
    buf.extend_from_slice(b"KMKL");
    buf.push(1);
    buf.push(5);
    push_u16(&mut buf, 0);
    push_u16(&mut buf, 0);
    push_u16(&mut buf, rules.len() as u16);
    buf.extend_from_slice(&[1, 1, 0, 0, 1]);
    buf.push(0);

    for (lhs, rhs) in &rules {
        push_u16(&mut buf, lhs.len() as u16);
        for w in lhs {
            push_u16(&mut buf, *w);
        }
        push_u16(&mut buf, rhs.len() as u16);
        for w in rhs {
            push_u16(&mut buf, *w);
        }
    }

    buf
}

fn bench_single_key(c: &mut Criterion) {
    let mut engine = Engine::new();
    engine.load_keyboard(&demo_keyboard()).unwrap();

    c.bench_function("process_key_unmatched", |b| {
        b.iter(|| {
            engine.reset();
            engine
                .process_key(black_box(KeyInput {
                    character: Some('x'),
                    ..Default::default()
                }))
                .unwrap()
        })
    });
}

fn bench_rule_match_word(c: &mut Criterion) {
    let mut engine = Engine::new();
    engine.load_keyboard(&demo_keyboard()).unwrap();

    c.bench_function("process_key_rule_match", |b| {
        b.iter(|| {
            engine.reset();
            for ch in "kha".chars() {
                engine
                    .process_key(black_box(KeyInput {
                        character: Some(ch),
                        ..Default::default()
                    }))
                    .unwrap();
            }
        })
    });
}

fn bench_load_keyboard(c: &mut Criterion) {
    let bytes = demo_keyboard();
    c.bench_function("load_keyboard", |b| {
        b.iter(|| {
            let mut engine = Engine::new();
            engine.load_keyboard(black_box(&bytes)).unwrap();
        })
    });
}

criterion_group!(
    benches,
    bench_single_key,
    bench_rule_match_word,
    bench_load_keyboard
);
criterion_main!(benches);
