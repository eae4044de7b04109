//! `Engine`: the keyboard-agnostic key-processing state machine.
//!
//! Grounded in `keymagic-core-cpp/include/keymagic/engine.h` (`Engine`,
//! `EngineState`) and `other_examples/.../engine-engine.rs.rs` for the
//! match -> apply -> recursive-rematch -> diff pipeline shape.

use crate::engine::apply::apply;
use crate::engine::matcher::{KeyInput, Matcher};
use crate::engine::state::{EngineState, History};
use crate::error::{Error, Result};
use crate::km2::{info_id, Km2Decoder, Km2File, LayoutOptions};
use crate::rule::{ProcessedRule, RulePreprocessor};
use crate::utf::{common_prefix_len, push_scalar, scalar_at, scalar_count, utf16_to_utf8};
use crate::virtual_key::VirtualKey;

const MAX_RECURSION: u32 = 10;
const HISTORY_CAPACITY: usize = 50;

/// Static metadata read from a keyboard's info table and header.
#[derive(Debug, Clone, Default)]
pub struct KeyboardMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub font: Option<String>,
    pub hotkey: Option<String>,
    pub icon: Option<Vec<u8>>,
    pub layout_options: LayoutOptions,
}

impl KeyboardMeta {
    fn from_km2(km2: &Km2File) -> Self {
        let mut meta = KeyboardMeta {
            layout_options: km2.header.layout_options,
            ..KeyboardMeta::default()
        };
        for entry in &km2.info {
            if entry.id == info_id::NAME {
                meta.name = entry.as_text();
            } else if entry.id == info_id::DESC {
                meta.description = entry.as_text();
            } else if entry.id == info_id::FONT {
                meta.font = entry.as_text();
            } else if entry.id == info_id::HOTKEY {
                meta.hotkey = entry.as_text();
            } else if entry.id == info_id::ICON {
                meta.icon = Some(entry.data.clone());
            }
        }
        meta
    }
}

/// The kind of edit an `Output` represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    None,
    Insert,
    Delete,
    Replace,
}

/// What a shell should apply to its own text field after a key or an undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub action: ActionType,
    /// UTF-16 code units to remove from the end of the shell's current text.
    pub delete_count: usize,
    /// UTF-8 text to insert after deleting.
    pub insert: String,
    /// The engine's full composing text after this key, as UTF-8.
    pub composing_text: String,
    /// `true` if the shell should swallow this keystroke rather than let it
    /// fall through to its own default handling — always true when `action`
    /// is not `None`, and also true on a no-op key when the keyboard's
    /// `eat_all_unused_keys` layout option is set.
    pub consumed: bool,
}

impl Output {
    fn diff(before: &[u16], after: &[u16]) -> Self {
        let prefix = common_prefix_len(before, after);
        let delete_count = before.len() - prefix;
        let insert = utf16_to_utf8(&after[prefix..]);
        let action = match (delete_count, insert.is_empty()) {
            (0, true) => ActionType::None,
            (0, false) => ActionType::Insert,
            (_, true) => ActionType::Delete,
            (_, false) => ActionType::Replace,
        };
        Output {
            action,
            delete_count,
            insert,
            composing_text: utf16_to_utf8(after),
            consumed: action != ActionType::None,
        }
    }
}

/// Keyboard-agnostic key processor. Load a KM2 keyboard, then feed it
/// keystrokes one at a time via [`Engine::process_key`].
pub struct Engine {
    km2: Option<Km2File>,
    rules: Vec<ProcessedRule>,
    meta: KeyboardMeta,
    state: EngineState,
    history: History,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            km2: None,
            rules: Vec::new(),
            meta: KeyboardMeta::default(),
            state: EngineState::new(),
            history: History::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Decode and load a KM2 keyboard, replacing any previously loaded one.
    pub fn load_keyboard(&mut self, bytes: &[u8]) -> Result<()> {
        let km2 = Km2Decoder::decode(bytes)?;
        let rules = RulePreprocessor::preprocess(&km2);
        self.meta = KeyboardMeta::from_km2(&km2);
        self.km2 = Some(km2);
        self.rules = rules;
        self.state.clear();
        self.history.clear();
        tracing::debug!(rules = self.rules.len(), "keyboard loaded");
        Ok(())
    }

    pub fn unload_keyboard(&mut self) {
        self.km2 = None;
        self.rules.clear();
        self.meta = KeyboardMeta::default();
        self.state.clear();
        self.history.clear();
    }

    pub fn has_keyboard(&self) -> bool {
        self.km2.is_some()
    }

    pub fn keyboard_meta(&self) -> &KeyboardMeta {
        &self.meta
    }

    pub fn layout_options(&self) -> Option<LayoutOptions> {
        self.km2.as_ref().map(|k| k.header.layout_options)
    }

    /// Debug accessor: the keyboard's rules in match-priority order.
    pub fn rules(&self) -> &[ProcessedRule] {
        &self.rules
    }

    /// Debug accessor: the decoded keyboard, if one is loaded.
    pub fn keyboard(&self) -> Option<&Km2File> {
        self.km2.as_ref()
    }

    pub fn composing_text(&self) -> String {
        utf16_to_utf8(&self.state.composing)
    }

    pub fn set_composing_text(&mut self, text: &str) {
        self.state.composing = crate::utf::utf8_to_utf16(text);
    }

    /// Clear the composing buffer, active states, and undo history.
    pub fn reset(&mut self) {
        self.state.clear();
        self.history.clear();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Undo the most recent `process_key`, restoring prior state and
    /// returning the diff a shell needs to get there.
    pub fn undo(&mut self) -> Option<Output> {
        let before = self.state.composing.clone();
        let previous = self.history.pop()?;
        self.state = previous;
        let mut output = Output::diff(&before, &self.state.composing);
        output.consumed = true;
        Some(output)
    }

    /// Process a keystroke without mutating engine state — lets a shell
    /// preview the effect (e.g. to decide whether to eat the key) before
    /// committing to it with [`Engine::process_key`].
    pub fn test_process_key(&self, input: KeyInput) -> Result<Output> {
        let km2 = self.km2.as_ref().ok_or(Error::NoKeyboard)?;
        let before = self.state.composing.clone();
        let matched = rule_matches(&self.rules, km2, &self.state, &input);

        if auto_bksp_applies(km2, matched, &input, self.history.can_undo()) {
            let reverted: &[u16] = match self.history.peek() {
                Some(snapshot) => &snapshot.composing,
                None => &before,
            };
            let mut output = Output::diff(&before, reverted);
            output.consumed = true;
            return Ok(output);
        }
        if eat_applies(km2, matched, &input) {
            let mut output = Output::diff(&before, &before);
            output.consumed = true;
            return Ok(output);
        }

        let mut scratch = self.state.clone();
        process_key_internal(&self.rules, km2, &mut scratch, input, 0);
        let mut output = Output::diff(&before, &scratch.composing);
        output.consumed = matched || output.consumed;
        Ok(output)
    }

    /// Process one keystroke, mutating engine state and pushing an undo
    /// snapshot. Backspace never pushes its own snapshot: it either reverts
    /// the most recent one (when `auto_bksp` is set and no rule claims the
    /// key) or deletes a single scalar, but either way it is itself
    /// undo-like and shouldn't be undoable a second time.
    pub fn process_key(&mut self, input: KeyInput) -> Result<Output> {
        if self.km2.is_none() {
            return Err(Error::NoKeyboard);
        }
        let km2 = self.km2.as_ref().unwrap();
        let before = self.state.composing.clone();
        let matched = rule_matches(&self.rules, km2, &self.state, &input);

        if auto_bksp_applies(km2, matched, &input, self.history.can_undo()) {
            let previous = self.history.pop().expect("can_undo checked above");
            self.state = previous;
            let mut output = Output::diff(&before, &self.state.composing);
            output.consumed = true;
            return Ok(output);
        }
        if eat_applies(km2, matched, &input) {
            let mut output = Output::diff(&before, &before);
            output.consumed = true;
            return Ok(output);
        }

        self.history.push(self.state.clone());
        let km2 = self.km2.as_ref().unwrap();
        process_key_internal(&self.rules, km2, &mut self.state, input, 0);
        let mut output = Output::diff(&before, &self.state.composing);
        output.consumed = matched || output.consumed;
        Ok(output)
    }
}

fn rule_matches(
    rules: &[ProcessedRule],
    km2: &Km2File,
    state: &EngineState,
    input: &KeyInput,
) -> bool {
    Matcher::find_match(rules, km2, &state.composing, &state.active_states, input).is_some()
}

/// `true` when an unmatched `Back` should pop the most recent history
/// snapshot instead of falling through to ordinary smart-backspace scalar
/// deletion. Falls through (returns `false`) when history is empty, even
/// with `auto_bksp` set.
fn auto_bksp_applies(km2: &Km2File, matched: bool, input: &KeyInput, can_undo: bool) -> bool {
    !matched
        && input.virtual_key == Some(VirtualKey::Back)
        && km2.header.layout_options.auto_bksp
        && can_undo
}

/// `true` when an unmatched printable key should be swallowed outright
/// rather than appended literally. Non-printable unmatched keys (arrows,
/// Escape, an unclaimed `Back` with `auto_bksp` off) are never affected.
fn eat_applies(km2: &Km2File, matched: bool, input: &KeyInput) -> bool {
    !matched && km2.header.layout_options.eat && input.character.is_some()
}

/// Match, apply, and recursively re-match against the updated buffer (with
/// no new key input) until a stop condition holds or recursion bottoms out.
fn process_key_internal(
    rules: &[ProcessedRule],
    km2: &Km2File,
    state: &mut EngineState,
    input: KeyInput,
    depth: u32,
) {
    if depth >= MAX_RECURSION {
        tracing::warn!(depth, "max recursion reached, stopping re-match");
        return;
    }

    match Matcher::find_match(rules, km2, &state.composing, &state.active_states, &input) {
        Some(outcome) => {
            let mut active_states = state.active_states.clone();
            let new_buffer = apply(
                outcome.rule,
                km2,
                &outcome.candidate,
                outcome.consumed_from,
                &outcome.captures,
                &mut active_states,
            );
            state.composing = new_buffer;
            state.active_states = active_states;

            if should_stop_recursion(&state.composing) {
                return;
            }
            process_key_internal(rules, km2, state, KeyInput::default(), depth + 1);
        }
        None => {
            if let Some(c) = input.character {
                push_scalar(&mut state.composing, c);
            } else if input.virtual_key == Some(VirtualKey::Back) {
                // Reached only when `auto_bksp` is off; the auto-undo path
                // is handled by the caller before `process_key_internal`
                // ever runs.
                apply_smart_backspace(&mut state.composing);
            }
        }
    }
}

fn should_stop_recursion(buffer: &[u16]) -> bool {
    if buffer.is_empty() {
        return true;
    }
    if scalar_count(buffer) == 1 {
        if let Some((c, _)) = scalar_at(buffer, 0) {
            if c.is_ascii() && !c.is_control() {
                return true;
            }
        }
    }
    false
}

/// Deletes the last scalar (not just the last code unit) from the composing
/// buffer, so a surrogate pair is removed atomically.
fn apply_smart_backspace(buffer: &mut Vec<u16>) {
    if buffer.is_empty() {
        return;
    }
    let start = buffer.len().saturating_sub(2);
    let width = (start..buffer.len())
        .find_map(|i| scalar_at(buffer, i).filter(|&(_, w)| i + w == buffer.len()))
        .map(|(_, w)| w)
        .unwrap_or(1);
    let new_len = buffer.len() - width;
    buffer.truncate(new_len);
}
