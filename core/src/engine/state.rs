//! Engine state: the composing buffer, active state-machine states, and a
//! bounded undo history.
//!
//! Grounded in `keymagic-core-cpp/include/keymagic/engine.h` (`EngineState`)
//! and the teacher's `v3/processor/state.rs` snapshot/restore idiom.

use std::collections::HashSet;

/// The engine's mutable state: the composing buffer plus any named states
/// a `SWITCH` rule has set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineState {
    /// Composing text, as UTF-16 code units.
    pub composing: Vec<u16>,
    /// String-table indices of currently active named states.
    pub active_states: HashSet<usize>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.composing.is_empty()
    }

    pub fn clear(&mut self) {
        self.composing.clear();
        self.active_states.clear();
    }
}

/// Bounded undo history: each processed key pushes a pre-key snapshot.
/// Oldest entries are dropped once `capacity` is exceeded.
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    entries: Vec<EngineState>,
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    /// Record a snapshot taken before a key was processed.
    pub fn push(&mut self, snapshot: EngineState) {
        if self.entries.len() == self.capacity {
            self.entries.remove(0);
        }
        self.entries.push(snapshot);
    }

    /// Pop and return the most recent snapshot, if any.
    pub fn pop(&mut self) -> Option<EngineState> {
        self.entries.pop()
    }

    /// Look at the most recent snapshot without removing it.
    pub fn peek(&self) -> Option<&EngineState> {
        self.entries.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_respects_capacity() {
        let mut history = History::with_capacity(2);
        history.push(EngineState::new());
        history.push(EngineState::new());
        history.push(EngineState::new());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn history_pop_is_lifo() {
        let mut history = History::with_capacity(10);
        let mut first = EngineState::new();
        first.composing = vec!['a' as u16];
        let mut second = EngineState::new();
        second.composing = vec!['b' as u16];
        history.push(first);
        history.push(second.clone());
        assert_eq!(history.pop(), Some(second));
        assert!(history.can_undo());
    }

    #[test]
    fn empty_history_cannot_undo() {
        let history = History::with_capacity(10);
        assert!(!history.can_undo());
    }
}
