//! Segment classification of rule opcode streams, and the priority scheme
//! used to order rules for matching.
//!
//! Grounded in `keymagic-core-cpp/include/keymagic/engine.h` (`ProcessedRule`,
//! `RulePriority`) and `keymagic-core-cpp/src/matching/matcher.cpp`
//! (segment-by-segment matching).

use crate::virtual_key::VirtualKey;

/// One classified unit of a rule's LHS or RHS, after opcode interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, already resolved to UTF-16 code units.
    String(Vec<u16>),
    /// A named variable reference, by string-table index. `capture_ref`,
    /// when set, is the 1-based LHS capture index this variable should be
    /// indexed by (the RHS "parallel array" idiom: `VARIABLE idx` followed
    /// by `MODIFIER k` where `k` is not the `ANYOF`/`NANYOF` marker).
    Variable {
        index: usize,
        capture_ref: Option<usize>,
    },
    /// `ANYOF($var)`: matches any one scalar drawn from the variable.
    AnyOfVariable(usize),
    /// `NANYOF($var)`: matches any one scalar *not* drawn from the variable.
    NotAnyOfVariable(usize),
    /// `ANY`: matches exactly one scalar, unconstrained.
    Any,
    /// A virtual key combo: every key in `keys` must hold at once.
    /// Modifier-family keys (`VirtualKey::is_modifier()`) are checked
    /// against the keystroke's modifier bits; any other key is checked
    /// against the keystroke's discrete virtual key.
    VirtualKey { keys: Vec<VirtualKey> },
    /// A named state-machine state this rule requires (LHS) or sets (RHS).
    State(usize),
    /// `$(n)` back-reference into the matched LHS segments, by 1-based index.
    Reference(usize),
    /// The `NULL` virtual-key output marker — clears accumulated RHS text.
    Null,
}

impl Segment {
    /// `true` if this segment participates in composing-text pattern
    /// matching (as opposed to a pure state/VK gate).
    pub fn is_text_segment(&self) -> bool {
        matches!(
            self,
            Segment::String(_)
                | Segment::Variable { .. }
                | Segment::AnyOfVariable(_)
                | Segment::NotAnyOfVariable(_)
                | Segment::Any
        )
    }
}

/// A captured match for one LHS segment, recorded during matching and
/// consulted while generating RHS output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// The matched scalar(s), as UTF-16 code units.
    pub value: Vec<u16>,
    /// Index within the matched variable's value list (for `AnyOfVariable`),
    /// used by the RHS "parallel array" indexing idiom. `0` otherwise.
    pub position: usize,
    /// Index of the LHS segment this capture came from.
    pub segment_index: usize,
}

/// Priority classes, most to least specific. Rules are sorted ascending by
/// `(class, original_index)` so state-specific rules are tried before
/// VK-gated rules, then `LongPattern` (expected LHS length > 3) before
/// `ShortPattern`; ties within a class keep original file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PriorityClass {
    StateSpecific = 0,
    VirtualKeyRule = 1,
    LongPattern = 2,
    ShortPattern = 3,
}

/// A rule's computed sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulePriority {
    pub class: PriorityClass,
    pub expected_lhs_length: usize,
    pub original_index: usize,
}

impl PartialOrd for RulePriority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RulePriority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.class
            .cmp(&other.class)
            .then_with(|| self.original_index.cmp(&other.original_index))
    }
}

/// A rule after opcode classification: segmented LHS/RHS plus the metadata
/// needed for matching and priority ordering.
#[derive(Debug, Clone)]
pub struct ProcessedRule {
    pub original_index: usize,
    pub lhs: Vec<Segment>,
    pub rhs: Vec<Segment>,
    pub priority: RulePriority,
}

impl ProcessedRule {
    /// `true` if this rule's LHS gates on a virtual key (as opposed to a
    /// pure composing-text pattern).
    pub fn has_virtual_key(&self) -> bool {
        self.lhs
            .iter()
            .any(|s| matches!(s, Segment::VirtualKey { .. }))
    }

    /// `true` if this rule's LHS requires a specific engine state.
    pub fn has_state(&self) -> bool {
        self.lhs.iter().any(|s| matches!(s, Segment::State(_)))
    }
}
