//! Rule segmentation and priority ordering, applied once at keyboard load
//! time so `Engine::process_key` walks typed segments, never raw opcodes.

pub mod preprocessor;
pub mod segment;

pub use preprocessor::RulePreprocessor;
pub use segment::{Capture, PriorityClass, ProcessedRule, RulePriority, Segment};
