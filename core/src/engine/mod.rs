//! Key-processing engine: state, matching, RHS application, and the
//! top-level `Engine` that ties them together.

mod apply;
pub mod engine;
pub mod matcher;
pub mod state;

pub use engine::{ActionType, Engine, KeyboardMeta, Output};
pub use matcher::KeyInput;
pub use state::{EngineState, History};
