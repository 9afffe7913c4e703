pub mod engine;

pub use engine::{Engine, EngineState, TickOutput};
