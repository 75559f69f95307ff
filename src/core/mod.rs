pub mod calculator;
pub mod engine;
pub mod log;
pub mod reconciler;
pub mod stats;
pub mod ticker;
pub mod tracker;

pub use engine::{EngineOptions, SessionEngine, StopOutcome};
pub use tracker::TimeClock;
