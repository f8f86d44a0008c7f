//! Turn loop: model calls interleaved with tool execution

pub mod events;
pub mod runner;

pub use events::{NoopEvents, TurnEvents};
pub use runner::{AgentRunner, RunnerSettings, TurnOutcome};
