//! Scenario execution
//!
//! Scenarios are ordered lists of UI steps, either built in
//! ([`builtin`]) or loaded from YAML. The runner executes them against a
//! [`BrowserSession`](crate::browser::BrowserSession) and produces an
//! [`ExecutionResult`].

pub mod builtin;
mod config;
mod result;
mod runner;
pub mod wait;

pub use config::*;
pub use result::{ExecutionResult, Outcome, RunState, StepRecord, StepStatus};
pub use runner::{run, RunPolicy, ScenarioRunner};
