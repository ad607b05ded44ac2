//! Storefront E2E - browser scenario runner
//!
//! Executes ordered UI scenarios (navigate, wait, interact, assert) against
//! a browser session and reports a passed, failed or errored outcome.

pub mod browser;
pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use browser::BrowserSession;
pub use common::{Error, FailureKind, Result};
pub use testing::{ExecutionResult, Outcome, Scenario, Step};
