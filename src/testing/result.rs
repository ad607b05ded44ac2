//! Execution results
//!
//! One [`ExecutionResult`] is produced per scenario run. It is serializable
//! so `--json` callers get the same data the terminal report is built from.

use serde::{Deserialize, Serialize};

use crate::common::{Error, FailureKind};

/// Terminal outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    /// The application did not behave as the scenario expects
    Failed,
    /// The environment (driver, network, browser) broke the run
    Errored,
}

impl Outcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Passed => 0,
            Outcome::Failed => 1,
            Outcome::Errored => 2,
        }
    }

    /// Outcome a required-step failure of this kind leads to
    pub fn from_kind(kind: FailureKind) -> Self {
        if kind.is_application_failure() {
            Outcome::Failed
        } else {
            Outcome::Errored
        }
    }
}

/// Runner lifecycle: `Pending -> Running -> Finished(outcome)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running,
    Finished(Outcome),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Finished(_))
    }
}

/// How an executed step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    /// A best-effort step failed and the failure was ignored
    Tolerated,
    Failed,
}

/// Record of one executed step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Position in the scenario (0-based)
    pub index: usize,
    pub label: String,
    pub status: StepStatus,
    pub duration_ms: u64,
    /// Error text for tolerated and failed steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Result of a scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub scenario: String,
    pub outcome: Outcome,
    /// Index of the step that ended the run, if one did
    pub failing_step: Option<usize>,
    pub kind: Option<FailureKind>,
    /// Human-readable diagnostic
    pub message: Option<String>,
    pub steps: Vec<StepRecord>,
    pub steps_total: usize,
    pub duration_ms: u64,
    /// Wall-clock time exceeded the scenario's advisory budget
    pub budget_exceeded: bool,
    /// Tolerated best-effort failures
    pub warnings: Vec<String>,
}

impl ExecutionResult {
    /// Result for a run that could not start, e.g. no WebDriver available
    pub fn not_started(scenario: &str, steps_total: usize, error: &Error) -> Self {
        let kind = error.kind();
        Self {
            scenario: scenario.to_string(),
            outcome: Outcome::Errored,
            failing_step: None,
            kind: Some(kind),
            message: Some(error.to_string()),
            steps: Vec::new(),
            steps_total,
            duration_ms: 0,
            budget_exceeded: false,
            warnings: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    /// Number of steps that were started
    pub fn steps_run(&self) -> usize {
        self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Passed.exit_code(), 0);
        assert_ne!(Outcome::Failed.exit_code(), 0);
        assert_ne!(Outcome::Errored.exit_code(), 0);
    }

    #[test]
    fn test_outcome_from_kind() {
        assert_eq!(
            Outcome::from_kind(FailureKind::AssertionTimeout),
            Outcome::Failed
        );
        assert_eq!(
            Outcome::from_kind(FailureKind::LocatorTimeout),
            Outcome::Failed
        );
        assert_eq!(Outcome::from_kind(FailureKind::Navigation), Outcome::Errored);
        assert_eq!(Outcome::from_kind(FailureKind::Driver), Outcome::Errored);
    }

    #[test]
    fn test_not_started_result() {
        let err = Error::DriverNotRunning("http://localhost:9515".to_string());
        let result = ExecutionResult::not_started("add-to-cart", 7, &err);
        assert_eq!(result.outcome, Outcome::Errored);
        assert_eq!(result.failing_step, None);
        assert_eq!(result.kind, Some(FailureKind::Driver));
        assert_eq!(result.steps_run(), 0);
        assert_eq!(result.steps_total, 7);
    }

    #[test]
    fn test_json_shape() {
        let err = Error::Driver("boom".to_string());
        let result = ExecutionResult::not_started("x", 1, &err);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["outcome"], "errored");
        assert_eq!(value["kind"], "DRIVER_ERROR");
        assert!(value["failing_step"].is_null());
    }
}
