//! Scenario runner implementation
//!
//! Executes a scenario's steps strictly in order against a browser session.
//! Each step gets its own timeout; a failing best-effort step is logged and
//! skipped, a failing required step ends the run. The session is closed
//! exactly once whichever way the run ends.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::browser::{BrowserSession, ElementHandle, FrameRef, Rect};
use crate::common::config::Config;
use crate::common::{resolve_url, Error, FailureKind, Result};

use super::config::{Action, LoadScope, LoadState, Locator, Scenario, Step, StepKind};
use super::result::{ExecutionResult, Outcome, RunState, StepRecord, StepStatus};
use super::wait::Deadline;

/// Script returning the viewport height in CSS pixels
const VIEWPORT_HEIGHT_SCRIPT: &str = "return window.innerHeight;";

/// Timeouts and delays applied to steps that don't specify their own
#[derive(Debug, Clone)]
pub struct RunPolicy {
    /// Base URL relative navigation targets are resolved against
    pub base_url: String,
    /// Interactions and assertions
    pub default_timeout: Duration,
    pub navigation_timeout: Duration,
    pub load_state_timeout: Duration,
    /// Pause before the single re-resolution of a locator whose action failed
    pub settle_delay: Duration,
    /// Interval between visibility/actionability checks
    pub poll_interval: Duration,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RunPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.target.base_url.clone(),
            default_timeout: config.timeouts.default_timeout(),
            navigation_timeout: config.timeouts.navigation_timeout(),
            load_state_timeout: config.timeouts.load_state_timeout(),
            settle_delay: config.timeouts.settle_delay(),
            poll_interval: config.timeouts.poll_interval(),
        }
    }
}

/// Run a scenario with the default policy
pub async fn run<S: BrowserSession>(
    scenario: &Scenario,
    session: S,
    global_timeout: Duration,
) -> ExecutionResult {
    ScenarioRunner::new(RunPolicy::default())
        .run(scenario, session, global_timeout)
        .await
}

/// Bookkeeping that survives a panicking step
#[derive(Default)]
struct Progress {
    records: Vec<StepRecord>,
    warnings: Vec<String>,
    /// Step currently executing
    current: Option<usize>,
    budget_exceeded: bool,
}

/// Executes one scenario against one session
pub struct ScenarioRunner {
    policy: RunPolicy,
    state: RunState,
}

impl ScenarioRunner {
    pub fn new(policy: RunPolicy) -> Self {
        Self {
            policy,
            state: RunState::Pending,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute `scenario`, taking ownership of the session for the run.
    ///
    /// `global_timeout` is advisory: exceeding it is logged and flagged in
    /// the result but never interrupts a step. A runner executes once; later
    /// calls return an errored result without touching any step.
    pub async fn run<S: BrowserSession>(
        &mut self,
        scenario: &Scenario,
        mut session: S,
        global_timeout: Duration,
    ) -> ExecutionResult {
        if self.state != RunState::Pending {
            let err = Error::Internal(format!(
                "runner already used for a run ({:?}); create a new runner per run",
                self.state
            ));
            close_session(&mut session).await;
            return ExecutionResult::not_started(&scenario.name, scenario.steps.len(), &err);
        }

        self.state = RunState::Running;
        info!(
            scenario = %scenario.name,
            steps = scenario.steps.len(),
            budget_ms = global_timeout.as_millis() as u64,
            "Running scenario"
        );

        let started = Instant::now();
        let mut progress = Progress::default();

        let failure = AssertUnwindSafe(self.execute(
            scenario,
            &mut session,
            global_timeout,
            &mut progress,
        ))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            let reason = panic_message(panic.as_ref());
            warn!(%reason, "Step panicked");
            progress.current.map(|index| {
                let label = scenario.steps[index].label();
                (index, label, Error::Internal(format!("step panicked: {}", reason)))
            })
        });

        close_session(&mut session).await;

        let duration = started.elapsed();
        let budget_exceeded = progress.budget_exceeded || duration > global_timeout;

        let (outcome, failing_step, kind, message) = match failure {
            None => (Outcome::Passed, None, None, None),
            Some((index, label, err)) => {
                let kind = err.kind();
                if progress.records.last().map(|r| r.index) != Some(index) {
                    // Panicked before the step could record itself
                    progress.records.push(StepRecord {
                        index,
                        label,
                        status: StepStatus::Failed,
                        duration_ms: 0,
                        detail: Some(err.to_string()),
                    });
                }
                (
                    Outcome::from_kind(kind),
                    Some(index),
                    Some(kind),
                    Some(err.to_string()),
                )
            }
        };

        self.state = RunState::Finished(outcome);
        info!(
            scenario = %scenario.name,
            ?outcome,
            duration_ms = duration.as_millis() as u64,
            "Scenario finished"
        );

        ExecutionResult {
            scenario: scenario.name.clone(),
            outcome,
            failing_step,
            kind,
            message,
            steps: progress.records,
            steps_total: scenario.steps.len(),
            duration_ms: duration.as_millis() as u64,
            budget_exceeded,
            warnings: progress.warnings,
        }
    }

    /// Run steps in order until one required step fails
    async fn execute<S: BrowserSession>(
        &self,
        scenario: &Scenario,
        session: &mut S,
        global_timeout: Duration,
        progress: &mut Progress,
    ) -> Option<(usize, String, Error)> {
        let budget = Deadline::after(global_timeout);
        let total = scenario.steps.len();

        for (index, step) in scenario.steps.iter().enumerate() {
            progress.current = Some(index);
            let label = step.label();
            info!(
                "Step {}/{}: {}{}",
                index + 1,
                total,
                label,
                step.note
                    .as_deref()
                    .map(|n| format!(" ({})", n))
                    .unwrap_or_default()
            );

            let started = Instant::now();
            let result = self.execute_step(session, step, progress).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(()) => {
                    debug!(step = index, duration_ms, "Step passed");
                    progress.records.push(StepRecord {
                        index,
                        label,
                        status: StepStatus::Ok,
                        duration_ms,
                        detail: None,
                    });
                }
                Err(e) if step.best_effort => {
                    warn!(step = index, error = %e, "Best-effort step failed; continuing");
                    progress.warnings.push(format!("step {} ({}): {}", index, label, e));
                    progress.records.push(StepRecord {
                        index,
                        label,
                        status: StepStatus::Tolerated,
                        duration_ms,
                        detail: Some(e.to_string()),
                    });
                }
                Err(e) => {
                    warn!(step = index, kind = e.kind().code(), error = %e, "Required step failed");
                    progress.records.push(StepRecord {
                        index,
                        label: label.clone(),
                        status: StepStatus::Failed,
                        duration_ms,
                        detail: Some(e.to_string()),
                    });
                    return Some((index, label, e));
                }
            }

            if !progress.budget_exceeded && budget.is_expired() {
                warn!(
                    budget_ms = global_timeout.as_millis() as u64,
                    "Scenario exceeded its time budget; remaining steps still run"
                );
                progress.budget_exceeded = true;
            }
        }

        progress.current = None;
        None
    }

    async fn execute_step<S: BrowserSession>(
        &self,
        session: &mut S,
        step: &Step,
        progress: &mut Progress,
    ) -> Result<()> {
        match &step.kind {
            StepKind::Navigate {
                url,
                wait_until,
                timeout_ms,
            } => {
                let target = resolve_url(&self.policy.base_url, url)?;
                let timeout = budget_or(*timeout_ms, self.policy.navigation_timeout);
                session.open_page(&target, *wait_until, timeout).await
            }
            StepKind::WaitForLoad {
                state,
                timeout_ms,
                scope,
            } => {
                let timeout = budget_or(*timeout_ms, self.policy.load_state_timeout);
                match scope {
                    LoadScope::Page => {
                        session
                            .wait_for_load_state(FrameRef::Main, *state, timeout)
                            .await
                    }
                    LoadScope::Frames => {
                        self.wait_for_frames(session, *state, timeout, step.best_effort, progress)
                            .await
                    }
                }
            }
            StepKind::Interact {
                locator,
                interaction,
                timeout_ms,
            } => {
                let timeout = budget_or(*timeout_ms, self.policy.default_timeout);
                self.interact(session, locator, interaction, timeout).await
            }
            StepKind::ScrollBy { dx, dy } => session.scroll_by(*dx, *dy).await,
            StepKind::ScrollPage { pages } => {
                let value = session.evaluate(VIEWPORT_HEIGHT_SCRIPT).await?;
                let height = value
                    .as_f64()
                    .ok_or_else(|| Error::UnexpectedScriptValue(value.to_string()))?;
                let dy = (height * pages).round() as i64;
                session.scroll_by(0, dy).await
            }
            StepKind::AssertVisible {
                locator,
                timeout_ms,
                message,
            } => {
                let timeout = budget_or(*timeout_ms, self.policy.default_timeout);
                self.assert_visible(session, locator, timeout, message).await
            }
        }
    }

    /// Wait on every child frame; with `best_effort` each frame may time out
    /// on its own without failing the step
    async fn wait_for_frames<S: BrowserSession>(
        &self,
        session: &mut S,
        state: LoadState,
        timeout: Duration,
        best_effort: bool,
        progress: &mut Progress,
    ) -> Result<()> {
        let count = session.frame_count().await?;
        debug!(frames = count, %state, "Waiting for frames");

        for index in 0..count {
            if let Err(e) = session
                .wait_for_load_state(FrameRef::Child(index), state, timeout)
                .await
            {
                if !best_effort {
                    return Err(e);
                }
                warn!(frame = index, error = %e, "Frame did not reach load state; continuing");
                progress.warnings.push(format!("frame {}: {}", index, e));
            }
        }
        Ok(())
    }

    /// Wait for the target, act, and on failure re-resolve once after the
    /// settle delay
    async fn interact<S: BrowserSession>(
        &self,
        session: &mut S,
        locator: &Locator,
        action: &Action,
        timeout: Duration,
    ) -> Result<()> {
        let handle = self.resolve_actionable(session, locator, timeout).await?;
        match dispatch(session, handle, action, timeout).await {
            Ok(()) => Ok(()),
            Err(first) => {
                warn!(
                    %locator,
                    %action,
                    error = %first,
                    settle_ms = self.policy.settle_delay.as_millis() as u64,
                    "Action failed; retrying once after settle delay"
                );
                tokio::time::sleep(self.policy.settle_delay).await;
                let handle = self.resolve_actionable(session, locator, timeout).await?;
                dispatch(session, handle, action, timeout).await
            }
        }
    }

    /// Poll until the locator resolves to an element that is visible,
    /// enabled, and has the same bounding box on two consecutive checks
    async fn resolve_actionable<S: BrowserSession>(
        &self,
        session: &mut S,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ElementHandle> {
        let deadline = Deadline::after(timeout);
        let mut last_rect: Option<Rect> = None;

        loop {
            if let Some(handle) = session.locate(locator).await? {
                match session.element_state(handle).await {
                    Ok(state) if state.visible && state.enabled => {
                        if last_rect == Some(state.rect) {
                            return Ok(handle);
                        }
                        last_rect = Some(state.rect);
                    }
                    Ok(_) => last_rect = None,
                    Err(e) => {
                        debug!(%locator, error = %e, "Element vanished while probing");
                        last_rect = None;
                    }
                }
            } else {
                last_rect = None;
            }

            if !deadline.tick(self.policy.poll_interval).await {
                return Err(Error::LocatorTimeout {
                    locator: locator.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
        }
    }

    async fn assert_visible<S: BrowserSession>(
        &self,
        session: &mut S,
        locator: &Locator,
        timeout: Duration,
        message: &str,
    ) -> Result<()> {
        let deadline = Deadline::after(timeout);
        loop {
            if session.is_visible(locator).await? {
                return Ok(());
            }
            if !deadline.tick(self.policy.poll_interval).await {
                return Err(Error::AssertionTimeout {
                    locator: locator.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                    message: message.to_string(),
                });
            }
        }
    }
}

async fn dispatch<S: BrowserSession>(
    session: &mut S,
    handle: ElementHandle,
    action: &Action,
    timeout: Duration,
) -> Result<()> {
    match action {
        Action::Click => session.click(handle, timeout).await,
        Action::Hover => session.hover(handle).await,
        Action::Fill { text } => session.fill(handle, text).await,
    }
}

/// Teardown never fails the run
async fn close_session<S: BrowserSession>(session: &mut S) {
    if let Err(e) = session.close().await {
        warn!(error = %e, kind = FailureKind::Driver.code(), "Failed to close browser session");
    }
}

fn budget_or(timeout_ms: Option<u64>, default: Duration) -> Duration {
    timeout_ms.map(Duration::from_millis).unwrap_or(default)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
