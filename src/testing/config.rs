//! Scenario configuration types
//!
//! Defines the data structures for scenarios, either built in code or
//! deserialized from YAML files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::{Error, Result};

/// A complete scenario: an ordered list of UI steps plus the expected outcome
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    #[serde(default)]
    pub description: Option<String>,
    /// Advisory wall-clock budget for the whole run
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// The sequence of steps to execute
    pub steps: Vec<Step>,
}

/// A single step in the execution flow
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Step {
    #[serde(flatten)]
    pub kind: StepKind,
    /// Failure is logged and tolerated instead of failing the scenario
    #[serde(default)]
    pub best_effort: bool,
    /// What the step is for, shown in logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// What a step does
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepKind {
    /// Open a URL (absolute, or relative to the base URL)
    Navigate {
        url: String,
        #[serde(default)]
        wait_until: LoadState,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    /// Wait for the page or its frames to reach a load state
    WaitForLoad {
        #[serde(default)]
        state: LoadState,
        #[serde(default)]
        timeout_ms: Option<u64>,
        #[serde(default)]
        scope: LoadScope,
    },
    /// Wait for an element to become actionable, then act on it
    Interact {
        locator: Locator,
        #[serde(default)]
        interaction: Action,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    /// Scroll the viewport by a pixel offset
    ScrollBy {
        #[serde(default)]
        dx: i64,
        #[serde(default)]
        dy: i64,
    },
    /// Scroll vertically by a multiple of the viewport height
    ScrollPage { pages: f64 },
    /// Poll until an element is visible
    AssertVisible {
        locator: Locator,
        #[serde(default)]
        timeout_ms: Option<u64>,
        /// What the assertion validates, reported when it times out
        message: String,
    },
}

/// Page load milestones
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// The navigation request was committed
    #[default]
    Commit,
    /// The document has been parsed
    DomContentLoaded,
    /// The document and its subresources have loaded
    Load,
}

impl LoadState {
    /// Whether a `document.readyState` value satisfies this state
    pub fn is_reached_by(&self, ready_state: &str) -> bool {
        match self {
            LoadState::Commit => true,
            LoadState::DomContentLoaded => matches!(ready_state, "interactive" | "complete"),
            LoadState::Load => ready_state == "complete",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Commit => write!(f, "commit"),
            LoadState::DomContentLoaded => write!(f, "domcontentloaded"),
            LoadState::Load => write!(f, "load"),
        }
    }
}

/// Which documents a load wait applies to
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadScope {
    /// The top-level document
    #[default]
    Page,
    /// Every child frame, one at a time
    Frames,
}

/// Interaction dispatched once the target is actionable
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    #[default]
    Click,
    Hover,
    Fill { text: String },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Click => write!(f, "click"),
            Action::Hover => write!(f, "hover"),
            Action::Fill { .. } => write!(f, "fill"),
        }
    }
}

/// Selector plus match index identifying one element
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    /// Selector string, optionally prefixed with its strategy
    pub selector: String,
    /// Which match to use when several elements match
    #[serde(default)]
    pub index: usize,
}

/// How a locator's selector string is interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorStrategy {
    Css(String),
    XPath(String),
    /// Innermost elements whose rendered text contains `value`, ignoring
    /// case and whitespace runs; quoted selectors must match exactly
    Text { value: String, exact: bool },
    /// `data-testid` attribute
    TestId(String),
}

impl Locator {
    /// Locator for the first match of a selector
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            index: 0,
        }
    }

    /// Use the nth match instead of the first
    pub fn nth(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Split the selector into strategy and query
    pub fn strategy(&self) -> SelectorStrategy {
        let selector = self.selector.trim();
        if let Some(rest) = selector.strip_prefix("xpath=") {
            SelectorStrategy::XPath(rest.to_string())
        } else if let Some(rest) = selector.strip_prefix("text=") {
            match strip_quotes(rest) {
                Some(quoted) => SelectorStrategy::Text {
                    value: quoted.to_string(),
                    exact: true,
                },
                None => SelectorStrategy::Text {
                    value: rest.to_string(),
                    exact: false,
                },
            }
        } else if let Some(rest) = selector.strip_prefix("testid=") {
            SelectorStrategy::TestId(rest.to_string())
        } else if let Some(rest) = selector.strip_prefix("css=") {
            SelectorStrategy::Css(rest.to_string())
        } else if selector.starts_with('/') || selector.starts_with('(') {
            SelectorStrategy::XPath(selector.to_string())
        } else {
            SelectorStrategy::Css(selector.to_string())
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 0 {
            write!(f, "'{}'", self.selector)
        } else {
            write!(f, "'{}' (match #{})", self.selector, self.index)
        }
    }
}

fn strip_quotes(value: &str) -> Option<&str> {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        Some(&value[1..value.len() - 1])
    } else {
        None
    }
}

impl Step {
    /// Required step
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            best_effort: false,
            note: None,
        }
    }

    /// Navigate and return once the request is committed
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::new(StepKind::Navigate {
            url: url.into(),
            wait_until: LoadState::Commit,
            timeout_ms: None,
        })
    }

    /// Navigate and return once `wait_until` is reached
    pub fn navigate_until(url: impl Into<String>, wait_until: LoadState) -> Self {
        Self::new(StepKind::Navigate {
            url: url.into(),
            wait_until,
            timeout_ms: None,
        })
    }

    pub fn wait_for_load(state: LoadState, scope: LoadScope) -> Self {
        Self::new(StepKind::WaitForLoad {
            state,
            timeout_ms: None,
            scope,
        })
    }

    pub fn click(locator: Locator) -> Self {
        Self::new(StepKind::Interact {
            locator,
            interaction: Action::Click,
            timeout_ms: None,
        })
    }

    pub fn scroll_by(dx: i64, dy: i64) -> Self {
        Self::new(StepKind::ScrollBy { dx, dy })
    }

    pub fn scroll_page(pages: f64) -> Self {
        Self::new(StepKind::ScrollPage { pages })
    }

    pub fn assert_visible(locator: Locator, message: impl Into<String>) -> Self {
        Self::new(StepKind::AssertVisible {
            locator,
            timeout_ms: None,
            message: message.into(),
        })
    }

    /// Tolerate failure of this step
    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    /// Override the step's own timeout; no-op for steps without one
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let ms = Some(timeout.as_millis() as u64);
        match &mut self.kind {
            StepKind::Navigate { timeout_ms, .. }
            | StepKind::WaitForLoad { timeout_ms, .. }
            | StepKind::Interact { timeout_ms, .. }
            | StepKind::AssertVisible { timeout_ms, .. } => *timeout_ms = ms,
            StepKind::ScrollBy { .. } | StepKind::ScrollPage { .. } => {}
        }
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Short label used in logs and step records
    pub fn label(&self) -> String {
        match &self.kind {
            StepKind::Navigate { url, .. } => format!("navigate {}", url),
            StepKind::WaitForLoad { state, scope, .. } => match scope {
                LoadScope::Page => format!("wait for {}", state),
                LoadScope::Frames => format!("wait for {} (frames)", state),
            },
            StepKind::Interact {
                locator,
                interaction,
                ..
            } => format!("{} {}", interaction, locator),
            StepKind::ScrollBy { dx, dy } => format!("scroll by ({}, {})", dx, dy),
            StepKind::ScrollPage { pages } => format!("scroll {} page(s)", pages),
            StepKind::AssertVisible { locator, .. } => format!("assert visible {}", locator),
        }
    }
}

impl Scenario {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            description: None,
            timeout_ms: None,
            steps,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Parse a scenario from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(yaml)
            .map_err(|e| Error::ScenarioParse(format!("Failed to parse scenario: {}", e)))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            Error::ScenarioParse(msg) => {
                Error::ScenarioParse(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// List the YAML scenario files in a directory, sorted by name
    pub fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::ScenarioParse("scenario name is empty".to_string()));
        }
        if self.steps.is_empty() {
            return Err(Error::ScenarioParse(format!(
                "scenario '{}' has no steps",
                self.name
            )));
        }
        for (i, step) in self.steps.iter().enumerate() {
            match &step.kind {
                StepKind::Interact { locator, .. } | StepKind::AssertVisible { locator, .. }
                    if locator.selector.trim().is_empty() =>
                {
                    return Err(Error::ScenarioParse(format!(
                        "step {} has an empty selector",
                        i
                    )));
                }
                StepKind::ScrollPage { pages } if !pages.is_finite() => {
                    return Err(Error::ScenarioParse(format!(
                        "step {} scrolls a non-finite number of pages",
                        i
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_scenario() {
        let yaml = r#"
name: start-flow
description: Clicking start shows the success banner
steps:
  - action: navigate
    url: /
  - action: interact
    locator:
      selector: button#start
    timeout_ms: 5000
  - action: assert_visible
    locator:
      selector: text=Success
    timeout_ms: 1000
    message: expected success banner
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.name, "start-flow");
        assert_eq!(scenario.steps.len(), 3);
        assert_eq!(
            scenario.steps[1].kind,
            StepKind::Interact {
                locator: Locator::new("button#start"),
                interaction: Action::Click,
                timeout_ms: Some(5000),
            }
        );
        assert!(!scenario.steps[2].best_effort);
    }

    #[test]
    fn test_parse_best_effort_frame_wait() {
        let yaml = r#"
name: frames
steps:
  - action: wait_for_load
    state: dom_content_loaded
    scope: frames
    timeout_ms: 3000
    best_effort: true
    note: frames may never settle
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        let step = &scenario.steps[0];
        assert!(step.best_effort);
        assert_eq!(step.note.as_deref(), Some("frames may never settle"));
        assert_eq!(
            step.kind,
            StepKind::WaitForLoad {
                state: LoadState::DomContentLoaded,
                timeout_ms: Some(3000),
                scope: LoadScope::Frames,
            }
        );
    }

    #[test]
    fn test_parse_fill_interaction() {
        let yaml = r#"
name: search
steps:
  - action: interact
    locator:
      selector: testid=search-input
      index: 1
    interaction:
      type: fill
      text: gül
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        match &scenario.steps[0].kind {
            StepKind::Interact {
                locator,
                interaction,
                ..
            } => {
                assert_eq!(locator.index, 1);
                assert_eq!(
                    interaction,
                    &Action::Fill {
                        text: "gül".to_string()
                    }
                );
            }
            other => panic!("Expected Interact, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_scenario_rejected() {
        let err = Scenario::from_yaml("name: empty\nsteps: []\n").unwrap_err();
        assert!(matches!(err, Error::ScenarioParse(_)));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = Scenario::from_yaml("name: x\nsteps:\n  - action: teleport\n").unwrap_err();
        assert!(matches!(err, Error::ScenarioParse(_)));
    }

    #[test]
    fn test_selector_strategies() {
        assert_eq!(
            Locator::new("xpath=html/body/div").strategy(),
            SelectorStrategy::XPath("html/body/div".to_string())
        );
        assert_eq!(
            Locator::new("text='Sepet'").strategy(),
            SelectorStrategy::Text {
                value: "Sepet".to_string(),
                exact: true,
            }
        );
        assert_eq!(
            Locator::new("text=Side Cart Loaded").strategy(),
            SelectorStrategy::Text {
                value: "Side Cart Loaded".to_string(),
                exact: false,
            }
        );
        assert_eq!(
            Locator::new("testid=cart").strategy(),
            SelectorStrategy::TestId("cart".to_string())
        );
        assert_eq!(
            Locator::new("//button").strategy(),
            SelectorStrategy::XPath("//button".to_string())
        );
        assert_eq!(
            Locator::new("button.primary").strategy(),
            SelectorStrategy::Css("button.primary".to_string())
        );
    }

    #[test]
    fn test_load_state_ready_states() {
        assert!(LoadState::Commit.is_reached_by("loading"));
        assert!(!LoadState::DomContentLoaded.is_reached_by("loading"));
        assert!(LoadState::DomContentLoaded.is_reached_by("interactive"));
        assert!(!LoadState::Load.is_reached_by("interactive"));
        assert!(LoadState::Load.is_reached_by("complete"));
    }

    #[test]
    fn test_timeout_builder_only_touches_timed_steps() {
        let step = Step::click(Locator::new("a")).timeout(Duration::from_millis(750));
        assert!(matches!(
            step.kind,
            StepKind::Interact {
                timeout_ms: Some(750),
                ..
            }
        ));

        let scroll = Step::scroll_by(0, 10).timeout(Duration::from_millis(750));
        assert_eq!(scroll.kind, StepKind::ScrollBy { dx: 0, dy: 10 });
    }

    #[test]
    fn test_list_dir_filters_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.yaml"), "").unwrap();
        std::fs::write(dir.path().join("a.yml"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = Scenario::list_dir(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.yml", "b.yaml"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let files = Scenario::list_dir(Path::new("/definitely/not/here")).unwrap();
        assert!(files.is_empty());
    }
}
