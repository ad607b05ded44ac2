//! Browser session capability
//!
//! The runner only ever talks to a [`BrowserSession`]. The real
//! implementation drives Chrome through WebDriver; tests substitute a
//! scripted fake.

mod webdriver;

pub use webdriver::WebDriverSession;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::Result;
use crate::testing::{LoadState, Locator};

/// Opaque reference to an element located by a session
///
/// Only meaningful to the session that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

/// Bounding box of an element in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Snapshot of the properties that make an element actionable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementState {
    pub visible: bool,
    pub enabled: bool,
    pub rect: Rect,
}

/// Document a load-state wait applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRef {
    /// The top-level document
    Main,
    /// Child frame by position in document order
    Child(usize),
}

/// Trait for browser automation backends
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate to `url`, returning once `wait_until` is reached
    async fn open_page(&mut self, url: &str, wait_until: LoadState, timeout: Duration)
        -> Result<()>;

    /// Wait for a document to reach a load state
    async fn wait_for_load_state(
        &mut self,
        frame: FrameRef,
        state: LoadState,
        timeout: Duration,
    ) -> Result<()>;

    /// Number of child frames in the current page
    async fn frame_count(&mut self) -> Result<usize>;

    /// Resolve a locator once, without waiting
    async fn locate(&mut self, locator: &Locator) -> Result<Option<ElementHandle>>;

    /// Current actionability properties of a located element
    async fn element_state(&mut self, handle: ElementHandle) -> Result<ElementState>;

    async fn click(&mut self, handle: ElementHandle, timeout: Duration) -> Result<()>;

    async fn hover(&mut self, handle: ElementHandle) -> Result<()>;

    /// Replace the element's value with `text`
    async fn fill(&mut self, handle: ElementHandle, text: &str) -> Result<()>;

    async fn scroll_by(&mut self, dx: i64, dy: i64) -> Result<()>;

    /// Evaluate a script body and return its JSON result
    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Single visibility check
    async fn is_visible(&mut self, locator: &Locator) -> Result<bool>;

    /// Release the session and its browser. Calling it again is a no-op.
    async fn close(&mut self) -> Result<()>;
}
