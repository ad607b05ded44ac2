//! WebDriver-backed browser session
//!
//! Drives Chrome through a chromedriver endpoint using thirtyfour. The page
//! load strategy is `none` so navigation returns as soon as the request is
//! committed; richer load states are observed by polling
//! `document.readyState`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thirtyfour::prelude::*;
use thirtyfour::{CapabilitiesHelper, ChromiumLikeCapabilities, PageLoadStrategy};

use crate::common::config::BrowserConfig;
use crate::common::{Error, Result};
use crate::testing::wait::Deadline;
use crate::testing::{LoadState, Locator, SelectorStrategy};

use super::{BrowserSession, ElementHandle, ElementState, FrameRef, Rect};

/// Browser session over a WebDriver connection
pub struct WebDriverSession {
    /// Live driver; `None` once closed
    driver: Option<WebDriver>,
    /// Elements handed out to the runner, keyed by handle id
    elements: HashMap<u64, WebElement>,
    /// Next handle id
    next_handle: u64,
    /// Interval between `document.readyState` polls
    poll_interval: Duration,
}

impl WebDriverSession {
    /// Create a new browser session on the configured WebDriver endpoint
    pub async fn connect(config: &BrowserConfig, poll_interval: Duration) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        if config.headless {
            caps.set_headless()?;
        }
        for arg in &config.args {
            caps.add_arg(arg)?;
        }
        caps.set_page_load_strategy(PageLoadStrategy::None)?;

        tracing::debug!(
            url = %config.webdriver_url,
            headless = config.headless,
            "Creating WebDriver session"
        );

        let driver = WebDriver::new(config.webdriver_url.as_str(), caps)
            .await
            .map_err(|e| {
                Error::Driver(format!(
                    "Failed to create browser session at {}: {}",
                    config.webdriver_url, e
                ))
            })?;

        Ok(Self {
            driver: Some(driver),
            elements: HashMap::new(),
            next_handle: 1,
            poll_interval,
        })
    }

    fn driver(&self) -> Result<&WebDriver> {
        self.driver
            .as_ref()
            .ok_or_else(|| Error::Driver("Browser session already closed".to_string()))
    }

    fn element(&self, handle: ElementHandle) -> Result<&WebElement> {
        self.elements
            .get(&handle.0)
            .ok_or(Error::StaleHandle(handle.0))
    }

    async fn find(&self, locator: &Locator) -> Result<Option<WebElement>> {
        let driver = self.driver()?;
        let mut found = match query_for(locator) {
            Query::Native(by) => driver.find_all(by).await?,
            Query::Text { value, exact } => {
                driver
                    .execute(TEXT_QUERY_SCRIPT, vec![json!(value), json!(exact)])
                    .await?
                    .elements()?
            }
        };
        if locator.index < found.len() {
            Ok(Some(found.swap_remove(locator.index)))
        } else {
            Ok(None)
        }
    }

    async fn ready_state(&self) -> Result<String> {
        let ret = self
            .driver()?
            .execute("return document.readyState;", Vec::new())
            .await?;
        ret.json()
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::UnexpectedScriptValue(ret.json().to_string()))
    }

    /// Poll the current document until it reaches `state`
    async fn poll_ready_state(&self, state: LoadState, deadline: &Deadline) -> Result<()> {
        loop {
            let ready = self.ready_state().await?;
            if state.is_reached_by(&ready) {
                return Ok(());
            }
            if !deadline.tick(self.poll_interval).await {
                return Err(Error::LoadStateTimeout {
                    state: state.to_string(),
                    timeout_ms: deadline.timeout().as_millis() as u64,
                });
            }
        }
    }
}

/// Innermost elements whose normalized text contains (or, when exact,
/// equals) `arguments[0]`. Non-rendered subtrees are skipped and matches come
/// back in document order.
const TEXT_QUERY_SCRIPT: &str = r#"
const exact = arguments[1];
const fold = (s) => {
  const t = (s || '').replace(/\s+/g, ' ').trim();
  return exact ? t : t.toLowerCase();
};
const wanted = fold(arguments[0]);
const skip = new Set(['HEAD', 'TITLE', 'SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE']);
const found = [];
const walk = (el) => {
  if (skip.has(el.tagName)) return false;
  const text = fold(el.textContent);
  if (!text.includes(wanted)) return false;
  let inner = false;
  for (const child of el.children) {
    if (walk(child)) inner = true;
  }
  if (inner) return true;
  if (!exact || text === wanted) {
    found.push(el);
    return true;
  }
  return false;
};
if (document.body) walk(document.body);
return found;
"#;

/// How a locator is resolved by the driver
#[derive(Debug)]
enum Query {
    Native(By),
    Text { value: String, exact: bool },
}

fn query_for(locator: &Locator) -> Query {
    match locator.strategy() {
        SelectorStrategy::Css(css) => Query::Native(By::Css(css)),
        SelectorStrategy::XPath(xpath) => {
            // Positional paths are written relative to the document root
            if xpath.starts_with('/') || xpath.starts_with('(') {
                Query::Native(By::XPath(xpath))
            } else {
                Query::Native(By::XPath(format!("/{}", xpath)))
            }
        }
        SelectorStrategy::Text { value, exact } => Query::Text { value, exact },
        SelectorStrategy::TestId(id) => {
            Query::Native(By::Css(format!("[data-testid=\"{}\"]", id)))
        }
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn open_page(
        &mut self,
        url: &str,
        wait_until: LoadState,
        timeout: Duration,
    ) -> Result<()> {
        let deadline = Deadline::after(timeout);
        // Handles from the previous document are meaningless now
        self.elements.clear();

        let driver = self.driver()?;
        match tokio::time::timeout(timeout, driver.goto(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(Error::navigation(url, e)),
            Err(_) => {
                return Err(Error::navigation(
                    url,
                    format!("timed out after {} ms", timeout.as_millis()),
                ))
            }
        }

        if wait_until != LoadState::Commit {
            self.poll_ready_state(wait_until, &deadline).await?;
        }
        Ok(())
    }

    async fn wait_for_load_state(
        &mut self,
        frame: FrameRef,
        state: LoadState,
        timeout: Duration,
    ) -> Result<()> {
        let deadline = Deadline::after(timeout);
        match frame {
            FrameRef::Main => self.poll_ready_state(state, &deadline).await,
            FrameRef::Child(index) => {
                let frame_number = u16::try_from(index)
                    .map_err(|_| Error::Driver(format!("Frame index {} out of range", index)))?;
                self.driver()?.enter_frame(frame_number).await?;
                let result = self.poll_ready_state(state, &deadline).await;
                // Always return to the top-level document
                self.driver()?.enter_default_frame().await?;
                result
            }
        }
    }

    async fn frame_count(&mut self) -> Result<usize> {
        let frames = self.driver()?.find_all(By::Css("iframe, frame")).await?;
        Ok(frames.len())
    }

    async fn locate(&mut self, locator: &Locator) -> Result<Option<ElementHandle>> {
        match self.find(locator).await? {
            Some(element) => {
                // Repeated lookups of the same node share one handle
                let id = element.element_id();
                if let Some(known) = known_handle(&self.elements, |e| e.element_id() == id) {
                    return Ok(Some(known));
                }
                let handle = ElementHandle(self.next_handle);
                self.next_handle += 1;
                self.elements.insert(handle.0, element);
                Ok(Some(handle))
            }
            None => Ok(None),
        }
    }

    async fn element_state(&mut self, handle: ElementHandle) -> Result<ElementState> {
        let element = self.element(handle)?;
        let visible = element.is_displayed().await?;
        let enabled = element.is_enabled().await?;
        let rect = element.rect().await?;
        Ok(ElementState {
            visible,
            enabled,
            rect: Rect {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
            },
        })
    }

    async fn click(&mut self, handle: ElementHandle, timeout: Duration) -> Result<()> {
        let element = self.element(handle)?;
        match tokio::time::timeout(timeout, element.click()).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::Driver(format!(
                "Click did not complete within {} ms",
                timeout.as_millis()
            ))),
        }
    }

    async fn hover(&mut self, handle: ElementHandle) -> Result<()> {
        let element = self.element(handle)?;
        self.driver()?
            .action_chain()
            .move_to_element_center(element)
            .perform()
            .await?;
        Ok(())
    }

    async fn fill(&mut self, handle: ElementHandle, text: &str) -> Result<()> {
        let element = self.element(handle)?;
        element.clear().await?;
        element.send_keys(text).await?;
        Ok(())
    }

    async fn scroll_by(&mut self, dx: i64, dy: i64) -> Result<()> {
        self.driver()?
            .execute(
                "window.scrollBy(arguments[0], arguments[1]);",
                vec![json!(dx), json!(dy)],
            )
            .await?;
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value> {
        let ret = self.driver()?.execute(script, Vec::new()).await?;
        Ok(ret.json().clone())
    }

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool> {
        match self.find(locator).await? {
            // A node detached between lookup and the visibility check is simply not visible
            Some(element) => Ok(element.is_displayed().await.unwrap_or(false)),
            None => Ok(false),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.elements.clear();
        if let Some(driver) = self.driver.take() {
            tracing::debug!("Closing browser session");
            driver.quit().await?;
        }
        Ok(())
    }
}

fn known_handle<E>(elements: &HashMap<u64, E>, same: impl Fn(&E) -> bool) -> Option<ElementHandle> {
    elements
        .iter()
        .find_map(|(key, e)| same(e).then_some(ElementHandle(*key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_xpath_anchored_at_root() {
        let query = query_for(&Locator::new("xpath=html/body/div/button"));
        assert!(format!("{:?}", query).contains("/html/body/div/button"));
    }

    #[test]
    fn test_unquoted_text_is_loose() {
        match query_for(&Locator::new("text=Side Cart Loaded Successfully")) {
            Query::Text { value, exact } => {
                assert_eq!(value, "Side Cart Loaded Successfully");
                assert!(!exact);
            }
            other => panic!("expected text query, got {:?}", other),
        }
    }

    #[test]
    fn test_quoted_text_is_exact() {
        assert!(matches!(
            query_for(&Locator::new("text=\"Sepet\"")),
            Query::Text { exact: true, .. }
        ));
    }

    #[test]
    fn test_text_script_skips_non_rendered_nodes() {
        for tag in ["HEAD", "TITLE", "SCRIPT", "STYLE"] {
            assert!(TEXT_QUERY_SCRIPT.contains(tag));
        }
        assert!(TEXT_QUERY_SCRIPT.contains("toLowerCase"));
    }

    #[test]
    fn test_known_node_reuses_its_handle() {
        let mut elements = HashMap::new();
        elements.insert(3, "node-a");
        elements.insert(7, "node-b");

        assert_eq!(known_handle(&elements, |e| *e == "node-b"), Some(ElementHandle(7)));
        assert_eq!(known_handle(&elements, |e| *e == "node-c"), None);
    }
}
