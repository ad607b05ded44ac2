//! WebDriver process management
//!
//! Reuses a driver that already answers on the configured endpoint, or
//! spawns chromedriver when allowed and waits for it to report ready.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command as TokioCommand};

use crate::common::config::BrowserConfig;
use crate::common::{Error, Result};
use crate::testing::wait::Deadline;

/// Default driver binary looked up on PATH
const DRIVER_BINARY: &str = "chromedriver";

/// Interval between readiness polls while the driver starts
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Per-request timeout for `/status` requests
const STATUS_TIMEOUT: Duration = Duration::from_secs(2);

/// A driver process started by us
pub struct DriverProcess {
    child: Child,
}

impl DriverProcess {
    /// Stop the driver. Failures are logged only.
    pub async fn stop(mut self) {
        tracing::debug!(pid = ?self.child.id(), "Stopping WebDriver process");
        if let Err(e) = self.child.kill().await {
            tracing::warn!(error = %e, "Failed to stop WebDriver process");
        }
    }
}

/// Ensure a WebDriver endpoint is available, spawning one if necessary.
///
/// Returns the spawned process, or `None` when an existing driver answered.
pub async fn ensure_driver_running(
    config: &BrowserConfig,
    startup: Duration,
) -> Result<Option<DriverProcess>> {
    let client = reqwest::Client::builder()
        .timeout(STATUS_TIMEOUT)
        .build()
        .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;
    let status_url = status_url(&config.webdriver_url)?;

    if is_ready(&client, &status_url).await {
        tracing::debug!(url = %config.webdriver_url, "Using running WebDriver");
        return Ok(None);
    }

    if !config.spawn_driver {
        return Err(Error::DriverNotRunning(config.webdriver_url.clone()));
    }

    let process = spawn_driver(config).await?;
    wait_until_ready(process, &client, &status_url, startup).await
}

async fn spawn_driver(config: &BrowserConfig) -> Result<DriverProcess> {
    let binary = locate_driver(config)?;
    let port = config.driver_port().ok_or_else(|| {
        Error::Config(format!(
            "Cannot determine a port from webdriver_url '{}'",
            config.webdriver_url
        ))
    })?;

    tracing::info!(path = %binary.display(), port, "Spawning WebDriver");

    let child = TokioCommand::new(&binary)
        .arg(format!("--port={}", port))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Driver(format!("Failed to spawn {}: {}", binary.display(), e)))?;

    Ok(DriverProcess { child })
}

async fn wait_until_ready(
    mut process: DriverProcess,
    client: &reqwest::Client,
    status_url: &str,
    startup: Duration,
) -> Result<Option<DriverProcess>> {
    let deadline = Deadline::after(startup);

    loop {
        if is_ready(client, status_url).await {
            tracing::debug!(elapsed_ms = deadline.elapsed().as_millis() as u64, "WebDriver ready");
            return Ok(Some(process));
        }

        if let Ok(Some(status)) = process.child.try_wait() {
            return Err(Error::Driver(format!(
                "WebDriver exited during startup ({})",
                status
            )));
        }

        if !deadline.tick(POLL_INTERVAL).await {
            process.stop().await;
            return Err(Error::DriverSpawnTimeout(startup.as_secs()));
        }
    }
}

/// Configured binary if set, otherwise `chromedriver` on PATH
fn locate_driver(config: &BrowserConfig) -> Result<PathBuf> {
    if let Some(path) = &config.driver_path {
        if path.exists() {
            return Ok(path.clone());
        }
        return Err(Error::driver_not_found(
            DRIVER_BINARY,
            &[path.display().to_string()],
        ));
    }

    which::which(DRIVER_BINARY).map_err(|_| Error::driver_not_found(DRIVER_BINARY, &["PATH"]))
}

fn status_url(webdriver_url: &str) -> Result<String> {
    let base = reqwest::Url::parse(webdriver_url).map_err(|e| {
        Error::Config(format!("Invalid webdriver_url '{}': {}", webdriver_url, e))
    })?;
    let path = format!("{}/status", base.path().trim_end_matches('/'));
    let mut url = base;
    url.set_path(&path);
    Ok(url.to_string())
}

/// Poll `/status`; a driver that answers without a `ready` flag counts as ready
async fn is_ready(client: &reqwest::Client, status_url: &str) -> bool {
    match client.get(status_url).send().await {
        Ok(resp) if resp.status().is_success() => resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body["value"]["ready"].as_bool())
            .unwrap_or(true),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_url() {
        assert_eq!(
            status_url("http://localhost:9515").unwrap(),
            "http://localhost:9515/status"
        );
        assert_eq!(
            status_url("http://grid:4444/wd/hub/").unwrap(),
            "http://grid:4444/wd/hub/status"
        );
        assert!(status_url("not a url").is_err());
    }

    #[test]
    fn test_missing_configured_driver() {
        let config = BrowserConfig {
            driver_path: Some(PathBuf::from("/nonexistent/chromedriver")),
            ..Default::default()
        };
        match locate_driver(&config) {
            Err(Error::DriverNotFound { name, searched }) => {
                assert_eq!(name, "chromedriver");
                assert!(searched.contains("/nonexistent/chromedriver"));
            }
            other => panic!("expected DriverNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_unreachable_without_spawn() {
        let config = BrowserConfig {
            webdriver_url: "http://127.0.0.1:1".to_string(),
            spawn_driver: false,
            ..Default::default()
        };
        let result = ensure_driver_running(&config, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(Error::DriverNotRunning(_))));
    }
}
