//! Command line tests for the storefront-e2e binary
//!
//! Each test points XDG_CONFIG_HOME at a temporary directory so the user's
//! real configuration and scenarios are never read.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Config that can never reach a WebDriver
const OFFLINE_CONFIG: &str = r#"
[browser]
webdriver_url = "http://127.0.0.1:1"
spawn_driver = false
"#;

const YAML_SCENARIO: &str = r#"
name: smoke
steps:
  - action: navigate
    url: /
  - action: assert_visible
    locator:
      selector: "text=Welcome"
    message: storefront did not render
"#;

fn storefront(config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_storefront-e2e"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("STOREFRONT_E2E_BASE_URL")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to run storefront-e2e")
}

fn config_home() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let app_dir = dir.path().join("storefront-e2e");
    fs::create_dir_all(app_dir.join("scenarios")).unwrap();
    fs::write(app_dir.join("config.toml"), OFFLINE_CONFIG).unwrap();
    dir
}

#[test]
fn test_list_shows_builtins_and_user_scenarios() {
    let home = config_home();
    fs::write(
        home.path().join("storefront-e2e/scenarios/smoke.yaml"),
        YAML_SCENARIO,
    )
    .unwrap();

    let output = storefront(home.path(), &["list"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for name in ["add-to-cart", "side-cart", "navigate-to-checkout", "smoke"] {
        assert!(stdout.contains(name), "missing {} in:\n{}", name, stdout);
    }
}

#[test]
fn test_unknown_scenario_errors() {
    let home = config_home();
    let output = storefront(home.path(), &["run", "buy-everything"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown scenario"));
}

#[test]
fn test_unreachable_driver_errors_with_json_result() {
    let home = config_home();
    let scenario = home.path().join("smoke.yaml");
    fs::write(&scenario, YAML_SCENARIO).unwrap();

    let output = storefront(
        home.path(),
        &["test", scenario.to_str().unwrap(), "--json"],
    );

    assert_eq!(output.status.code(), Some(2));
    let result: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be a JSON result");
    assert_eq!(result["scenario"], "smoke");
    assert_eq!(result["outcome"], "errored");
    assert_eq!(result["kind"], "DRIVER_ERROR");
    assert!(result["failing_step"].is_null());
    assert_eq!(result["steps_total"], 2);
}

#[test]
fn test_invalid_scenario_file_errors() {
    let home = config_home();
    let scenario = home.path().join("broken.yaml");
    fs::write(&scenario, "name: broken\nsteps: []\n").unwrap();

    let output = storefront(home.path(), &["test", scenario.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("has no steps"));
}
