//! CLI command handling
//!
//! Dispatches CLI commands, owns the driver and browser session for a run,
//! and formats the result.

mod spawn;

pub use spawn::{ensure_driver_running, DriverProcess};

use colored::Colorize;

use crate::browser::WebDriverSession;
use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{logging, paths, Error, Result};
use crate::testing::{
    builtin, ExecutionResult, Outcome, RunPolicy, Scenario, ScenarioRunner, StepStatus,
};

/// Dispatch a CLI command, returning the outcome that decides the exit code
pub async fn dispatch(command: Commands) -> Result<Outcome> {
    match command {
        Commands::Run {
            name,
            json,
            base_url,
        } => {
            let scenario =
                builtin::builtin(&name).ok_or_else(|| Error::ScenarioNotFound(name.clone()))?;
            let config = load_config(base_url)?;
            Ok(run_and_report(&scenario, &config, json).await)
        }

        Commands::Test {
            path,
            verbose: _,
            json,
            base_url,
        } => {
            let scenario = Scenario::from_file(&path)?;
            let config = load_config(base_url)?;
            Ok(run_and_report(&scenario, &config, json).await)
        }

        Commands::List => {
            list_scenarios()?;
            Ok(Outcome::Passed)
        }
    }
}

/// Entry point shared by the per-scenario executables; returns the exit code
pub async fn run_standalone(name: &str) -> i32 {
    logging::init_cli();

    let Some(scenario) = builtin::builtin(name) else {
        eprintln!("Error: {}", Error::ScenarioNotFound(name.to_string()));
        return Outcome::Errored.exit_code();
    };

    match Config::load() {
        Ok(config) => run_and_report(&scenario, &config, false).await.exit_code(),
        Err(e) => {
            eprintln!("Error: {e}");
            Outcome::Errored.exit_code()
        }
    }
}

/// Run one scenario with a real driver and browser.
///
/// Setup failures produce an errored result with no failing step. The
/// session is released by the runner; a driver we spawned is stopped here.
pub async fn execute(scenario: &Scenario, config: &Config) -> ExecutionResult {
    let budget = scenario
        .timeout_ms
        .map(std::time::Duration::from_millis)
        .unwrap_or_else(|| config.timeouts.budget());

    let driver =
        match spawn::ensure_driver_running(&config.browser, config.timeouts.driver_startup()).await
        {
            Ok(driver) => driver,
            Err(e) => {
                tracing::error!(error = %e, "WebDriver unavailable");
                return ExecutionResult::not_started(&scenario.name, scenario.steps.len(), &e);
            }
        };

    let result =
        match WebDriverSession::connect(&config.browser, config.timeouts.poll_interval()).await {
            Ok(session) => {
                ScenarioRunner::new(RunPolicy::from_config(config))
                    .run(scenario, session, budget)
                    .await
            }
            Err(e) => {
                tracing::error!(error = %e, "Could not open browser session");
                ExecutionResult::not_started(&scenario.name, scenario.steps.len(), &e)
            }
        };

    if let Some(driver) = driver {
        driver.stop().await;
    }

    result
}

async fn run_and_report(scenario: &Scenario, config: &Config, json: bool) -> Outcome {
    if !json {
        print_header(scenario, &config.target.base_url);
    }

    let result = execute(scenario, config).await;

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Error: {}", Error::from(e)),
        }
    } else {
        print_report(&result);
    }

    result.outcome
}

fn load_config(base_url: Option<String>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(url) = base_url {
        reqwest::Url::parse(&url)
            .map_err(|e| Error::Config(format!("--base-url '{}' is not a valid URL: {}", url, e)))?;
        config.target.base_url = url;
    }
    Ok(config)
}

fn list_scenarios() -> Result<()> {
    println!("{}", "Built-in scenarios:".bold());
    for name in builtin::names() {
        let description = builtin::builtin(name)
            .and_then(|s| s.description)
            .unwrap_or_default();
        println!("  {:<22} {}", name.green(), description.dimmed());
    }

    if let Some(dir) = paths::scenarios_dir() {
        let files = Scenario::list_dir(&dir)?;
        println!();
        println!("{} {}", "User scenarios in".bold(), dir.display());
        if files.is_empty() {
            println!("  {}", "(none)".dimmed());
        }
        for file in files {
            match Scenario::from_file(&file) {
                Ok(scenario) => println!(
                    "  {:<22} {}",
                    scenario.name.green(),
                    file.display().to_string().dimmed()
                ),
                Err(e) => println!("  {} {}", file.display(), e.to_string().red()),
            }
        }
    }

    Ok(())
}

fn print_header(scenario: &Scenario, base_url: &str) {
    println!(
        "\n{} {}",
        "Running Scenario:".blue().bold(),
        scenario.name.white().bold()
    );
    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }
    println!("  {} {}", "Target:".cyan(), base_url);
}

fn print_report(result: &ExecutionResult) {
    println!("\n{}", "Steps:".cyan());
    for record in &result.steps {
        let number = format!("{}.", record.index + 1);
        match record.status {
            StepStatus::Ok => println!(
                "  {} {:>3} {} {}",
                "✓".green(),
                number,
                record.label,
                format!("({} ms)", record.duration_ms).dimmed()
            ),
            StepStatus::Tolerated => println!(
                "  {} {:>3} {} {}",
                "~".yellow(),
                number,
                record.label,
                record.detail.as_deref().unwrap_or_default().yellow()
            ),
            StepStatus::Failed => println!(
                "  {} {:>3} {}",
                "✗".red(),
                number,
                record.label.red()
            ),
        }
    }

    let skipped = result.steps_total.saturating_sub(result.steps_run());
    if skipped > 0 {
        println!("  {}", format!("{} step(s) not run", skipped).dimmed());
    }

    if result.budget_exceeded {
        println!(
            "\n  {} scenario ran {} ms, over its time budget",
            "!".yellow(),
            result.duration_ms
        );
    }

    match result.outcome {
        Outcome::Passed => println!(
            "\n{} {}\n",
            "✓".green().bold(),
            "Scenario Passed".green().bold()
        ),
        Outcome::Failed | Outcome::Errored => {
            let label = if result.outcome == Outcome::Failed {
                "Scenario Failed"
            } else {
                "Scenario Errored"
            };
            let location = result
                .failing_step
                .map(|k| format!(" at step {}", k + 1))
                .unwrap_or_default();
            let kind = result.kind.map(|k| k.code()).unwrap_or("UNKNOWN");
            println!(
                "\n{} {}{} [{}]",
                "✗".red().bold(),
                label.red().bold(),
                location,
                kind
            );
            if let Some(message) = &result.message {
                println!("  {}\n", message);
            }
        }
    }
}
