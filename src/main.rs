//! storefront-e2e - browser end-to-end scenarios for the storefront
//!
//! Runs built-in or YAML-defined UI scenarios through a WebDriver-controlled
//! browser and exits 0 (passed), 1 (failed) or 2 (errored).

use clap::Parser;
use storefront_e2e::cli;
use storefront_e2e::commands::Commands;
use storefront_e2e::common::logging;
use storefront_e2e::testing::Outcome;

#[derive(Parser)]
#[command(name = "storefront-e2e", about = "Storefront browser scenario runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Test { verbose: true, .. } => logging::init_verbose(),
        _ => logging::init_cli(),
    }

    match cli::dispatch(cli.command).await {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(Outcome::Errored.exit_code());
        }
    }
}
