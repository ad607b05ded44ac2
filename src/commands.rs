//! CLI command definitions
//!
//! Defines the clap commands for the scenario runner CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a built-in storefront scenario
    Run {
        /// Scenario name (see `list`)
        name: String,

        /// Print the result as JSON instead of a report
        #[arg(long)]
        json: bool,

        /// Storefront URL, overriding config and environment
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Execute a scenario defined in a YAML file
    Test {
        /// Path to the YAML scenario file
        path: PathBuf,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,

        /// Print the result as JSON instead of a report
        #[arg(long)]
        json: bool,

        /// Storefront URL, overriding config and environment
        #[arg(long)]
        base_url: Option<String>,
    },

    /// List built-in scenarios and YAML scenarios in the config directory
    List,
}
