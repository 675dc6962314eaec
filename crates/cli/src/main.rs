//! Reckon CLI: the main entry point.
//!
//! Commands:
//! - `run`    : Solve one query with the agent loop
//! - `tools`  : List the tools the model can call
//! - `config` : Show, locate or validate the configuration

use std::process::ExitCode;
use clap::{Parser, Subcommand};
use reckon_config::AppConfig;

mod commands;
mod logging;

#[derive(Parser)]
#[command(
    name = "reckon",
    about = "Reckon: an LLM agent that solves tasks one tool call at a time",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent on a query
    Run {
        /// The task to solve (defaults to the INDIA exponential-sum demo)
        query: Option<String>,

        /// Override agent.max_iterations (at least 1)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_iterations: Option<u32>,
    },

    /// List the available tools
    Tools,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the config file location
    Path,
    /// Check the configuration for problems
    Validate,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Commands::Config { action: ConfigAction::Path } = cli.command {
        commands::config_cmd::path();
        return ExitCode::SUCCESS;
    }

    let config = AppConfig::load();
    let logging = config.as_ref().map(|c| c.logging.clone()).unwrap_or_default();
    if let Err(e) = logging::init(cli.verbose, &logging) {
        eprintln!("  [Warning] file logging disabled: {e}");
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("  [Error] Failed to load config: {e}");
            return commands::setup_error();
        }
    };

    let result = match cli.command {
        Commands::Run { query, max_iterations } => {
            commands::run::run(&config, query, max_iterations).await
        }
        Commands::Tools => commands::tools::run(&config).map(|_| ExitCode::SUCCESS),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(&config).map(|_| ExitCode::SUCCESS),
            ConfigAction::Validate => {
                commands::config_cmd::validate(&config).map(|_| ExitCode::SUCCESS)
            }
            ConfigAction::Path => {
                commands::config_cmd::path();
                Ok(ExitCode::SUCCESS)
            }
        },
    };

    result.unwrap_or_else(|e| {
        eprintln!("  [Error] {e}");
        commands::setup_error()
    })
}
