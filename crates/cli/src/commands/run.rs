//! `reckon run`: Solve one query with the agent loop.

use std::process::ExitCode;
use std::sync::Arc;
use reckon_agent::{Orchestrator, RunOutcome, RunReport};
use reckon_config::AppConfig;
use reckon_core::Error;
use tokio_util::sync::CancellationToken;

/// The demo task used when no query is given.
pub const DEFAULT_QUERY: &str = "Find the ASCII values of characters in INDIA and then return sum of \
exponentials of those values. After getting the final answer, create an image with the result, \
open it in Preview, and send an email with the result.";

pub async fn run(
    config: &AppConfig,
    query: Option<String>,
    max_iterations: Option<u32>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    RECKON_API_KEY, GEMINI_API_KEY, OPENAI_API_KEY");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err(Error::config("No API key found. See above for setup instructions.").into());
    }

    let agent = build_agent(config, max_iterations)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n  Interrupted, stopping after the current step...");
            on_interrupt.cancel();
        }
    });

    let query = query.unwrap_or_else(|| DEFAULT_QUERY.to_string());
    println!();
    println!("  Query:     {query}");
    println!("  Provider:  {}", config.default_provider);
    println!("  Max steps: {}", agent.settings().max_iterations);
    println!();

    let report = agent.run(&query, cancel).await;
    print_report(&report);
    Ok(ExitCode::from(exit_status(&report.outcome)))
}

/// Wire provider, tools and settings into an orchestrator.
fn build_agent(config: &AppConfig, max_iterations: Option<u32>) -> reckon_core::Result<Orchestrator> {
    if max_iterations == Some(0) {
        return Err(Error::config("--max-iterations must be at least 1"));
    }
    let router = reckon_providers::build_from_config(config);
    let provider = router
        .default()
        .ok_or_else(|| Error::config(format!("provider '{}' is not available", config.default_provider)))?;
    let tools = Arc::new(reckon_tools::default_registry(config));

    let mut agent = Orchestrator::from_config(provider, tools, config);
    if let Some(max) = max_iterations {
        agent = agent.with_max_iterations(max);
    }
    Ok(agent)
}

fn print_report(report: &RunReport) {
    match &report.outcome {
        RunOutcome::Finished { answer } => {
            println!("  ✅ Final answer: {}", answer.value);
            println!("     ({} tool iterations)", report.iterations);
        }
        RunOutcome::Failed { reason, last_error, iteration } => {
            println!("  ❌ Run failed at iteration {iteration}: {reason}");
            if let Some(e) = last_error {
                println!("     Last error: {e}");
            }
        }
    }
    println!("     Run id: {}", report.run_id);
}

fn exit_status(outcome: &RunOutcome) -> u8 {
    match outcome {
        RunOutcome::Finished { .. } => 0,
        RunOutcome::Failed { .. } => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reckon_agent::{FailureReason, FinalAnswer};

    #[test]
    fn outcomes_map_to_exit_codes() {
        let done = RunOutcome::Finished {
            answer: FinalAnswer { value: "1".into() },
        };
        let failed = RunOutcome::Failed {
            reason: FailureReason::Cancelled,
            last_error: None,
            iteration: 0,
        };
        assert_eq!(exit_status(&done), 0);
        assert_eq!(exit_status(&failed), 1);
        assert_ne!(exit_status(&failed), crate::commands::SETUP_ERROR);
    }

    #[test]
    fn agent_honours_iteration_override() {
        let agent = build_agent(&AppConfig::default(), Some(4)).unwrap();
        assert_eq!(agent.settings().max_iterations, 4);

        let agent = build_agent(&AppConfig::default(), None).unwrap();
        assert_eq!(agent.settings().max_iterations, 10);
    }

    #[test]
    fn zero_iterations_is_a_setup_error() {
        let err = build_agent(&AppConfig::default(), Some(0)).err().unwrap();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn default_query_is_the_india_task() {
        assert!(DEFAULT_QUERY.contains("INDIA"));
        assert!(DEFAULT_QUERY.contains("send an email"));
    }
}
