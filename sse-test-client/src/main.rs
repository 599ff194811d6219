use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::time::Duration;

mod output;
mod scenarios;
mod sse_client;

use output::print_test_summary;
use sse_client::Connection;

#[derive(Parser)]
#[command(name = "sse-test-client")]
#[command(about = "SSE Integration Testing Tool")]
struct Cli {
    /// Base URL of the backend (e.g., http://localhost:4000)
    #[arg(long)]
    base_url: String,

    /// Secret the server verifies access tokens with; used to mint test tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// User id of the first test user
    #[arg(long, default_value = "sse-test-user-1")]
    user1: String,

    /// User id of the second test user
    #[arg(long, default_value = "sse-test-user-2")]
    user2: String,

    /// Test scenario to run
    #[arg(long, value_enum)]
    scenario: ScenarioChoice,

    /// Seconds to wait for a ping; should exceed the server's ping interval
    #[arg(long, default_value_t = 35)]
    ping_timeout_secs: u64,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum ScenarioChoice {
    /// Test basic SSE connection and the connected greeting
    ConnectionTest,
    /// Test that pings arrive on every connection
    PingTest,
    /// Test that missing or invalid tokens are refused
    AuthTest,
    /// Test the health endpoint's connection count
    HealthTest,
    /// Run all tests
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    println!("{}", "=== SETUP PHASE ===".bright_white().bold());

    println!("{} Minting access tokens...", "→".blue());
    let token1 = domain::jwt::encode_token(cli.jwt_secret.as_bytes(), &cli.user1, vec![])
        .context("failed to mint token for user 1")?;
    let token2 = domain::jwt::encode_token(cli.jwt_secret.as_bytes(), &cli.user2, vec![])
        .context("failed to mint token for user 2")?;

    println!("\n{} Establishing SSE connections...", "→".blue());
    let mut sse1 = Connection::establish(&cli.base_url, &token1, "User 1".to_string()).await?;
    let mut sse2 = Connection::establish(&cli.base_url, &token2, "User 2".to_string()).await?;

    println!("{} User 1 SSE connection established", "✓".green());
    println!("{} User 2 SSE connection established", "✓".green());

    println!("\n{}", "=== TEST PHASE ===".bright_white().bold());

    let client = reqwest::Client::new();
    let ping_timeout = Duration::from_secs(cli.ping_timeout_secs);
    let mut results = Vec::new();

    match cli.scenario {
        ScenarioChoice::ConnectionTest => {
            results.push(
                scenarios::test_connection(&cli.user1, &cli.user2, &mut sse1, &mut sse2).await?,
            );
        }
        ScenarioChoice::PingTest => {
            results.push(scenarios::test_ping(&mut sse1, &mut sse2, ping_timeout).await?);
        }
        ScenarioChoice::AuthTest => {
            results.push(scenarios::test_rejected_tokens(&client, &cli.base_url).await?);
        }
        ScenarioChoice::HealthTest => {
            // The connections only count once the server has admitted them
            results.push(
                scenarios::test_connection(&cli.user1, &cli.user2, &mut sse1, &mut sse2).await?,
            );
            results.push(scenarios::test_health(&client, &cli.base_url, 2).await?);
        }
        ScenarioChoice::All => {
            results.push(
                scenarios::test_connection(&cli.user1, &cli.user2, &mut sse1, &mut sse2).await?,
            );
            results.push(scenarios::test_health(&client, &cli.base_url, 2).await?);
            results.push(scenarios::test_rejected_tokens(&client, &cli.base_url).await?);
            results.push(scenarios::test_ping(&mut sse1, &mut sse2, ping_timeout).await?);
        }
    }

    println!("\n{}", "=== RESULTS ===".bright_white().bold());
    print_test_summary(&results);

    let all_passed = results.iter().all(|r| r.passed);

    if all_passed {
        println!("\n{}", "All tests passed! ✓".bright_green().bold());
    } else {
        println!("\n{}", "Some tests failed! ✗".bright_red().bold());
    }

    std::process::exit(if all_passed { 0 } else { 1 });
}
