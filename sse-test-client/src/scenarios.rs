use crate::output::TestResult;
use crate::sse_client::Connection;
use anyhow::Result;
use colored::*;
use serde_json::Value;
use std::time::{Duration, Instant};

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Both users receive `connected` first, carrying their own user id.
pub async fn test_connection(
    user1: &str,
    user2: &str,
    sse1: &mut Connection,
    sse2: &mut Connection,
) -> Result<TestResult> {
    let name = "Connection";
    let start = Instant::now();
    println!("\n{} Running scenario: {}", "→".blue(), name);

    for (user_id, sse) in [(user1, sse1), (user2, sse2)] {
        let event = match sse.wait_for_event("connected", EVENT_TIMEOUT).await {
            Ok(event) => event,
            Err(e) => {
                return Ok(TestResult::fail(
                    name,
                    format!("{}: {}", sse.user_label, e),
                    start.elapsed(),
                ))
            }
        };

        if event.data["user_id"] != user_id {
            return Ok(TestResult::fail(
                name,
                format!(
                    "{} got connected for user {} instead of {}",
                    sse.user_label, event.data["user_id"], user_id
                ),
                start.elapsed(),
            ));
        }

        if !event.id.as_deref().is_some_and(|id| id.starts_with("connect-")) {
            return Ok(TestResult::fail(
                name,
                format!(
                    "{} got connected with unexpected id {:?}",
                    sse.user_label, event.id
                ),
                start.elapsed(),
            ));
        }

        if event.data["client_id"].as_str().map_or(true, str::is_empty) {
            return Ok(TestResult::fail(
                name,
                format!("{} got connected without a client_id", sse.user_label),
                start.elapsed(),
            ));
        }

        println!(
            "{} {} connected as client {}",
            "✓".green(),
            sse.user_label,
            event.data["client_id"]
        );
    }

    Ok(TestResult::pass(name, start.elapsed()))
}

/// Every connection sees a `ping` within one ping interval. Run the server with a
/// short `SSE_PING_INTERVAL_SECS` to keep this quick.
pub async fn test_ping(
    sse1: &mut Connection,
    sse2: &mut Connection,
    ping_timeout: Duration,
) -> Result<TestResult> {
    let name = "Ping";
    let start = Instant::now();
    println!("\n{} Running scenario: {}", "→".blue(), name);

    for sse in [sse1, sse2] {
        match sse.wait_for_event("ping", ping_timeout).await {
            Ok(event) if event.data["timestamp"].is_i64() => {
                println!("{} {} received ping", "✓".green(), sse.user_label);
            }
            Ok(event) => {
                return Ok(TestResult::fail(
                    name,
                    format!("{} got a ping without timestamp: {}", sse.user_label, event.data),
                    start.elapsed(),
                ))
            }
            Err(e) => {
                return Ok(TestResult::fail(
                    name,
                    format!("{}: {}", sse.user_label, e),
                    start.elapsed(),
                ))
            }
        }
    }

    Ok(TestResult::pass(name, start.elapsed()))
}

/// Connecting without a token or with a bad one is refused with 401 and a JSON body.
pub async fn test_rejected_tokens(client: &reqwest::Client, base_url: &str) -> Result<TestResult> {
    let name = "Rejected tokens";
    let start = Instant::now();
    println!("\n{} Running scenario: {}", "→".blue(), name);

    let cases = [
        ("no token", format!("{}/api/sse/connect", base_url)),
        (
            "invalid token",
            format!("{}/api/sse/connect?token=not-a-jwt", base_url),
        ),
    ];

    for (label, url) in cases {
        let response = client.get(&url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::UNAUTHORIZED {
            return Ok(TestResult::fail(
                name,
                format!("{} answered {} instead of 401", label, status),
                start.elapsed(),
            ));
        }

        let body: Value = response.json().await?;
        if body["status"] != "error" {
            return Ok(TestResult::fail(
                name,
                format!("{} returned unexpected body {}", label, body),
                start.elapsed(),
            ));
        }
        println!("{} {} refused: {}", "✓".green(), label, body["message"]);
    }

    Ok(TestResult::pass(name, start.elapsed()))
}

/// `/health` counts at least the connections this tool holds open.
pub async fn test_health(
    client: &reqwest::Client,
    base_url: &str,
    expected_connections: u64,
) -> Result<TestResult> {
    let name = "Health";
    let start = Instant::now();
    println!("\n{} Running scenario: {}", "→".blue(), name);

    let body: Value = client
        .get(format!("{}/health", base_url))
        .send()
        .await?
        .json()
        .await?;

    let connections = body["connections"].as_u64().unwrap_or_default();
    if body["status"] != "healthy" || connections < expected_connections {
        return Ok(TestResult::fail(
            name,
            format!(
                "expected healthy with at least {} connections, got {}",
                expected_connections, body
            ),
            start.elapsed(),
        ));
    }

    println!("{} server reports {} connections", "✓".green(), connections);
    Ok(TestResult::pass(name, start.elapsed()))
}
