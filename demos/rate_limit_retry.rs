//! Example demonstrating rate-limit retries and error handling.
//!
//! This example shows how to:
//! - Give rate-limited calls an attempt budget
//! - Tell the classified error kinds apart
//! - Inspect how many attempts a call took
//!
//! Run with: `HASOFFERS_NETWORK_TOKEN=... HASOFFERS_NETWORK_ID=... cargo run --example rate_limit_retry`

use hasoffers::{ClientBuilder, Error};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("hasoffers=debug")
        .init();

    // Up to 5 attempts, 250ms apart, for calls the API throttles
    let client = ClientBuilder::from_env()?
        .max_retries(5)
        .timeout(Duration::from_secs(30))
        .build()?;

    println!("Retry policy: {:?}", client.retry_policy());

    // Fire a burst of calls so some of them hit the rate limit
    for round in 1..=20 {
        match client.entity("Offer").find_all().limit(1).send().await {
            Ok(response) => {
                println!(
                    "Round {}: ok after {} attempt(s){}",
                    round,
                    response.attempts,
                    if response.was_retried() { " (retried)" } else { "" }
                );
            }
            Err(Error::RateLimitExceeded {
                attempts, message, ..
            }) => {
                println!("Round {}: still throttled after {} attempts: {}", round, attempts, message);
            }
            Err(Error::Api { message, .. }) => {
                println!("Round {}: API refused the call: {}", round, message);
                break;
            }
            Err(e) if e.is_transport() => {
                println!("Round {}: transport failure: {}", round, e);
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
