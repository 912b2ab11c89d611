//! Basic example demonstrating explicit and fluent calls.
//!
//! This example shows how to:
//! - Create a client from `HASOFFERS_*` environment variables
//! - Call a target/method with nested parameters
//! - Use the fluent `entity(..).method(..)` form
//! - Flatten single and collection payloads into records
//!
//! Run with: `HASOFFERS_NETWORK_TOKEN=... HASOFFERS_NETWORK_ID=... cargo run --example basic_call`

use hasoffers::{Client, ClientBuilder, Error};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Offer {
    id: i64,
    name: String,
    status: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("hasoffers=info")
        .init();

    let client: Client = ClientBuilder::from_env()?.debug(true).build()?;

    println!("=== Explicit call ===");
    let response = client
        .call(
            "Conversion",
            "findAll",
            &json!({ "limit": 5, "contain": ["Offer"], "filters": { "status": "approved" } }),
        )
        .await?;

    if let Some(page) = response.page() {
        println!("Page {} of {} ({} conversions)", page.page, page.page_count, page.count);
    }
    for conversion in response.extract_all(None)?.unwrap_or_default() {
        println!(
            "Conversion {:?}: payout {} for offer {}",
            conversion.id(),
            conversion["payout"],
            conversion["Offer"]["id"]
        );
    }
    println!("Request latency: {:?}", response.latency);
    println!();

    println!("=== Fluent call ===");
    let response = client
        .entity("Offer")
        .find_by_id(1)
        .contain(["Advertiser"])
        .send()
        .await?;

    match response.extract_one(None)? {
        Some(record) => {
            let offer: Offer = record.deserialize_into()?;
            println!("Offer: {:?}", offer);
            println!("Advertiser: {}", record["Advertiser"]);
        }
        None => println!("No such offer"),
    }

    Ok(())
}
