//! # hasoffers - A client for the HasOffers network API
//!
//! Builds signed `<root>/<Target>.json` query URLs, sends them, validates the
//! `response` envelope, retries calls the API throttles, and flattens entity
//! payloads into records.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hasoffers::Client;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hasoffers::Error> {
//!     let client = Client::builder()
//!         .network_token("NETj8s7ka3kd8")
//!         .network_id("demo")
//!         .max_retries(3)
//!         .build()?;
//!
//!     // Explicit target/method/params
//!     let response = client
//!         .call("Conversion", "findAll", &json!({ "limit": 10, "contain": ["Offer"] }))
//!         .await?;
//!     for conversion in response.extract_all(None)?.unwrap_or_default() {
//!         println!("{:?}: {}", conversion.id(), conversion["Offer"]);
//!     }
//!
//!     // Fluent form
//!     let offer = client
//!         .entity("Offer")
//!         .find_by_id(1)
//!         .contain(["Advertiser"])
//!         .send()
//!         .await?
//!         .extract_one(None)?;
//!     if let Some(offer) = offer {
//!         println!("{}", offer["name"]);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Rate limits
//!
//! When the API answers with an `errorMessage` containing
//! `"API usage exceeded rate limit"`, the same request is sent again after a
//! fixed 250ms delay, up to `max_retries` attempts in total. Every other failure
//! is returned as soon as it happens.
//!
//! ## Logging
//!
//! Calls are traced with `tracing` under the `hasoffers` target: at INFO when the
//! client is built with `debug(true)`, at DEBUG otherwise. Install whichever
//! subscriber you like; the library never installs one.

mod client;
pub mod entity;
pub mod envelope;
mod error;
pub mod mapper;
pub mod query;
mod request;
mod response;
pub mod retry;

pub use client::{Client, ClientBuilder, DEFAULT_ROOT, LOG_TARGET};
pub use entity::{Entity, MethodCall};
pub use error::{Error, Result};
pub use mapper::Record;
pub use request::Request;
pub use response::{Page, Response};
pub use retry::RetryPolicy;
