//! Successful call results.
//!
//! A [`Response`] carries the envelope fields of a successful call together with
//! the request that produced it, the transport status, latency and the raw body.

use crate::{
    envelope::Envelope,
    mapper::{self, Record},
    Request, Result,
};
use http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// A successful HasOffers response.
///
/// # Examples
///
/// ```no_run
/// use hasoffers::Client;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), hasoffers::Error> {
/// let client = Client::builder()
///     .network_token("token")
///     .network_id("demo")
///     .build()?;
///
/// let response = client
///     .call("Conversion", "findAll", &json!({ "limit": 10, "contain": ["Offer"] }))
///     .await?;
///
/// println!("Took {:?} over {} attempts", response.latency, response.attempts);
/// for conversion in response.extract_all(None)?.unwrap_or_default() {
///     println!("{:?} -> {}", conversion.id(), conversion["Offer"]);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    /// The request that produced this response.
    pub request: Request,

    /// `response.data`
    pub data: Value,

    /// `response.status`; always `1` for a `Response`.
    pub status: i64,

    /// `response.httpStatus` as reported in the body, falling back to the
    /// transport status when the body omits it.
    pub http_status: i64,

    /// `response.errors`
    pub errors: Value,

    /// `response.errorMessage`; empty on success.
    pub error_message: String,

    /// The decoded body as received.
    pub body: Value,

    /// The raw response body.
    pub raw_body: String,

    /// The transport-level HTTP status code.
    pub status_code: StatusCode,

    /// Latency of the successful attempt.
    pub latency: Duration,

    /// The number of attempts made to complete this call.
    pub attempts: usize,
}

/// The pagination block of a `findAll`-style payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Page {
    /// The requested page number.
    #[serde(deserialize_with = "lenient_u64")]
    pub page: u64,
    /// The number of objects on this page.
    #[serde(deserialize_with = "lenient_u64")]
    pub current: u64,
    /// The total number of objects.
    #[serde(deserialize_with = "lenient_u64")]
    pub count: u64,
    #[serde(rename = "pageCount", deserialize_with = "lenient_u64")]
    pub page_count: u64,
}

impl Response {
    pub(crate) fn new(
        request: Request,
        envelope: Envelope,
        body: Value,
        raw_body: String,
        status_code: StatusCode,
        latency: Duration,
    ) -> Self {
        let attempts = request.attempts;
        Self {
            request,
            data: envelope.data,
            status: envelope.status,
            http_status: envelope
                .http_status
                .unwrap_or_else(|| i64::from(status_code.as_u16())),
            errors: envelope.errors,
            error_message: envelope.error_message,
            body,
            raw_body,
            status_code,
            latency,
            attempts,
        }
    }

    /// Maps `data` as a single entity.
    ///
    /// `model` defaults to the request target.
    pub fn extract_one(&self, model: Option<&str>) -> Result<Option<Record>> {
        mapper::extract_one(&self.data, model.unwrap_or(self.request.target.as_str()))
    }

    /// Maps `data` as a collection, unwrapping the page block if there is one.
    ///
    /// `model` defaults to the request target.
    pub fn extract_all(&self, model: Option<&str>) -> Result<Option<Vec<Record>>> {
        let model = model.unwrap_or(self.request.target.as_str());
        match self.data.get("page") {
            Some(_) => mapper::extract_all(self.data.get("data").unwrap_or(&Value::Null), model),
            None => mapper::extract_all(&self.data, model),
        }
    }

    /// Returns the pagination block, if `data` is paged.
    pub fn page(&self) -> Option<Page> {
        self.data.get("page")?;
        Page::deserialize(&self.data).ok()
    }

    /// Returns `true` if the call was rate limited before it succeeded.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }
}

/// Paging counters arrive as numbers or numeric strings depending on the target.
fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Counter {
        Number(u64),
        Text(String),
    }

    match Counter::deserialize(deserializer)? {
        Counter::Number(n) => Ok(n),
        Counter::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
