//! Parsing and classification of the `{"response": {...}}` envelope.

use crate::{mapper::whole_number, Error};
use serde_json::Value;

/// Substring the API uses to signal that a caller is being throttled.
pub const RATE_LIMIT_MESSAGE: &str = "API usage exceeded rate limit";

/// Value of `response.status` on success.
pub const STATUS_SUCCESS: i64 = 1;

/// The fields of a successful envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// `response.data`
    pub data: Value,
    /// `response.status`
    pub status: i64,
    /// `response.httpStatus`, if the API reported one
    pub http_status: Option<i64>,
    /// `response.errors`
    pub errors: Value,
    /// `response.errorMessage`, empty on success
    pub error_message: String,
}

/// Validates a decoded body and extracts its envelope.
///
/// Only `response.status` is mandatory. The other fields are taken as they
/// come: `httpStatus` counts only when it is a whole number, and a non-string
/// `errorMessage` reads as empty. `raw` is the undecoded body, kept on the
/// error for diagnostics.
///
/// # Errors
///
/// Any non-success body is turned into an error by [`classify`].
pub fn parse(body: &Value, raw: &str) -> Result<Envelope, Error> {
    let response = &body["response"];
    let status = response.get("status").and_then(whole_number);

    if status != Some(STATUS_SUCCESS) {
        return Err(classify(body, raw));
    }

    Ok(Envelope {
        data: response.get("data").cloned().unwrap_or(Value::Null),
        status: STATUS_SUCCESS,
        http_status: response.get("httpStatus").and_then(whole_number),
        errors: response.get("errors").cloned().unwrap_or(Value::Null),
        error_message: response
            .get("errorMessage")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Turns a failed envelope into the matching error kind.
///
/// The rate-limit error reports a single attempt; the caller fills in the
/// real count once retries are settled.
pub fn classify(body: &Value, raw: &str) -> Error {
    let Some(response) = body.get("response").filter(|r| r.get("status").is_some()) else {
        return Error::MalformedResponse {
            raw_response: raw.to_string(),
        };
    };

    let message = response
        .get("errorMessage")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if message.contains(RATE_LIMIT_MESSAGE) {
        return Error::RateLimitExceeded {
            message,
            attempts: 1,
            raw_response: raw.to_string(),
        };
    }

    Error::Api {
        message,
        errors: response.get("errors").cloned().unwrap_or(Value::Null),
        raw_response: raw.to_string(),
    }
}
