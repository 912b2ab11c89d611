//! Error types for HasOffers API calls.
//!
//! Every failure a call can produce surfaces as one [`Error`] variant. Errors that
//! originate from a response body keep the raw body around so it can be logged
//! or inspected after the fact.

use http::StatusCode;
use serde_json::Value;

/// The main error type for HasOffers API calls.
///
/// # Examples
///
/// ```no_run
/// use hasoffers::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .network_token("token")
///     .network_id("demo")
///     .build()?;
///
/// match client.call("Offer", "findAll", &serde_json::json!({ "limit": 5 })).await {
///     Ok(response) => println!("Data: {}", response.data),
///     Err(Error::RateLimitExceeded { attempts, .. }) => {
///         eprintln!("Still rate limited after {} attempts", attempts);
///     }
///     Err(Error::Api { message, .. }) => eprintln!("API refused the call: {}", message),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection refused, DNS, timeout, etc.).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not valid JSON.
    ///
    /// This belongs to the transport family: the API never produced an envelope.
    #[error("Failed to decode response body (status {status}): {serde_error}")]
    Decode {
        /// The raw response body
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code reported by the transport
        status: StatusCode,
    },

    /// The body was JSON but lacked the `response`/`status` envelope.
    #[error("Unexpected response envelope: {raw_response}")]
    MalformedResponse {
        /// The raw response body
        raw_response: String,
    },

    /// The API reported that the caller exceeded its rate limit.
    ///
    /// Only returned once the configured attempt budget has been used up.
    #[error("API rate limit exceeded after {attempts} attempts: {message}")]
    RateLimitExceeded {
        /// The `errorMessage` supplied by the API
        message: String,
        /// The number of attempts made for the call
        attempts: usize,
        /// The raw response body of the last attempt
        raw_response: String,
    },

    /// The API returned a non-success envelope.
    #[error("API error: {message}")]
    Api {
        /// The `errorMessage` supplied by the API
        message: String,
        /// The `errors` detail supplied by the API
        errors: Value,
        /// The raw response body
        raw_response: String,
    },

    /// A call parameter could not be encoded into the query string.
    #[error("Failed to encode parameters: {0}")]
    Encoding(String),

    /// Entity data did not match the requested model.
    #[error("Failed to map {model}: {reason}")]
    Mapping {
        /// The model name that was being extracted
        model: String,
        /// What went wrong
        reason: String,
    },

    /// Invalid configuration was provided.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns `true` if this is the rate-limit condition.
    ///
    /// This is the only condition the client retries on.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimitExceeded { .. })
    }

    /// Returns `true` for failures below the API envelope (network or body decoding).
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Decode { .. })
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::Decode { raw_response, .. }
            | Error::MalformedResponse { raw_response }
            | Error::RateLimitExceeded { raw_response, .. }
            | Error::Api { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the server-supplied error message for classified API failures.
    pub fn message(&self) -> Option<&str> {
        match self {
            Error::RateLimitExceeded { message, .. } | Error::Api { message, .. } => Some(message),
            _ => None,
        }
    }

    pub(crate) fn mapping(model: &str, reason: impl Into<String>) -> Self {
        Error::Mapping {
            model: model.to_string(),
            reason: reason.into(),
        }
    }
}

/// A specialized `Result` type for HasOffers API calls.
pub type Result<T> = std::result::Result<T, Error>;
