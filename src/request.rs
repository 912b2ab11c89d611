//! A single API call: target, method, parameters and the derived URL.

use crate::{query::build_query, Error, Result};
use serde_json::{Map, Value};

const REDACTED: &str = "***";

/// Everything needed to send one HasOffers call.
///
/// A `Request` is owned by one in-flight call. The attempt counter survives
/// rate-limit retries, so it reflects how many times the call hit the wire.
#[derive(Debug, Clone)]
pub struct Request {
    /// The API target, e.g. `Conversion` or `Offer`.
    pub target: String,

    /// The API method, e.g. `findAll` or `findById`.
    pub method: String,

    /// The full parameter mapping, credentials included.
    pub params: Map<String, Value>,

    /// The fully-qualified URL this request is sent to.
    pub url: String,

    /// How many times this request has been sent.
    pub attempts: usize,
}

impl Request {
    /// Builds a request for `<root><target>.json?<params>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the target is not a plain identifier or a
    /// parameter cannot be encoded.
    pub fn new(
        root: &str,
        target: impl Into<String>,
        method: impl Into<String>,
        params: Map<String, Value>,
    ) -> Result<Self> {
        let target = target.into();
        if target.is_empty() || !target.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::Encoding(format!("invalid target `{}`", target)));
        }

        let url = format!("{}{}.json?{}", root, target, build_query(&params)?);

        Ok(Self {
            target,
            method: method.into(),
            params,
            url,
            attempts: 0,
        })
    }

    /// Returns the URL with the top-level `NetworkToken` value masked, for logging.
    pub fn redacted_url(&self) -> String {
        if !self.params.contains_key("NetworkToken") {
            return self.url.clone();
        }

        let mut params = self.params.clone();
        params.insert("NetworkToken".to_string(), Value::from(REDACTED));

        let base = self.url.split_once('?').map_or(self.url.as_str(), |(base, _)| base);
        match build_query(&params) {
            Ok(query) => format!("{}?{}", base, query),
            Err(_) => base.to_string(),
        }
    }
}
