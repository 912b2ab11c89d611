//! HasOffers client with rate-limit retries.
//!
//! The [`Client`] type is the main entry point for making API calls.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::{
    entity::Entity,
    envelope,
    retry::{RetryPolicy, DEFAULT_RETRY_DELAY},
    Error, Request, Response, Result,
};
use http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// The API root used unless [`ClientBuilder::root`] says otherwise.
pub const DEFAULT_ROOT: &str = "http://api.hasoffers.com/v3/";

/// Every log line of the client goes to this `tracing` target.
pub const LOG_TARGET: &str = "hasoffers";

/// Logs at INFO in debug mode, DEBUG otherwise.
macro_rules! trace_call {
    ($debug:expr, $($arg:tt)+) => {
        if $debug {
            tracing::info!(target: LOG_TARGET, $($arg)+)
        } else {
            tracing::debug!(target: LOG_TARGET, $($arg)+)
        }
    };
}

/// A client for the HasOffers network API.
///
/// The client is cheap to clone and safe to share between tasks: all of its
/// state is immutable, and every call owns its own [`Request`].
///
/// # Examples
///
/// ```no_run
/// use hasoffers::Client;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), hasoffers::Error> {
/// let client = Client::builder()
///     .network_token("NETj8s7ka3kd8")
///     .network_id("demo")
///     .max_retries(3)
///     .build()?;
///
/// // Explicit call
/// let response = client
///     .call("Conversion", "findAll", &json!({ "limit": 10, "contain": ["Offer"] }))
///     .await?;
/// let conversions = response.extract_all(None)?;
///
/// // Fluent call
/// let offer = client
///     .entity("Offer")
///     .find_by_id(1)
///     .contain(["Advertiser"])
///     .send()
///     .await?
///     .extract_one(None)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    root: String,
    network_token: String,
    network_id: String,
    debug: bool,
    retry_policy: RetryPolicy,
    timeout: Option<Duration>,
}

/// A body that made it through the transport.
struct Received {
    body: Value,
    raw_body: String,
    status: StatusCode,
    latency: Duration,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Calls `method` on `target` with the given parameters.
    ///
    /// `params` must serialize to a JSON object (or `null`/unit for no
    /// parameters). Rate-limited calls are retried according to the configured
    /// attempt budget; every other failure surfaces immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] for parameters that are not an object or
    /// contain `null`, and any classified error of the final attempt.
    pub async fn call<P>(&self, target: &str, method: &str, params: &P) -> Result<Response>
    where
        P: Serialize + ?Sized,
    {
        let params = match serde_json::to_value(params)
            .map_err(|e| Error::Encoding(e.to_string()))?
        {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(Error::Encoding(format!(
                    "parameters must be an object, got {}",
                    other
                )))
            }
        };

        self.call_with_params(target, method, params).await
    }

    /// Starts a fluent call on `target`.
    ///
    /// ```no_run
    /// # async fn example(client: hasoffers::Client) -> Result<(), hasoffers::Error> {
    /// let response = client.entity("Conversion").find_all().limit(10).send().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn entity(&self, target: impl Into<String>) -> Entity {
        Entity::new(self.clone(), target.into())
    }

    /// Returns the fixed retry policy of this client.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.inner.retry_policy
    }

    pub(crate) async fn call_with_params(
        &self,
        target: &str,
        method: &str,
        params: Map<String, Value>,
    ) -> Result<Response> {
        let request = self.create_request(target, method, params)?;
        self.send(request).await
    }

    /// Builds a request with the network credentials in front of `params`.
    ///
    /// Caller parameters override credentials of the same name.
    pub fn create_request(
        &self,
        target: &str,
        method: &str,
        params: Map<String, Value>,
    ) -> Result<Request> {
        let mut full = Map::new();
        full.insert("NetworkId".to_string(), Value::from(self.inner.network_id.as_str()));
        full.insert(
            "NetworkToken".to_string(),
            Value::from(self.inner.network_token.as_str()),
        );
        full.insert("Method".to_string(), Value::from(method));
        full.extend(params);

        Request::new(&self.inner.root, target, method, full)
    }

    /// Sends a request, repeating it while the API reports a rate limit.
    pub async fn send(&self, mut request: Request) -> Result<Response> {
        let debug = self.inner.debug;

        loop {
            request.attempts += 1;

            let received = self.execute_request(&request).await?;

            let error = match envelope::parse(&received.body, &received.raw_body) {
                Ok(envelope) => {
                    return Ok(Response::new(
                        request,
                        envelope,
                        received.body,
                        received.raw_body,
                        received.status,
                        received.latency,
                    ))
                }
                Err(e) => e,
            };

            tracing::warn!(
                target: LOG_TARGET,
                error = %error,
                attempt = request.attempts,
                api_target = %request.target,
                method = %request.method,
                "Call failed"
            );

            match self.inner.retry_policy.delay_after(&error, request.attempts) {
                Some(delay) => {
                    trace_call!(
                        debug,
                        attempts = request.attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying request"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(with_attempts(error, request.attempts)),
            }
        }
    }

    /// Executes a single attempt and decodes the JSON body.
    async fn execute_request(&self, request: &Request) -> Result<Received> {
        let debug = self.inner.debug;

        trace_call!(
            debug,
            url = %request.redacted_url(),
            api_target = %request.target,
            method = %request.method,
            attempt = request.attempts,
            "Executing request"
        );

        let start = Instant::now();

        let mut builder = self.inner.http_client.get(request.url.as_str());
        if let Some(timeout) = self.inner.timeout {
            builder = builder.timeout(timeout);
        }
        let response = builder.send().await?;
        let status = response.status();
        let raw_body = response.text().await?;

        let latency = start.elapsed();

        trace_call!(
            debug,
            status = status.as_u16(),
            latency_ms = latency.as_secs_f64() * 1000.0,
            body = %raw_body,
            "Received response"
        );

        match serde_json::from_str::<Value>(&raw_body) {
            Ok(body) => Ok(Received {
                body,
                raw_body,
                status,
                latency,
            }),
            Err(e) => {
                tracing::error!(
                    target: LOG_TARGET,
                    error = %e,
                    raw_response = %raw_body,
                    "Failed to decode response body"
                );

                Err(Error::Decode {
                    raw_response: raw_body,
                    serde_error: e.to_string(),
                    status,
                })
            }
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("root", &self.inner.root)
            .field("network_id", &self.inner.network_id)
            .field("debug", &self.inner.debug)
            .field("retry_policy", &self.inner.retry_policy)
            .finish_non_exhaustive()
    }
}

fn with_attempts(error: Error, attempts: usize) -> Error {
    match error {
        Error::RateLimitExceeded {
            message,
            raw_response,
            ..
        } => Error::RateLimitExceeded {
            message,
            attempts,
            raw_response,
        },
        other => other,
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use hasoffers::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), hasoffers::Error> {
/// let client = ClientBuilder::new()
///     .network_token("NETj8s7ka3kd8")
///     .network_id("demo")
///     .debug(true)
///     .max_retries(3)
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClientBuilder {
    root: String,
    network_token: Option<String>,
    network_id: Option<String>,
    debug: bool,
    max_retries: usize,
    retry_delay: Duration,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            network_token: None,
            network_id: None,
            debug: false,
            max_retries: 1,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: None,
        }
    }

    /// Creates a builder from `HASOFFERS_*` environment variables.
    ///
    /// Reads `HASOFFERS_NETWORK_TOKEN`, `HASOFFERS_NETWORK_ID`, and optionally
    /// `HASOFFERS_DEBUG`, `HASOFFERS_MAX_RETRIES` and `HASOFFERS_API_ROOT`.
    ///
    /// # Errors
    ///
    /// Returns an error if an optional variable is present but unparsable.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::new();

        if let Ok(token) = std::env::var("HASOFFERS_NETWORK_TOKEN") {
            builder = builder.network_token(token);
        }
        if let Ok(id) = std::env::var("HASOFFERS_NETWORK_ID") {
            builder = builder.network_id(id);
        }
        if let Ok(debug) = std::env::var("HASOFFERS_DEBUG") {
            builder = builder.debug(matches!(debug.trim(), "1" | "true" | "TRUE" | "yes"));
        }
        if let Ok(retries) = std::env::var("HASOFFERS_MAX_RETRIES") {
            let retries = retries.trim().parse().map_err(|e| {
                Error::Configuration(format!("Invalid HASOFFERS_MAX_RETRIES: {}", e))
            })?;
            builder = builder.max_retries(retries);
        }
        if let Ok(root) = std::env::var("HASOFFERS_API_ROOT") {
            builder = builder.root(root)?;
        }

        Ok(builder)
    }

    /// Sets the API root; calls go to `<root><Target>.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn root(mut self, url: impl AsRef<str>) -> Result<Self> {
        let mut root = Url::parse(url.as_ref())?.to_string();
        if !root.ends_with('/') {
            root.push('/');
        }
        self.root = root;
        Ok(self)
    }

    /// Sets the `NetworkToken` credential sent with every call.
    ///
    /// Required; [`build`](Self::build) fails without it.
    pub fn network_token(mut self, token: impl Into<String>) -> Self {
        self.network_token = Some(token.into());
        self
    }

    /// Sets the `NetworkId` sent with every call.
    ///
    /// Required; [`build`](Self::build) fails without it.
    pub fn network_id(mut self, id: impl Into<String>) -> Self {
        self.network_id = Some(id.into());
        self
    }

    /// Emits call traces at INFO instead of DEBUG.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets the total number of attempts for a rate-limited call.
    ///
    /// The default of `1` means rate-limited calls are not retried.
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the fixed delay between rate-limited attempts (250ms by default).
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token or network id is missing, or
    /// `max_retries` is zero.
    pub fn build(self) -> Result<Client> {
        let network_token = self
            .network_token
            .ok_or_else(|| Error::Configuration("Network token is required".to_string()))?;
        let network_id = self
            .network_id
            .ok_or_else(|| Error::Configuration("Network id is required".to_string()))?;

        if self.max_retries == 0 {
            return Err(Error::Configuration(
                "max_retries must be at least 1".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::Configuration(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                root: self.root,
                network_token,
                network_id,
                debug: self.debug,
                retry_policy: RetryPolicy::new(self.max_retries).with_delay(self.retry_delay),
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
