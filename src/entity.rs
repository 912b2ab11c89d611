//! Fluent `client.entity(target).method(name)` calls.
//!
//! Each step returns a new owned value, so concurrent call chains on the same
//! [`Client`] never share target or method state.

use crate::{Client, Error, Response, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// An API target bound to a client, e.g. `Offer`.
#[derive(Debug, Clone)]
pub struct Entity {
    client: Client,
    target: String,
}

impl Entity {
    pub(crate) fn new(client: Client, target: String) -> Self {
        Self { client, target }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Selects the API method to call on this target.
    pub fn method(&self, method: impl Into<String>) -> MethodCall {
        MethodCall {
            client: self.client.clone(),
            target: self.target.clone(),
            method: method.into(),
            params: Map::new(),
        }
    }

    /// `findAll`
    pub fn find_all(&self) -> MethodCall {
        self.method("findAll")
    }

    /// `findById` with the given `id`.
    pub fn find_by_id(&self, id: impl Into<Value>) -> MethodCall {
        self.method("findById").param("id", id)
    }
}

/// A pending call: target, method and parameters, sent with [`MethodCall::send`].
///
/// # Examples
///
/// ```no_run
/// use hasoffers::Client;
///
/// # async fn example(client: Client) -> Result<(), hasoffers::Error> {
/// let conversions = client
///     .entity("Conversion")
///     .find_all()
///     .filter("status", "approved")
///     .contain(["Offer", "Affiliate"])
///     .limit(50)
///     .page(2)
///     .send()
///     .await?
///     .extract_all(None)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MethodCall {
    client: Client,
    target: String,
    method: String,
    params: Map<String, Value>,
}

impl MethodCall {
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The parameters collected so far, credentials excluded.
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Sets a single parameter, replacing any earlier value.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Merges a serializable object into the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if `params` does not serialize to an object.
    pub fn with_params<P: Serialize + ?Sized>(mut self, params: &P) -> Result<Self> {
        match serde_json::to_value(params).map_err(|e| Error::Encoding(e.to_string()))? {
            Value::Object(map) => {
                self.params.extend(map);
                Ok(self)
            }
            other => Err(Error::Encoding(format!(
                "parameters must be an object, got {}",
                other
            ))),
        }
    }

    /// Adds `filters[field]=value`.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let filters = self
            .params
            .entry("filters")
            .or_insert_with(|| Value::Object(Map::new()));
        if !filters.is_object() {
            *filters = Value::Object(Map::new());
        }
        if let Value::Object(filters) = filters {
            filters.insert(field.into(), value.into());
        }
        self
    }

    /// Requests related models alongside the target (`contain[]`).
    pub fn contain<I, S>(self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.param("contain", string_list(models))
    }

    /// Limits the returned fields (`fields[]`).
    pub fn fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.param("fields", string_list(fields))
    }

    pub fn limit(self, limit: u64) -> Self {
        self.param("limit", limit)
    }

    pub fn page(self, page: u64) -> Self {
        self.param("page", page)
    }

    /// Sends the call.
    pub async fn send(self) -> Result<Response> {
        self.client
            .call_with_params(&self.target, &self.method, self.params)
            .await
    }
}

fn string_list<I, S>(items: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Value::Array(items.into_iter().map(|s| Value::String(s.into())).collect())
}
