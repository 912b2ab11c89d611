//! Bracket-notation query string encoding.
//!
//! Nested parameters are flattened the way PHP's `http_build_query` does it:
//! lists become `key[0]=a&key[1]=b`, maps become `key[sub]=v`, to any depth.

use crate::{Error, Result};
use serde_json::{Map, Value};
use url::form_urlencoded::byte_serialize;

/// Encodes a parameter mapping into a query string, in mapping order.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when a value is `null`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
///
/// let params = json!({ "limit": 10, "contain": ["Offer"], "filters": { "status": "approved" } });
/// let query = hasoffers::query::build_query(params.as_object().unwrap()).unwrap();
///
/// assert_eq!(query, "limit=10&contain[0]=Offer&filters[status]=approved");
/// ```
pub fn build_query(params: &Map<String, Value>) -> Result<String> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        push_pairs(&mut pairs, encode(key), value)?;
    }
    Ok(pairs.join("&"))
}

fn push_pairs(pairs: &mut Vec<String>, prefix: String, value: &Value) -> Result<()> {
    match value {
        Value::Null => {
            return Err(Error::Encoding(format!(
                "unsupported null value for parameter `{}`",
                prefix
            )))
        }
        Value::Bool(b) => pairs.push(format!("{}={}", prefix, if *b { "1" } else { "0" })),
        Value::Number(n) => pairs.push(format!("{}={}", prefix, encode(&n.to_string()))),
        Value::String(s) => pairs.push(format!("{}={}", prefix, encode(s))),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_pairs(pairs, format!("{}[{}]", prefix, index), item)?;
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                push_pairs(pairs, format!("{}[{}]", prefix, encode(key)), item)?;
            }
        }
    }
    Ok(())
}

fn encode(raw: &str) -> String {
    byte_serialize(raw.as_bytes()).collect()
}
