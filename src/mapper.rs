//! Flattening of entity payloads into [`Record`]s.
//!
//! HasOffers returns each object as a set of scopes keyed by model name:
//!
//! ```json
//! { "Conversion": { "id": "5", "payout": "10" }, "Offer": { "id": "2" } }
//! ```
//!
//! Extraction takes the scope named after the requested model and adds every
//! other scope to it as a field, so the example becomes a `Conversion` record
//! with an extra `Offer` field. Fields of the primary scope always win over a
//! sibling scope with the same name.

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A flat entity record.
///
/// Fields keep their decoded JSON type, except `id`, which is always an integer.
///
/// # Examples
///
/// ```
/// use hasoffers::mapper;
/// use serde_json::json;
///
/// let data = json!({ "Offer": { "id": "12", "name": "Summer" }, "Advertiser": { "id": "3" } });
/// let offer = mapper::extract_one(&data, "Offer").unwrap().unwrap();
///
/// assert_eq!(offer.id(), Some(12));
/// assert_eq!(offer["name"], "Summer");
/// assert_eq!(offer["Advertiser"]["id"], "3");
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Builds a record from a field mapping, coercing `id` to an integer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mapping`] if `id` is present but not an integer.
    pub fn from_fields(model: &str, mut fields: Map<String, Value>) -> Result<Self> {
        if let Some(id) = fields.get_mut("id") {
            *id = Value::from(coerce_id(model, id)?);
        }
        Ok(Self { fields })
    }

    /// Returns the field with the given name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns the field as a string slice, if it is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Returns the coerced `id`, if the record has one.
    pub fn id(&self) -> Option<i64> {
        self.fields.get("id").and_then(Value::as_i64)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in payload order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.fields
    }

    /// Deserializes the record into a caller-defined type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mapping`] if the fields do not fit `T`.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&Value::Object(self.fields.clone())).map_err(|e| {
            Error::mapping(std::any::type_name::<T>(), e.to_string())
        })
    }
}

/// Deserializing goes through [`Record::from_fields`], so `id` is checked too.
impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        Record::from_fields("Record", fields).map_err(serde::de::Error::custom)
    }
}

impl std::ops::Index<&str> for Record {
    type Output = Value;

    /// Missing fields index to `Value::Null`, like `serde_json::Value` does.
    fn index(&self, name: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(name).unwrap_or(&NULL)
    }
}

/// Maps a single-object payload.
///
/// Returns `Ok(None)` when `data` is empty (`{}`, `[]` or `null`).
///
/// # Errors
///
/// Returns [`Error::Mapping`] when `data` has no `model` scope or is not an object.
pub fn extract_one(data: &Value, model: &str) -> Result<Option<Record>> {
    if is_empty(data) {
        return Ok(None);
    }
    let scopes = data
        .as_object()
        .ok_or_else(|| Error::mapping(model, "payload is not an object"))?;

    merge_scopes(scopes, model).map(Some)
}

/// Maps a collection payload keyed by object id.
///
/// Records come back in payload order. Returns `Ok(None)` when `data` is empty,
/// so "nothing returned" stays distinguishable from a collection.
///
/// # Errors
///
/// Returns [`Error::Mapping`] if any entry lacks a `model` scope.
pub fn extract_all(data: &Value, model: &str) -> Result<Option<Vec<Record>>> {
    if is_empty(data) {
        return Ok(None);
    }

    let entries: Vec<&Value> = match data {
        Value::Object(map) => map.values().collect(),
        Value::Array(items) => items.iter().collect(),
        _ => return Err(Error::mapping(model, "collection is not an object")),
    };

    entries
        .into_iter()
        .map(|entry| {
            let scopes = entry
                .as_object()
                .ok_or_else(|| Error::mapping(model, "collection entry is not an object"))?;
            merge_scopes(scopes, model)
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn merge_scopes(scopes: &Map<String, Value>, model: &str) -> Result<Record> {
    let mut fields = match scopes.get(model) {
        Some(Value::Object(primary)) => primary.clone(),
        Some(_) => return Err(Error::mapping(model, "primary scope is not an object")),
        None => {
            let found: Vec<&str> = scopes.keys().map(String::as_str).collect();
            return Err(Error::mapping(
                model,
                format!("no `{}` scope among [{}]", model, found.join(", ")),
            ));
        }
    };

    for (name, scope) in scopes {
        if name != model && !fields.contains_key(name) {
            fields.insert(name.clone(), scope.clone());
        }
    }

    Record::from_fields(model, fields)
}

/// Reads a JSON number as an integer, accepting floats with no fractional part.
pub(crate) fn whole_number(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn coerce_id(model: &str, id: &Value) -> Result<i64> {
    let parsed = match id {
        Value::Number(_) => whole_number(id),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| Error::mapping(model, format!("`id` is not an integer: {}", id)))
}

fn is_empty(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
