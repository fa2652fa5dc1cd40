//! Field maps for desired and current resource state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BastionError, BastionResult};

/// A mapping from backend field name to JSON value.
///
/// An unset field is absent from the map, which is distinct from a
/// field carrying `null`: construction paths elide unset fields rather
/// than inserting nulls, and nothing here is ever sent as `null` to
/// mean "unspecified".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSet {
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl FieldSet {
    /// Create a new empty field set.
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Set a field value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Set a field using builder pattern.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Get a string field.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Get a boolean field.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Check if a field is set.
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Remove a field.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Get all field names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over all fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Convert into a JSON object suitable for a request body.
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Build from a JSON object (e.g. a GET response body).
    ///
    /// Fails when the value is not a JSON object.
    pub fn try_from_value(value: Value) -> BastionResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(BastionError::serialization(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    /// Build a desired field set from any serializable value, eliding
    /// fields that serialized to `null` (unset).
    pub fn from_serialize<T: Serialize>(value: &T) -> BastionResult<Self> {
        let json = serde_json::to_value(value)
            .map_err(|e| BastionError::serialization(e.to_string()))?;
        let mut set = Self::try_from_value(json)?;
        set.fields.retain(|_, v| !v.is_null());
        Ok(set)
    }
}

impl From<Map<String, Value>> for FieldSet {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, Value)> for FieldSet {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
