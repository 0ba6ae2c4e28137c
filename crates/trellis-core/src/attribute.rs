//! Typed attribute storage for graph nodes and edges.
//!
//! Every node and edge carries an [`Attributes`] map from an interned
//! [`Id`] to a [`Value`]. Layouts that depend on external data (for example
//! a size column driving a tree-map) read it through the typed accessors,
//! which report a descriptive [`AttributeError`] instead of silently
//! defaulting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifier::Id;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Returns the numeric value for `Int` and `Float`, `None` otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            Value::Bool(_) | Value::Text(_) => None,
        }
    }

    /// Returns the contained string for `Text` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Returns the contained flag for `Bool` values.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Errors raised by the typed attribute accessors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributeError {
    #[error("attribute `{0}` is not set")]
    Missing(Id),

    #[error("attribute `{name}` holds a {found} value, expected {expected}")]
    TypeMismatch {
        name: Id,
        expected: &'static str,
        found: &'static str,
    },
}

/// Attribute map keyed by interned names.
///
/// # Examples
///
/// ```
/// use trellis_core::attribute::{Attributes, Value};
///
/// let attrs = Attributes::new()
///     .with("label", "root")
///     .with("size", 4.0);
///
/// assert_eq!(attrs.get_text("label"), Some("root"));
/// assert_eq!(attrs.require_number("size"), Ok(4.0));
/// assert!(attrs.require_number("label").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: HashMap<Id, Value>,
}

impl Attributes {
    /// Creates an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<Id>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets `name` to `value`, returning the previous value if any.
    pub fn set(&mut self, name: impl Into<Id>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    /// Removes `name`, returning its value if it was set.
    pub fn remove(&mut self, name: impl Into<Id>) -> Option<Value> {
        self.values.remove(&name.into())
    }

    pub fn get(&self, name: impl Into<Id>) -> Option<&Value> {
        self.values.get(&name.into())
    }

    pub fn contains(&self, name: impl Into<Id>) -> bool {
        self.values.contains_key(&name.into())
    }

    /// Returns the numeric value of `name`, coercing integers.
    pub fn get_number(&self, name: impl Into<Id>) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_text(&self, name: impl Into<Id>) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_bool(&self, name: impl Into<Id>) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Returns the numeric value of `name`, failing when it is absent or not numeric.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::Missing`] when the attribute is not set and
    /// [`AttributeError::TypeMismatch`] when it holds a non-numeric value.
    pub fn require_number(&self, name: impl Into<Id>) -> Result<f64, AttributeError> {
        let name = name.into();
        let value = self.values.get(&name).ok_or(AttributeError::Missing(name))?;
        value.as_f64().ok_or(AttributeError::TypeMismatch {
            name,
            expected: "number",
            found: value.kind(),
        })
    }

    /// Iterates over all `(name, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (Id, &Value)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
