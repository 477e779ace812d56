//! `serde_json` adapter: field access on JSON objects, and resolution
//! followed by construction.

use alloc::boxed::Box;
use alloc::string::String;
use core::any::Any;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::{DowncastError, DowncastRegistry, FieldSource, FieldValue, Resolution, Site, Tag};

// -----------------------------------------------------------------------------
// FieldSource

/// Converts a JSON value found in a discriminator field.
///
/// Integers become [`Tag::Int`] whether JSON stored them signed or not.
/// Floats, arrays and objects are never tags.
pub fn field_value(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Tag(Tag::Null),
        Value::Bool(b) => FieldValue::Tag(Tag::Bool(*b)),
        Value::Number(n) => match n.as_i64().map(i128::from).or_else(|| n.as_u64().map(i128::from)) {
            Some(i) => FieldValue::Tag(Tag::Int(i)),
            None => FieldValue::Other("float"),
        },
        Value::String(s) => FieldValue::Tag(Tag::from(s.clone())),
        Value::Array(_) => FieldValue::Other("array"),
        Value::Object(_) => FieldValue::Other("object"),
    }
}

impl FieldSource for Map<String, Value> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name).map(field_value)
    }
}

/// Only objects have fields.
impl FieldSource for Value {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match self {
            Value::Object(map) => map.field(name),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Downcast

/// A constructed polymorphic value.
#[derive(Debug)]
pub enum Downcast {
    /// The resolved subtype, built by its registered constructor.
    Subtype(Box<dyn Any>),
    /// Fallback outcome: the input kept as a generic record.
    Record(Value),
    /// Downcasting is not configured for the supertype; the input is
    /// returned untouched.
    NotConfigured(Value),
}

impl Downcast {
    /// Takes the subtype out if it is a `T`.
    pub fn into_subtype<T: Any>(self) -> Option<T> {
        match self {
            Self::Subtype(value) => value.downcast::<T>().ok().map(|value| *value),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JsonDowncastError {
    #[error(transparent)]
    Resolve(#[from] DowncastError),

    #[error("subtype `{0}` was registered without a deserializer")]
    NotDeserializable(&'static str),

    #[error("failed to deserialize subtype `{subtype}`: {source}")]
    Deserialize {
        subtype: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Resolves and constructs a value of supertype `S`.
///
/// `enclosing` is the field name and the enclosing object when the value is
/// a field, which enables proxy lookups; `None` for a root value.
///
/// # Example
///
/// ```
/// use dc_downcast::DowncastRegistry;
/// use dc_downcast::json::{self, Downcast};
/// use serde::Deserialize;
/// use serde_json::json;
///
/// trait Shape {}
///
/// #[derive(Deserialize, Debug, PartialEq)]
/// struct Circle {
///     radius: f64,
/// }
///
/// let mut registry = DowncastRegistry::new();
/// registry
///     .supertype::<dyn Shape>()
///     .discriminator("type")
///     .allow_fallback()
///     .deserializable_subtype::<Circle>("circle");
///
/// let circle = json::downcast::<dyn Shape>(&registry, None, json!({"type": "circle", "radius": 1.0}))
///     .unwrap()
///     .into_subtype::<Circle>();
/// assert_eq!(circle, Some(Circle { radius: 1.0 }));
///
/// let other = json::downcast::<dyn Shape>(&registry, None, json!({"type": "hexagon"})).unwrap();
/// assert!(matches!(other, Downcast::Record(_)));
/// ```
pub fn downcast<S: ?Sized + 'static>(
    registry: &DowncastRegistry,
    enclosing: Option<(&str, &Map<String, Value>)>,
    value: Value,
) -> Result<Downcast, JsonDowncastError> {
    let site = match enclosing {
        Some((name, outer)) => Site::field(name, outer, &value),
        None => Site::root(&value),
    };

    match registry.resolve::<S>(site)? {
        Resolution::NotConfigured => Ok(Downcast::NotConfigured(value)),
        Resolution::Fallback(_) => Ok(Downcast::Record(value)),
        Resolution::Subtype(info) => {
            if !info.can_deserialize() {
                return Err(JsonDowncastError::NotDeserializable(info.type_name()));
            }
            info.deserialize(value)
                .map(Downcast::Subtype)
                .map_err(|source| JsonDowncastError::Deserialize {
                    subtype: info.type_name(),
                    source,
                })
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
