//! Cache key generation.
//!
//! Keys are `operation` or `operation:{json}` where the JSON object has its
//! fields sorted, so two parameter sets with the same fields and values map
//! to the same key whatever order they were built in.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Number, Value};

use crate::error::{CacheError, Result};

// == Key Parameters ==
/// A parameter value that can take part in a cache key.
///
/// Distinct values always encode differently. JSON has no NaN or infinity,
/// so non-finite floats become `{"$float": "NaN" | "Infinity" | "-Infinity"}`
/// rather than `null`.
pub trait KeyParam {
    fn into_key_value(self) -> Value;
}

impl KeyParam for Value {
    fn into_key_value(self) -> Value {
        self
    }
}

impl KeyParam for f64 {
    fn into_key_value(self) -> Value {
        match Number::from_f64(self) {
            Some(number) => Value::Number(number),
            None if self.is_nan() => json!({ "$float": "NaN" }),
            None if self > 0.0 => json!({ "$float": "Infinity" }),
            None => json!({ "$float": "-Infinity" }),
        }
    }
}

impl KeyParam for f32 {
    fn into_key_value(self) -> Value {
        f64::from(self).into_key_value()
    }
}

impl KeyParam for &str {
    fn into_key_value(self) -> Value {
        Value::from(self)
    }
}

impl<T: KeyParam> KeyParam for Option<T> {
    fn into_key_value(self) -> Value {
        self.map_or(Value::Null, T::into_key_value)
    }
}

macro_rules! key_param_from_value {
    ($($ty:ty),*) => {
        $(
            impl KeyParam for $ty {
                fn into_key_value(self) -> Value {
                    Value::from(self)
                }
            }
        )*
    };
}

key_param_from_value!(bool, String, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Builds the cache key of `operation` called with `params`.
///
/// Parameters with the same name are collapsed, the last one winning.
///
/// # Examples
///
/// ```
/// use query_cache::cache::generate_key;
///
/// let a = generate_key("students", [("page", 1), ("limit", 20)]);
/// let b = generate_key("students", [("limit", 20), ("page", 1)]);
/// assert_eq!(a, b);
/// assert_eq!(a, r#"students:{"limit":20,"page":1}"#);
/// ```
pub fn generate_key<I, K, P>(operation: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, P)>,
    K: Into<String>,
    P: KeyParam,
{
    let sorted: BTreeMap<String, Value> = params
        .into_iter()
        .map(|(name, value)| (name.into(), canonicalize(value.into_key_value())))
        .collect();

    if sorted.is_empty() {
        return operation.to_string();
    }

    let mut object = Map::new();
    for (name, value) in sorted {
        object.insert(name, value);
    }
    format!("{}:{}", operation, Value::Object(object))
}

/// Builds the cache key of `operation` from any serializable parameter set.
///
/// Produces the same key as [`generate_key`] for a flat struct or map with
/// the same fields. Nested objects are sorted too.
///
/// Fields are encoded by `serde_json`, which writes non-finite floats as
/// `null`; pass such values through [`generate_key`] instead.
pub fn key_for<T: Serialize + ?Sized>(operation: &str, params: &T) -> Result<String> {
    let value = serde_json::to_value(params).map_err(|e| {
        CacheError::InvalidRequest(format!("Parameters of '{}' are not serializable: {}", operation, e))
    })?;

    match value {
        Value::Null => Ok(operation.to_string()),
        Value::Object(fields) => Ok(generate_key(operation, fields)),
        other => Err(CacheError::InvalidRequest(format!(
            "Parameters of '{}' must serialize to an object, got {}",
            operation, other
        ))),
    }
}

/// Rebuilds objects with their fields in sorted order, recursively.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(fields) => {
            let sorted: BTreeMap<String, Value> = fields
                .into_iter()
                .map(|(name, value)| (name, canonicalize(value)))
                .collect();
            let mut object = Map::new();
            for (name, value) in sorted {
                object.insert(name, value);
            }
            Value::Object(object)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
