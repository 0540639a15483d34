//! Session value map.
//!
//! Values are JSON values so the wire format stays stable across both token
//! formats. A handful of keys are reserved for the session itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ID_FIELD: &str = "id";
pub const EXPIRES_FIELD: &str = "expires";
pub const ROLE_FIELD: &str = "role";
pub const USER_FIELD: &str = "user_id";

/// Key-value map carried inside the session cookie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionValues(Map<String, Value>);

impl SessionValues {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Creates a fresh map holding only the reserved `id` and `expires` fields.
    pub fn fresh(id: impl Into<String>, expires: DateTime<Utc>) -> Self {
        let mut values = Self::new();
        values.insert(ID_FIELD, id.into());
        values.insert(EXPIRES_FIELD, expires.timestamp());
        values
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the value at `key` if it is a string.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Reads a numeric value, coercing between number kinds and numeric strings.
    ///
    /// Returns `None` when the value is missing, not numeric, or out of range
    /// for `T`. Floats are truncated toward zero when `T` is an integer.
    ///
    /// # Example
    ///
    /// ```rust
    /// use latchkey::SessionValues;
    ///
    /// let mut values = SessionValues::new();
    /// values.insert("visits", 3.9);
    /// values.insert("limit", "250");
    ///
    /// assert_eq!(values.number::<i64>("visits"), Some(3));
    /// assert_eq!(values.number::<f32>("limit"), Some(250.0));
    /// assert_eq!(values.number::<u8>("missing"), None);
    /// ```
    pub fn number<T: Numeric>(&self, key: &str) -> Option<T> {
        self.0.get(key).and_then(coerce)
    }

    /// Session identifier, empty when absent.
    pub fn id(&self) -> &str {
        self.string(ID_FIELD).unwrap_or_default()
    }

    /// Expiry instant, `None` when missing or not a unix timestamp.
    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.number::<i64>(EXPIRES_FIELD)
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    /// A session without a readable `expires` field counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires().is_none_or(|expires| expires <= now)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for SessionValues {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Numeric kinds a session value can be coerced into.
pub trait Numeric: Sized + Copy {
    fn from_i64(value: i64) -> Option<Self>;
    fn from_u64(value: u64) -> Option<Self>;
    fn from_f64(value: f64) -> Option<Self>;
}

macro_rules! impl_numeric_int {
    ($($t:ty),*) => {$(
        impl Numeric for $t {
            fn from_i64(value: i64) -> Option<Self> {
                <$t>::try_from(value).ok()
            }

            fn from_u64(value: u64) -> Option<Self> {
                <$t>::try_from(value).ok()
            }

            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            fn from_f64(value: f64) -> Option<Self> {
                let value = value.trunc();
                (value.is_finite() && value >= <$t>::MIN as f64 && value <= <$t>::MAX as f64)
                    .then_some(value as $t)
            }
        }
    )*};
}

macro_rules! impl_numeric_float {
    ($($t:ty),*) => {$(
        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        impl Numeric for $t {
            fn from_i64(value: i64) -> Option<Self> {
                Some(value as $t)
            }

            fn from_u64(value: u64) -> Option<Self> {
                Some(value as $t)
            }

            fn from_f64(value: f64) -> Option<Self> {
                Some(value as $t)
            }
        }
    )*};
}

impl_numeric_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);
impl_numeric_float!(f32, f64);

fn coerce<T: Numeric>(value: &Value) -> Option<T> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                T::from_i64(i)
            } else if let Some(u) = n.as_u64() {
                T::from_u64(u)
            } else {
                n.as_f64().and_then(T::from_f64)
            }
        }
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => T::from_i64(i),
                Err(_) => s.parse::<f64>().ok().and_then(T::from_f64),
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_fresh_has_reserved_fields() {
        let expires = Utc::now() + Duration::hours(1);
        let values = SessionValues::fresh("abc", expires);

        assert_eq!(values.id(), "abc");
        assert_eq!(values.expires().unwrap().timestamp(), expires.timestamp());
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_number_coercion_between_kinds() {
        let mut values = SessionValues::new();
        values.insert("int", 42);
        values.insert("float", 2.75);
        values.insert("negative", -7);
        values.insert("text", " 19 ");
        values.insert("text_float", "1.5");
        values.insert("flag", true);

        assert_eq!(values.number::<i32>("int"), Some(42));
        assert_eq!(values.number::<f64>("int"), Some(42.0));
        assert_eq!(values.number::<i64>("float"), Some(2));
        assert_eq!(values.number::<f32>("float"), Some(2.75));
        assert_eq!(values.number::<u32>("negative"), None);
        assert_eq!(values.number::<i8>("negative"), Some(-7));
        assert_eq!(values.number::<usize>("text"), Some(19));
        assert_eq!(values.number::<i64>("text_float"), Some(1));
        assert_eq!(values.number::<i64>("flag"), None);
    }

    #[test]
    fn test_number_out_of_range() {
        let mut values = SessionValues::new();
        values.insert("big", 300);
        values.insert("huge", 1e300);

        assert_eq!(values.number::<u8>("big"), None);
        assert_eq!(values.number::<u16>("big"), Some(300));
        assert_eq!(values.number::<i64>("huge"), None);
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let mut values = SessionValues::fresh("abc", now + Duration::seconds(5));
        assert!(!values.is_expired(now));
        assert!(values.is_expired(now + Duration::seconds(5)));

        values.remove(EXPIRES_FIELD);
        assert!(values.is_expired(now));

        values.insert(EXPIRES_FIELD, "not a timestamp");
        assert!(values.is_expired(now));
    }

    #[test]
    fn test_transparent_json() {
        let mut values = SessionValues::new();
        values.insert("nested", json!({"a": [1, 2], "b": null}));
        values.insert("name", "alice");

        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json, json!({"nested": {"a": [1, 2], "b": null}, "name": "alice"}));

        let back: SessionValues = serde_json::from_value(json).unwrap();
        assert_eq!(back, values);
    }
}
