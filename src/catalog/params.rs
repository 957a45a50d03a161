//! Flat request parameters
//!
//! Every endpoint takes a flat `name -> value` map of strings. Absent
//! optional values are omitted entirely: there is no way to send an empty
//! placeholder for `None`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::error::{MmfError, Result};

/// Date format the API expects for `date_*` parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Ordered, flat request parameters.
///
/// # Examples
///
/// ```
/// use mapmyfitness::catalog::Params;
///
/// let params = Params::new()
///     .set("route_id", 12)
///     .opt("limit", None::<u32>)
///     .opt("sort_by", Some("date"));
///
/// assert_eq!(params.get("route_id"), Some("12"));
/// assert_eq!(params.get("limit"), None);
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key` only when `value` is `Some`.
    pub fn opt<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    /// Sets `key` to a `YYYY-MM-DD` date when `date` is `Some`.
    pub fn date(self, key: impl Into<String>, date: Option<NaiveDate>) -> Self {
        self.opt(key, date.map(|d| d.format(DATE_FORMAT).to_string()))
    }

    /// Merges `additional` on top of `self`; its values win on conflicts.
    pub fn merge(mut self, additional: Params) -> Self {
        self.0.extend(additional.0);
        self
    }

    /// In-place form of [`set`](Self::set).
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Value of `key`, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether `key` is set.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Owned `(name, value)` pairs, as sent on the wire.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Flattens any serializable struct into parameters.
    ///
    /// - `None`/`null` fields are omitted;
    /// - booleans become `1`/`0`;
    /// - arrays of scalars become comma-separated lists;
    /// - nested objects are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`MmfError::InvalidParameters`] when `value` is not a struct
    /// or map, or contains a nested object.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapmyfitness::catalog::Params;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Query {
    ///     user_id: Option<String>,
    ///     limit: Option<u32>,
    ///     public: bool,
    ///     ids: Vec<u32>,
    /// }
    ///
    /// let params = Params::from_query(&Query {
    ///     user_id: None,
    ///     limit: Some(20),
    ///     public: true,
    ///     ids: vec![1, 2, 3],
    /// })
    /// .unwrap();
    ///
    /// assert!(!params.contains("user_id"));
    /// assert_eq!(params.get("limit"), Some("20"));
    /// assert_eq!(params.get("public"), Some("1"));
    /// assert_eq!(params.get("ids"), Some("1,2,3"));
    /// ```
    pub fn from_query<T: Serialize>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| MmfError::InvalidParameters(format!("cannot serialize parameters: {e}")))?;

        let object = match value {
            Value::Object(object) => object,
            Value::Null => return Ok(Self::new()),
            other => {
                return Err(MmfError::InvalidParameters(format!(
                    "parameters must be a struct or map, got {other}"
                )))
            }
        };

        let mut params = Self::new();
        for (key, value) in object {
            if let Some(flat) = flatten_value(&key, &value)? {
                params.0.insert(key, flat);
            }
        }
        Ok(params)
    }
}

fn flatten_scalar(key: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(MmfError::InvalidParameters(format!(
            "parameter '{key}' must be a scalar or a list of scalars"
        ))),
    }
}

fn flatten_value(key: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Array(items) => {
            let parts = items
                .iter()
                .map(|item| flatten_scalar(key, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(parts.into_iter().flatten().collect::<Vec<_>>().join(",")))
        }
        other => flatten_scalar(key, other),
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl<K: Into<String>, V: ToString> Extend<(K, V)> for Params {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}
