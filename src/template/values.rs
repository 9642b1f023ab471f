//! Value maps: short keys to extracted string values.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

/// Sentinel written wherever a value is unavailable.
pub const NOT_AVAILABLE: &str = "N/A";

/// Check that a key can appear in a `{key}` placeholder.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Mapping from short keys (`a`, `b1`, `g`) to string values.
///
/// Unavailable values are stored explicitly as [`NOT_AVAILABLE`] rather
/// than being left out. Keys are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueMap {
    values: BTreeMap<String, String>,
}

impl ValueMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zip keys with values, stopping at the shorter of the two.
    pub fn from_pairs<K, V>(
        keys: impl IntoIterator<Item = K>,
        values: impl IntoIterator<Item = V>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        keys.into_iter().zip(values).collect()
    }

    /// Parse a JSON object of values.
    ///
    /// Strings are taken as-is, numbers use their JSON text, and `null`
    /// becomes [`NOT_AVAILABLE`]. Keys must satisfy [`is_valid_key`].
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut map = Self::new();
        for (key, value) in raw {
            if !is_valid_key(&key) {
                return Err(Error::InvalidKey(key));
            }
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => NOT_AVAILABLE.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                other => {
                    return Err(Error::Other(format!(
                        "value for {:?} must be a string, number or null, got {}",
                        key, other
                    )))
                }
            };
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Insert a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Insert the [`NOT_AVAILABLE`] sentinel.
    pub fn insert_unavailable(&mut self, key: impl Into<String>) -> Option<String> {
        self.insert(key, NOT_AVAILABLE)
    }

    /// Get a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Check whether a key is present (available or not).
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Check whether a key is present with a real value.
    pub fn is_available(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v != NOT_AVAILABLE)
    }

    /// Keys whose value is the [`NOT_AVAILABLE`] sentinel.
    pub fn unavailable_keys(&self) -> Vec<&str> {
        self.values
            .iter()
            .filter(|(_, v)| v.as_str() == NOT_AVAILABLE)
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Merge another map into this one; its values win on collision.
    pub fn merge(&mut self, other: ValueMap) {
        for (key, value) in other.values {
            if let Some(previous) = self.values.get(&key) {
                if *previous != value {
                    log::debug!("value {:?} overwritten: {:?} -> {:?}", key, previous, value);
                }
            }
            self.values.insert(key, value);
        }
    }

    /// Check every key with [`is_valid_key`].
    pub fn validate(&self) -> Result<()> {
        match self.values.keys().find(|k| !is_valid_key(k)) {
            Some(key) => Err(Error::InvalidKey(key.clone())),
            None => Ok(()),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for ValueMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for ValueMap {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        assert!(is_valid_key("a"));
        assert!(is_valid_key("g1"));
        assert!(is_valid_key("D3"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("a b"));
        assert!(!is_valid_key("a_1"));
        assert!(!is_valid_key("年"));
    }

    #[test]
    fn test_from_pairs_stops_at_shorter() {
        let map = ValueMap::from_pairs(["a", "b", "c"], ["4", "20000"]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("b"), Some("20000"));
        assert!(!map.contains_key("c"));
    }

    #[test]
    fn test_unavailable() {
        let mut map = ValueMap::new();
        map.insert("g", "120000");
        map.insert_unavailable("h");

        assert!(map.is_available("g"));
        assert!(!map.is_available("h"));
        assert!(map.contains_key("h"));
        assert_eq!(map.unavailable_keys(), vec!["h"]);
    }

    #[test]
    fn test_merge_overwrites() {
        let mut base = ValueMap::from_pairs(["a", "b"], ["1", "2"]);
        base.merge(ValueMap::from_pairs(["b", "c"], ["20", "30"]));

        assert_eq!(base.get("a"), Some("1"));
        assert_eq!(base.get("b"), Some("20"));
        assert_eq!(base.get("c"), Some("30"));
    }

    #[test]
    fn test_from_json() {
        let map = ValueMap::from_json(r#"{"a": "4", "b": 20000, "g": null}"#).unwrap();
        assert_eq!(map.get("a"), Some("4"));
        assert_eq!(map.get("b"), Some("20000"));
        assert_eq!(map.get("g"), Some(NOT_AVAILABLE));

        assert!(matches!(
            ValueMap::from_json(r#"{"a b": "1"}"#),
            Err(Error::InvalidKey(_))
        ));
        assert!(ValueMap::from_json(r#"{"a": [1]}"#).is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let map = ValueMap::from_pairs(["b", "a"], ["2", "1"]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"a":"1","b":"2"}"#);
    }
}
