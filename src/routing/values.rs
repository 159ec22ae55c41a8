//! Route values: parameter name to value, case-insensitive.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single route value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl RouteValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RouteValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Invariant rendering used by constraints.
impl fmt::Display for RouteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            RouteValue::Int(i) => write!(f, "{}", i),
            RouteValue::Float(v) => write!(f, "{}", v),
            RouteValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RouteValue {
    fn from(value: &str) -> Self {
        RouteValue::String(value.to_string())
    }
}

impl From<String> for RouteValue {
    fn from(value: String) -> Self {
        RouteValue::String(value)
    }
}

impl From<i64> for RouteValue {
    fn from(value: i64) -> Self {
        RouteValue::Int(value)
    }
}

impl From<i32> for RouteValue {
    fn from(value: i32) -> Self {
        RouteValue::Int(value.into())
    }
}

impl From<bool> for RouteValue {
    fn from(value: bool) -> Self {
        RouteValue::Bool(value)
    }
}

impl From<f64> for RouteValue {
    fn from(value: f64) -> Self {
        RouteValue::Float(value)
    }
}

fn keys_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || (!a.is_ascii() && a.to_lowercase() == b.to_lowercase())
}

/// Insertion-ordered map with case-insensitive keys.
///
/// Route parameter sets are small, so entries live in a flat vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteValueDictionary {
    entries: Vec<(String, RouteValue)>,
}

impl RouteValueDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| keys_equal(k, key))
    }

    /// Insert or replace. A replaced entry keeps its position and original key casing.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RouteValue>) -> Option<RouteValue> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Insert only if absent. Returns false when the key already exists.
    pub fn try_insert(&mut self, key: impl Into<String>, value: impl Into<RouteValue>) -> bool {
        let key = key.into();
        if self.position(&key).is_some() {
            return false;
        }
        self.entries.push((key, value.into()));
        true
    }

    pub fn get(&self, key: &str) -> Option<&RouteValue> {
        self.position(key).map(|index| &self.entries[index].1)
    }

    pub fn remove(&mut self, key: &str) -> Option<RouteValue> {
        self.position(key).map(|index| self.entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteValue)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for RouteValueDictionary
where
    K: Into<String>,
    V: Into<RouteValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = RouteValueDictionary::new();
        values.extend(iter);
        values
    }
}

impl<K, V> Extend<(K, V)> for RouteValueDictionary
where
    K: Into<String>,
    V: Into<RouteValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_case_insensitive() {
        let mut values = RouteValueDictionary::new();
        values.insert("Controller", "home");
        assert_eq!(values.get("controller"), Some(&RouteValue::from("home")));
        assert!(values.contains_key("CONTROLLER"));

        let old = values.insert("CONTROLLER", "admin");
        assert_eq!(old, Some(RouteValue::from("home")));
        assert_eq!(values.len(), 1);
        assert_eq!(values.iter().next().map(|(k, _)| k), Some("Controller"));
    }

    #[test]
    fn test_insertion_order() {
        let values: RouteValueDictionary =
            [("b", RouteValue::from(2)), ("a", RouteValue::from(1))].into_iter().collect();
        let keys: Vec<_> = values.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_try_insert_and_remove() {
        let mut values = RouteValueDictionary::new();
        assert!(values.try_insert("id", 5));
        assert!(!values.try_insert("ID", 6));
        assert_eq!(values.remove("Id"), Some(RouteValue::Int(5)));
        assert!(values.is_empty());
    }

    #[test]
    fn test_invariant_display() {
        assert_eq!(RouteValue::from(true).to_string(), "True");
        assert_eq!(RouteValue::from(-3).to_string(), "-3");
        assert_eq!(RouteValue::from(1.5).to_string(), "1.5");
    }
}
