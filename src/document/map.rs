//! Insertion-ordered document

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::Value;

/// An ordered mapping from field name to [`Value`].
///
/// Removing a field keeps the relative order of the remaining fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.get_mut(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_document(&self, key: &str) -> Option<&Document> {
        self.get(key).and_then(Value::as_document)
    }

    pub fn get_document_mut(&mut self, key: &str) -> Option<&mut Document> {
        self.get_mut(key).and_then(Value::as_document_mut)
    }

    /// Insert a field. An existing field keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    /// Move the value stored under `from` to `to`, appending `to` at the end.
    pub fn rename(&mut self, from: &str, to: impl Into<String>) -> bool {
        match self.fields.shift_remove(from) {
            Some(value) => {
                let to = to.into();
                self.fields.shift_remove(&to);
                self.fields.insert(to, value);
                true
            }
            None => false,
        }
    }

    /// A copy of this document without the given field
    pub fn without(&self, key: &str) -> Document {
        let mut copy = self.clone();
        copy.remove(key);
        copy
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Document {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Extend<(String, Value)> for Document {
    fn extend<I: IntoIterator<Item = (String, Value)>>(&mut self, iter: I) {
        self.fields.extend(iter);
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_insertion_order_is_kept() {
        let doc = doc! { "b": 1, "a": 2, "c": 3 };
        let keys: Vec<_> = doc.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_remove_keeps_remaining_order() {
        let mut doc = doc! { "a": 1, "b": 2, "c": 3 };
        doc.remove("a");
        let keys: Vec<_> = doc.keys().collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn test_rename_appends_new_key() {
        let mut doc = doc! { "userName": "jwage", "age": 30 };
        assert!(doc.rename("userName", "user_name"));
        let keys: Vec<_> = doc.keys().collect();
        assert_eq!(keys, vec!["age", "user_name"]);
        assert_eq!(doc.get_str("user_name"), Some("jwage"));
        assert!(!doc.rename("missing", "other"));
    }

    #[test]
    fn test_empty_macro() {
        assert!(doc! {}.is_empty());
    }
}
