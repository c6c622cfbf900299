//! Per-call codec options.
//!
//! The dispatcher forwards an [`Options`] map to the selected codec verbatim. Keys are
//! format-specific; each codec reads the keys it understands and ignores the rest.

use crate::error::{Result, TabError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered, string-keyed option bag handed to codecs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options {
    values: IndexMap<String, Value>,
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON object, e.g. `{"delimiter": ";", "headers": false}`
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| TabError::InvalidOptions(e.to_string()))
    }

    /// Set an option (builder style)
    #[must_use]
    pub fn with<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        self.set(key, value);
        self
    }

    pub fn set<V: Into<Value>>(&mut self, key: &str, value: V) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(invalid(key, "a boolean")),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(invalid(key, "a string")),
        }
    }

    /// A string option holding exactly one character
    pub fn get_char(&self, key: &str) -> Result<Option<char>> {
        let Some(s) = self.get_str(key)? else {
            return Ok(None);
        };
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Some(c)),
            _ => Err(invalid(key, "a single character")),
        }
    }

    pub fn get_usize(&self, key: &str) -> Result<Option<usize>> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| invalid(key, "a non-negative integer")),
            Some(_) => Err(invalid(key, "a non-negative integer")),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self.get_bool(key)?.unwrap_or(default))
    }
}

fn invalid(key: &str, expected: &'static str) -> TabError {
    TabError::InvalidOption {
        key: key.to_string(),
        expected,
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Options {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_builder_and_getters() {
        let options = Options::new()
            .with("delimiter", ";")
            .with("headers", false)
            .with("table_index", 2);

        assert_eq!(options.get_char("delimiter").unwrap(), Some(';'));
        assert_eq!(options.get_bool("headers").unwrap(), Some(false));
        assert_eq!(options.get_usize("table_index").unwrap(), Some(2));
        assert_eq!(options.get_str("missing").unwrap(), None);
        assert!(options.bool_or("missing", true).unwrap());
    }

    #[test]
    fn test_wrong_type_is_a_config_error() {
        let options = Options::new().with("delimiter", ";;").with("headers", "yes");

        let err = options.get_char("delimiter").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(options.get_bool("headers").is_err());
    }

    #[test]
    fn test_from_json_str_preserves_order() {
        let options = Options::from_json_str(r#"{"quote": "'", "delimiter": "|"}"#).unwrap();
        let keys: Vec<&str> = options.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["quote", "delimiter"]);
    }

    #[test]
    fn test_from_json_str_rejects_non_objects() {
        let err = Options::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, TabError::InvalidOptions(_)));
    }

    #[test]
    fn test_from_iter() {
        let options: Options = [("pretty", true)].into_iter().collect();
        assert_eq!(options.get_bool("pretty").unwrap(), Some(true));
    }
}
