//! Configuration documents persisted per assessment
//!
//! A document is a flat, string-keyed map of scalars. It is stored as a JSON
//! object; unknown keys survive a round trip and are ignored by the
//! implementations reading them.

use crate::error::QuizError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A scalar configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Number(f64),
    Text(String),
}

impl ConfigValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => Some(*n),
            ConfigValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Number(_) => None,
            ConfigValue::Text(s) => Some(s),
        }
    }
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::Number(n) => write!(f, "{}", n),
            ConfigValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Number(value)
    }
}

impl From<u32> for ConfigValue {
    fn from(value: u32) -> Self {
        ConfigValue::Number(value as f64)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Text(value)
    }
}

/// Implementation-specific configuration payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    values: BTreeMap<String, ConfigValue>,
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<ConfigValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<ConfigValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Numeric value for the key, if present and numeric
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ConfigValue::as_f64)
    }

    /// Value for the key as a non-negative integer.
    ///
    /// Fractional, negative or non-finite numbers yield `None`.
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        let value = self.get_f64(key)?;
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
            Some(value as u32)
        } else {
            None
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ConfigValue::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Serialize to the persisted JSON form
    pub fn to_json(&self) -> crate::error::Result<String> {
        serde_json::to_string(self).map_err(|e| {
            QuizError::InvalidConfiguration {
                message: format!("Failed to serialize configuration: {}", e),
            }
            .into()
        })
    }

    /// Parse the persisted JSON form.
    ///
    /// An empty payload is the "absent" marker. Anything that is not a JSON
    /// object fails open to `None` with a warning. Entries that are neither
    /// numbers nor strings are dropped.
    pub fn from_json(payload: &str) -> Option<Self> {
        if payload.trim().is_empty() {
            return None;
        }

        match Self::parse(payload) {
            Ok(document) => Some(document),
            Err(e) => {
                warn!("Ignoring persisted configuration: {}", e);
                None
            }
        }
    }

    /// Strict variant of [`ConfigDocument::from_json`] reporting why parsing failed
    pub fn parse(payload: &str) -> std::result::Result<Self, QuizError> {
        let raw: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(payload).map_err(|e| {
                QuizError::ConfigurationDeserializationFailure {
                    reason: e.to_string(),
                }
            })?;

        let mut document = Self::new();
        for (key, value) in raw {
            match value {
                serde_json::Value::Number(n) => match n.as_f64() {
                    Some(number) => document.set(&key, number),
                    None => debug!("Dropping configuration key {}: {} is not an f64", key, n),
                },
                serde_json::Value::String(text) => document.set(&key, text),
                other => debug!("Dropping configuration key {} with non-scalar value {}", key, other),
            }
        }

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round_trip() {
        let doc = ConfigDocument::new()
            .with("student_k_factor", 32.0)
            .with("question_k_factor", 8.0)
            .with("label", "default");

        let json = doc.to_json().unwrap();
        assert_eq!(ConfigDocument::from_json(&json), Some(doc));
    }

    #[test]
    fn test_malformed_payload_is_absent() {
        assert_eq!(ConfigDocument::from_json(""), None);
        assert_eq!(ConfigDocument::from_json("   "), None);
        assert_eq!(ConfigDocument::from_json("{not json"), None);
        assert_eq!(ConfigDocument::from_json("[1, 2, 3]"), None);
        assert_eq!(ConfigDocument::from_json("null"), None);
    }

    #[test]
    fn test_non_scalar_entries_are_dropped() {
        let doc = ConfigDocument::from_json(
            r#"{"student_k_factor": 16, "future_flag": true, "cleared": null, "nested": {"a": 1}, "list": [1]}"#,
        )
        .unwrap();
        assert_eq!(doc.get_f64("student_k_factor"), Some(16.0));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_float_round_trip_is_exact() {
        let doc = ConfigDocument::new()
            .with("k", 502960914638.15845)
            .with("tiny", 5.029609146381584e-1);

        let json = doc.to_json().unwrap();
        assert_eq!(ConfigDocument::from_json(&json), Some(doc));
    }

    #[test]
    fn test_parse_reports_failure_kind() {
        let err = ConfigDocument::parse("{oops").unwrap_err();
        assert!(matches!(
            err,
            QuizError::ConfigurationDeserializationFailure { .. }
        ));
    }

    #[test]
    fn test_unknown_keys_survive() {
        let doc = ConfigDocument::from_json(r#"{"student_k_factor": 16, "future_knob": "x"}"#)
            .unwrap();
        assert_eq!(doc.get_f64("student_k_factor"), Some(16.0));
        assert_eq!(doc.get_str("future_knob"), Some("x"));
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_get_u32() {
        let doc = ConfigDocument::new()
            .with("whole", 10.0)
            .with("fraction", 2.5)
            .with("negative", -3.0)
            .with("text", "7");

        assert_eq!(doc.get_u32("whole"), Some(10));
        assert_eq!(doc.get_u32("fraction"), None);
        assert_eq!(doc.get_u32("negative"), None);
        assert_eq!(doc.get_u32("text"), None);
        assert_eq!(doc.get_u32("missing"), None);
    }

    fn scalar() -> impl Strategy<Value = ConfigValue> {
        prop_oneof![
            (-1.0e12f64..1.0e12).prop_map(ConfigValue::Number),
            (-1.0e12f64..1.0e12).prop_map(|x| ConfigValue::Number(x * 1.0e-12)),
            "[a-z ]{0,12}".prop_map(ConfigValue::Text),
        ]
    }

    proptest! {
        #[test]
        fn prop_document_round_trips(entries in proptest::collection::btree_map("[a-z_]{1,16}", scalar(), 0..8)) {
            let mut doc = ConfigDocument::new();
            for (key, value) in entries {
                doc.set(&key, value);
            }
            let json = doc.to_json().unwrap();
            prop_assert_eq!(ConfigDocument::from_json(&json), Some(doc));
        }
    }
}
